//! init, intent and config commands

use crate::common::TestProject;
use crate::stake;
use anyhow::Result;

#[test]
fn test_init_requires_git() -> Result<()> {
    if TestProject::new()?.is_none() {
        return Ok(());
    }
    let dir = TestProject::bare_dir()?;

    let result = stake!(dir.path(), "init").assert_failure()?;
    assert!(result.contains_stderr("git init"), "{}", result.stderr);
    assert!(!dir.path().join(".stake").exists());
    Ok(())
}

#[test]
fn test_commands_outside_project_fail() -> Result<()> {
    let Some(project) = TestProject::new()? else {
        return Ok(());
    };
    let result = stake!(project.root(), "status").assert_failure()?;
    assert!(result.contains_stderr("Not a stake project"));
    Ok(())
}

#[test]
fn test_reinit_keeps_state_and_updates_intent() -> Result<()> {
    let Some(project) = TestProject::new()? else {
        return Ok(());
    };
    let dir = project.root();

    let first = stake!(dir, "init", "--intent", "v1").assert_success()?;
    assert!(first.contains_stdout("Initialized stake"));
    assert!(dir.join(".stake/state.json").exists());

    project.write("a.py", "x = 1\n")?;
    stake!(dir, "scan").assert_success()?;

    let second = stake!(dir, "init", "--intent", "v2").assert_success()?;
    assert!(second.contains_stdout("Already tracking"));

    let intent = stake!(dir, "intent").assert_success()?;
    assert_eq!(intent.stdout.trim(), "v2");
    let status = stake!(dir, "status").assert_success()?;
    assert!(status.contains_stdout("Pending changes: 1"));
    Ok(())
}

#[test]
fn test_intent_set_and_clear() -> Result<()> {
    let Some(project) = TestProject::new()? else {
        return Ok(());
    };
    let dir = project.root();

    stake!(dir, "init").assert_success()?;
    stake!(dir, "intent", "ship the cache").assert_success()?;
    assert_eq!(stake!(dir, "intent").assert_success()?.stdout.trim(), "ship the cache");

    stake!(dir, "intent", "--clear").assert_success()?;
    assert!(stake!(dir, "intent").assert_success()?.contains_stdout("No intent set"));
    Ok(())
}

#[test]
fn test_config_set_get_and_validation() -> Result<()> {
    let Some(project) = TestProject::new()? else {
        return Ok(());
    };
    let dir = project.root();

    stake!(dir, "init").assert_success()?;
    assert_eq!(
        stake!(dir, "config", "get", "cache.vcs_status_ttl_secs").assert_success()?.stdout.trim(),
        "10"
    );

    stake!(dir, "config", "set", "cache.vcs_status_ttl_secs", "5").assert_success()?;
    assert_eq!(
        stake!(dir, "config", "get", "cache.vcs_status_ttl_secs").assert_success()?.stdout.trim(),
        "5"
    );
    stake!(dir, "config", "set", "summarizer.provider", "ollama").assert_success()?;
    assert_eq!(
        stake!(dir, "config", "get", "summarizer.provider").assert_success()?.stdout.trim(),
        "ollama"
    );

    stake!(dir, "config", "set", "stake.summary_timeout_secs", "0").assert_failure()?;
    stake!(dir, "config", "set", "cache.no_such_key", "1").assert_failure()?;
    stake!(dir, "config", "get", "nope").assert_failure()?;

    let listed = stake!(dir, "config", "list").assert_success()?;
    assert!(listed.contains_stdout("[cache]"));
    assert!(listed.contains_stdout("vcs_status_ttl_secs = 5"));

    let example = stake!(dir, "config", "example").assert_success()?;
    assert!(example.contains_stdout("[summarizer]"));
    Ok(())
}
