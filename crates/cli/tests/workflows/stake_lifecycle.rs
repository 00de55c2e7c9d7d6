//! init → edit → scan → stake → history

use crate::common::TestProject;
use crate::stake;
use anyhow::Result;

#[test]
fn test_scan_then_stake_commits_pending_changes() -> Result<()> {
    let Some(project) = TestProject::new()? else {
        return Ok(());
    };
    let dir = project.root();

    stake!(dir, "init", "--intent", "build the parser").assert_success()?;
    project.write("src/parser.py", "def parse(): pass\n")?;
    project.write("README.md", "# demo\n\nnow with a parser\n")?;

    let scan = stake!(dir, "scan").assert_success()?;
    assert!(scan.contains_stdout("Recorded 2 new changes"), "{}", scan.stdout);

    // Nothing new the second time
    let again = stake!(dir, "scan").assert_success()?;
    assert!(again.contains_stdout("No new changes"));

    let status = stake!(dir, "status").assert_success()?;
    assert!(status.contains_stdout("Pending changes: 2"));
    assert!(status.contains_stdout("Changed parser.py"));

    let created = stake!(dir, "stake", "n1", "first parser").assert_success()?;
    assert!(created.contains_stdout("Stake n1 created (2 files)"), "{}", created.stdout);
    assert!(created.contains_stdout("Updated 2 files towards: build the parser"));

    assert_eq!(project.log_subjects()?[0], "Stake: n1");
    let body = project.git(&["log", "-1", "--format=%b"])?;
    assert!(body.starts_with("first parser\n\nUpdated 2 files"), "{}", body);
    assert!(project.git(&["status", "--porcelain"])?.trim().is_empty());

    let status = stake!(dir, "status").assert_success()?;
    assert!(status.contains_stdout("Pending changes: 0"));
    assert!(status.contains_stdout("Stakes total:  1"));

    let history = stake!(dir, "history").assert_success()?;
    assert!(history.contains_stdout("(1 total)"));
    assert!(history.contains_stdout("build the parser"));
    assert!(history.contains_stdout("via offline"));
    Ok(())
}

#[test]
fn test_stake_reconciles_when_nothing_pending() -> Result<()> {
    let Some(project) = TestProject::new()? else {
        return Ok(());
    };
    let dir = project.root();

    stake!(dir, "init").assert_success()?;
    project.write("notes.txt", "todo\n")?;

    let created = stake!(dir, "stake", "quick", "no watcher running").assert_success()?;
    assert!(created.contains_stdout("(1 files)"), "{}", created.stdout);
    assert_eq!(project.log_subjects()?[0], "Stake: quick");
    Ok(())
}

#[test]
fn test_nothing_to_stake_leaves_history_alone() -> Result<()> {
    let Some(project) = TestProject::new()? else {
        return Ok(());
    };
    let dir = project.root();

    stake!(dir, "init").assert_success()?;
    let result = stake!(dir, "stake", "empty", "nothing here").assert_success()?;
    assert!(result.contains_stdout("Nothing to stake"));
    assert_eq!(project.log_subjects()?, vec!["initial".to_string()]);
    Ok(())
}

#[test]
fn test_bookkeeping_never_committed() -> Result<()> {
    let Some(project) = TestProject::new()? else {
        return Ok(());
    };
    let dir = project.root();

    stake!(dir, "init").assert_success()?;
    project.write("a.py", "x = 1\n")?;
    stake!(dir, "stake", "n1", "m").assert_success()?;

    let files = project.git(&["show", "--name-only", "--format=", "HEAD"])?;
    assert_eq!(files.trim(), "a.py");
    Ok(())
}

#[test]
fn test_reset_drops_pending_changes() -> Result<()> {
    let Some(project) = TestProject::new()? else {
        return Ok(());
    };
    let dir = project.root();

    stake!(dir, "init").assert_success()?;
    project.write("a.py", "x = 1\n")?;
    stake!(dir, "scan").assert_success()?;

    let declined = stake!(dir, "reset").stdin("n\n").assert_success()?;
    assert!(declined.contains_stdout("Aborted"));

    let reset = stake!(dir, "reset", "-y").assert_success()?;
    assert!(reset.contains_stdout("Dropped 1 pending changes"));

    // The file itself is untouched and still uncommitted
    assert!(project.git(&["status", "--porcelain"])?.contains("a.py"));
    Ok(())
}
