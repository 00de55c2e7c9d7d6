//! Commit-message prompt

use journal::Change;

pub const SYSTEM_PROMPT: &str =
    "You are a code analysis assistant that creates meaningful git commit messages.";

/// User prompt asking for a Title / Description / Impact message
///
/// At most `max_files` changes are listed; the rest are counted.
pub fn build_prompt(changes: &[Change], intent: Option<&str>, max_files: usize) -> String {
    let intent = intent.unwrap_or("not stated");
    let mut prompt = format!(
        "Given these changes and the development intent: \"{}\",\n\
         provide a detailed commit message following this format:\n\
         \n\
         Title: Short summary (max 50 chars)\n\
         Description: Detailed explanation\n\
         Impact: What changed and why\n\
         \n\
         Changes:\n",
        intent
    );

    let shown = max_files.max(1).min(changes.len());
    for change in &changes[..shown] {
        prompt.push_str(&format!(
            "- {} ({}, content {})\n",
            change.path, change.summary, change.fingerprint
        ));
    }
    if changes.len() > shown {
        prompt.push_str(&format!("... and {} more files\n", changes.len() - shown));
    }
    prompt
}
