//! Summary built locally from the change list, no model involved

use crate::{SummarizeError, Summarizer};
use async_trait::async_trait;
use journal::Change;

#[derive(Debug, Clone)]
pub struct OfflineSummarizer {
    max_files: usize,
}

impl OfflineSummarizer {
    pub fn new(max_files: usize) -> Self {
        Self {
            max_files: max_files.max(1),
        }
    }
}

#[async_trait]
impl Summarizer for OfflineSummarizer {
    async fn summarize(
        &self,
        changes: &[Change],
        intent: Option<&str>,
    ) -> Result<String, SummarizeError> {
        let noun = if changes.len() == 1 { "file" } else { "files" };
        let mut text = format!("Updated {} {}", changes.len(), noun);
        if let Some(intent) = intent {
            text.push_str(&format!(" towards: {}", intent));
        }
        text.push('\n');

        for change in changes.iter().take(self.max_files) {
            text.push_str(&format!("- {}\n", change.summary));
        }
        if changes.len() > self.max_files {
            text.push_str(&format!("- ... and {} more\n", changes.len() - self.max_files));
        }
        Ok(text.trim_end().to_string())
    }

    fn provider(&self) -> &str {
        "offline"
    }

    fn model(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stake_core::Fingerprint;

    #[tokio::test]
    async fn test_lists_change_summaries() {
        let changes = vec![
            Change::observed_now("a.py", Fingerprint::Binary),
            Change::observed_now("lib/b.py", Fingerprint::Binary),
            Change::observed_now("c.py", Fingerprint::Binary),
        ];
        let text = OfflineSummarizer::new(2)
            .summarize(&changes, Some("parser"))
            .await
            .unwrap();

        assert_eq!(
            text,
            "Updated 3 files towards: parser\n- Changed a.py\n- Changed b.py\n- ... and 1 more"
        );
    }
}
