//! File-backed transcript store.
//!
//! Appends audit events as JSON lines, one file per day, under a base
//! directory. Keeps the transcript survivable across restarts without a
//! database dependency.

use async_trait::async_trait;
use genna::collab::{TranscriptEvent, TranscriptStore};
use genna::error::CollabResult;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Transcript store writing JSON lines under a directory.
#[derive(Debug)]
pub struct FileTranscriptStore {
    base_path: PathBuf,
}

impl FileTranscriptStore {
    /// Create a store rooted at the given directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn file_path(&self, event: &TranscriptEvent) -> PathBuf {
        // One file per day keeps files bounded and greppable.
        let day = event.timestamp / 86_400_000;
        self.base_path.join(format!("transcript-{day}.jsonl"))
    }

    /// Read back every event in the store, oldest file first.
    ///
    /// # Errors
    ///
    /// Returns an error when a file cannot be read or a line fails to
    /// parse.
    pub async fn read_all(&self) -> CollabResult<Vec<TranscriptEvent>> {
        let mut events = Vec::new();
        if !self.base_path.exists() {
            return Ok(events);
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let content = tokio::fs::read_to_string(&path).await?;
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                let event: TranscriptEvent = serde_json::from_str(line)
                    .map_err(|e| genna::error::CollabError::decode(e.to_string()))?;
                events.push(event);
            }
        }
        Ok(events)
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    async fn insert(&self, event: TranscriptEvent) -> CollabResult<()> {
        tokio::fs::create_dir_all(&self.base_path).await?;
        let path = self.file_path(&event);

        let mut line = serde_json::to_string(&event)
            .map_err(|e| genna::error::CollabError::decode(e.to_string()))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;

        debug!(event = %event.name, path = %path.display(), "transcript event written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTranscriptStore::new(dir.path());

        store
            .insert(TranscriptEvent::new(
                "QnAMessage",
                json!({"Question": "hours?", "Score": 92.5}),
            ))
            .await
            .unwrap();
        store
            .insert(TranscriptEvent::new("BotMessageSent", json!({"Text": "9 to 5"})))
            .await
            .unwrap();

        let events = store.read_all().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "QnAMessage");
        assert_eq!(events[0].properties["Question"], "hours?");
    }

    #[tokio::test]
    async fn test_empty_store_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTranscriptStore::new(dir.path().join("missing"));
        assert!(store.read_all().await.unwrap().is_empty());
    }
}
