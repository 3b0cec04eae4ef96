//! Append-only JSONL chat history for the section-suggestion assistant.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use rw_domain::error::{Error, Result};
use rw_domain::message::Role;

/// A single chat line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLine {
    pub timestamp: String,
    pub role: Role,
    pub content: String,
}

impl ChatLine {
    /// A line stamped with the current time.
    pub fn now(role: Role, content: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            role,
            content: content.to_owned(),
        }
    }
}

/// `chat.jsonl` under the state path, with a write-through cache.
pub struct ChatHistory {
    path: PathBuf,
    cache: RwLock<Option<Vec<ChatLine>>>,
}

impl ChatHistory {
    pub fn new(state_path: &Path) -> Self {
        Self {
            path: state_path.join("chat.jsonl"),
            cache: RwLock::new(None),
        }
    }

    /// All lines so far. Unparseable lines are skipped.
    pub fn lines(&self) -> Result<Vec<ChatLine>> {
        if let Some(lines) = self.cache.read().as_ref() {
            return Ok(lines.clone());
        }
        let lines = self.read_from_disk()?;
        *self.cache.write() = Some(lines.clone());
        Ok(lines)
    }

    /// Append lines, disk first, then the cache.
    pub fn append(&self, lines: &[ChatLine]) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(Error::Io)?;
        }

        let mut buf = String::new();
        for line in lines {
            buf.push_str(&serde_json::to_string(line)?);
            buf.push('\n');
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(Error::Io)?;
        file.write_all(buf.as_bytes()).map_err(Error::Io)?;

        if let Some(cached) = self.cache.write().as_mut() {
            cached.extend(lines.iter().cloned());
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io(e)),
        }
        *self.cache.write() = Some(Vec::new());
        Ok(())
    }

    fn read_from_disk(&self) -> Result<Vec<ChatLine>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };
        Ok(raw
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| match serde_json::from_str(l) {
                Ok(line) => Some(line),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed chat line");
                    None
                }
            })
            .collect())
    }
}
