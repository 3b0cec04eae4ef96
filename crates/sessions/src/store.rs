//! Project state backed by `project.json` under the configured state path.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use rw_domain::error::{Error, Result};
use rw_domain::report::{Document, DocumentKind, Section, SectionId};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Persisted shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A document reference without its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedDocument {
    pub name: String,
    pub kind: DocumentKind,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSection {
    pub id: SectionId,
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub manual_text: Option<String>,
    #[serde(default)]
    pub overview: bool,
    #[serde(default)]
    pub documents: Vec<PersistedDocument>,
}

impl From<&Section> for PersistedSection {
    fn from(s: &Section) -> Self {
        Self {
            id: s.id().clone(),
            name: s.name.clone(),
            instructions: s.instructions.clone(),
            manual_text: s.manual_text.clone(),
            overview: s.overview,
            documents: s
                .documents
                .iter()
                .map(|d| PersistedDocument {
                    name: d.name.clone(),
                    kind: d.kind,
                    size: d.size,
                })
                .collect(),
        }
    }
}

impl PersistedSection {
    /// Rebuild the section. Documents come back empty and must be
    /// re-ingested before generation.
    pub fn to_section(&self) -> Section {
        let mut section = Section::with_id(self.id.clone(), &self.name, &self.instructions);
        section.manual_text = self.manual_text.clone();
        section.overview = self.overview;
        section.documents = self
            .documents
            .iter()
            .map(|d| Document::new(&d.name, d.kind, d.size, ""))
            .collect();
        section
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sections: Vec<PersistedSection>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Project store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ProjectStore {
    path: PathBuf,
    state: RwLock<ProjectState>,
}

impl ProjectStore {
    /// Load or create the store at `state_path/project.json`.
    ///
    /// An unreadable or corrupt file starts an empty project.
    pub fn new(state_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_path).map_err(Error::Io)?;
        let path = state_path.join("project.json");

        let state = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
            serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "corrupt project state, starting fresh");
                ProjectState::default()
            })
        } else {
            ProjectState::default()
        };

        tracing::debug!(
            sections = state.sections.len(),
            path = %path.display(),
            "project store loaded"
        );

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn snapshot(&self) -> ProjectState {
        self.state.read().clone()
    }

    pub fn title(&self) -> String {
        self.state.read().title.clone()
    }

    pub fn set_title(&self, title: &str) {
        let mut state = self.state.write();
        state.title = title.to_owned();
        state.updated_at = Some(Utc::now());
    }

    /// Replace the stored section list.
    pub fn save_sections(&self, sections: &[Section]) {
        let mut state = self.state.write();
        state.sections = sections.iter().map(PersistedSection::from).collect();
        state.updated_at = Some(Utc::now());
    }

    pub fn sections(&self) -> Vec<Section> {
        self.state
            .read()
            .sections
            .iter()
            .map(PersistedSection::to_section)
            .collect()
    }

    pub fn clear(&self) {
        *self.state.write() = ProjectState::default();
    }

    /// Persist the current state to disk.
    pub fn flush(&self) -> Result<()> {
        let state = self.state.read();
        let json = serde_json::to_string_pretty(&*state)?;
        std::fs::write(&self.path, json).map_err(Error::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_round_trip_without_content() {
        let dir = tempfile::tempdir().unwrap();
        let section = Section::new("Market", "Describe the market")
            .with_document(Document::text("data.txt", "secret body"))
            .with_manual_text("notes")
            .overview();
        let id = section.id().clone();

        {
            let store = ProjectStore::new(dir.path()).unwrap();
            store.set_title("Q3 Review");
            store.save_sections(&[section]);
            store.flush().unwrap();
        }

        let raw = std::fs::read_to_string(dir.path().join("project.json")).unwrap();
        assert!(!raw.contains("secret body"));

        let store = ProjectStore::new(dir.path()).unwrap();
        assert_eq!(store.title(), "Q3 Review");
        let sections = store.sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].id(), &id);
        assert!(sections[0].overview);
        assert_eq!(sections[0].manual_text.as_deref(), Some("notes"));
        assert_eq!(sections[0].documents[0].name, "data.txt");
        assert_eq!(sections[0].documents[0].size, 11);
        assert!(sections[0].documents[0].content.is_empty());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("project.json"), "{not json").unwrap();
        let store = ProjectStore::new(dir.path()).unwrap();
        assert_eq!(store.snapshot(), ProjectState::default());
    }

    #[test]
    fn clear_resets_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path()).unwrap();
        store.set_title("x");
        store.clear();
        assert_eq!(store.title(), "");
    }
}
