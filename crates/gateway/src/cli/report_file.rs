//! Report definition files.
//!
//! ```toml
//! title = "Quarterly Review"
//!
//! [[global_documents]]
//! path = "brief.md"
//!
//! [[sections]]
//! name = "Revenue"
//! instructions = "Break down revenue by region."
//! files = ["q3.csv"]
//! manual_text = "Call out the EMEA dip."
//!
//! [[sections]]
//! name = "Executive Summary"
//! overview = true
//! ```
//!
//! File paths are relative to the definition file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use rw_documents::{DocumentLoader, IngestFailure};
use rw_domain::report::{Document, Section, SectionId};

use crate::runtime::RunPlan;

#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionDef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub manual_text: Option<String>,
    #[serde(default)]
    pub overview: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportFile {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub global_documents: Vec<FileRef>,
    #[serde(default)]
    pub sections: Vec<SectionDef>,
}

/// A parsed definition plus the directory its paths are relative to.
#[derive(Debug, Clone)]
pub struct ReportDefinition {
    pub file: ReportFile,
    base_dir: PathBuf,
    ids: Vec<SectionId>,
}

impl ReportDefinition {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&raw, base_dir).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(raw: &str, base_dir: PathBuf) -> anyhow::Result<Self> {
        let file: ReportFile = toml::from_str(raw)?;
        {
            let mut seen = HashSet::new();
            if let Some(dup) = file
                .sections
                .iter()
                .find(|s| s.id.as_ref().is_some_and(|id| !seen.insert(id.as_str())))
            {
                anyhow::bail!("section \"{}\" reuses an id already given to another section", dup.name);
            }
        }
        // Ids are fixed once here so every later step refers to the same
        // section.
        let ids = file
            .sections
            .iter()
            .map(|s| s.id.clone().map(SectionId::from).unwrap_or_default())
            .collect();
        Ok(Self {
            file,
            base_dir,
            ids,
        })
    }

    pub fn title(&self) -> &str {
        &self.file.title
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn empty_sections(&self) -> Vec<Section> {
        self.file
            .sections
            .iter()
            .zip(&self.ids)
            .map(|(def, id)| {
                let mut section = Section::with_id(id.clone(), def.name.clone(), def.instructions.clone());
                section.manual_text = def.manual_text.clone();
                section.overview = def.overview;
                section
            })
            .collect()
    }

    /// Sections and global documents described by file metadata only, for
    /// estimates. Unreadable or unsupported files are reported and left out.
    pub fn stat_documents(&self, loader: &DocumentLoader) -> (Vec<Section>, Vec<Document>, Vec<IngestFailure>) {
        let mut failures = Vec::new();
        let mut stat = |path: &Path| -> Option<Document> {
            let full = self.resolve(path);
            let name = full
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| full.display().to_string());
            let result = std::fs::metadata(&full)
                .map_err(rw_domain::error::Error::from)
                .and_then(|meta| {
                    loader
                        .validate(&name, meta.len())
                        .map(|kind| Document::new(name.clone(), kind, meta.len(), ""))
                });
            match result {
                Ok(doc) => Some(doc),
                Err(e) => {
                    failures.push(IngestFailure {
                        name: full.display().to_string(),
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                    None
                }
            }
        };

        let globals: Vec<Document> = self
            .file
            .global_documents
            .iter()
            .filter_map(|f| stat(f.path.as_path()))
            .collect();
        let mut sections = self.empty_sections();
        for (section, def) in sections.iter_mut().zip(&self.file.sections) {
            section.documents = def.files.iter().filter_map(|p| stat(p.as_path())).collect();
        }
        (sections, globals, failures)
    }

    /// Read and extract every referenced file into a [`RunPlan`].
    pub async fn ingest(&self, loader: &DocumentLoader) -> (RunPlan, Vec<IngestFailure>) {
        let global_paths: Vec<PathBuf> = self
            .file
            .global_documents
            .iter()
            .map(|f| self.resolve(&f.path))
            .collect();
        let globals = loader.ingest_all(&global_paths).await;
        let mut failures = globals.failures;

        let mut sections = self.empty_sections();
        for (section, def) in sections.iter_mut().zip(&self.file.sections) {
            let paths: Vec<PathBuf> = def.files.iter().map(|p| self.resolve(p)).collect();
            let outcome = loader.ingest_all(&paths).await;
            section.documents = outcome.documents;
            failures.extend(outcome.failures);
        }

        let plan = RunPlan {
            title: self.file.title.clone(),
            sections,
            global_documents: globals.documents,
        };
        (plan, failures)
    }
}
