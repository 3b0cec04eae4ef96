//! Per-section generation records and the run-level state machine.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use rw_domain::error::{Error, ErrorKind, Result};
use rw_domain::report::{Section, SectionId};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Run state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Generating,
    Paused,
    Complete,
    Cancelled,
    Error,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled | Self::Error)
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Generating | Self::Paused)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Section status
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Queued,
    Generating,
    Complete,
    Error,
}

impl SectionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    /// Allowed moves. `Error -> Generating` is a retry and
    /// `Complete -> Generating` a regenerate.
    pub fn can_move_to(self, next: SectionStatus) -> bool {
        use SectionStatus::*;
        matches!(
            (self, next),
            (Queued, Generating)
                | (Error, Generating)
                | (Complete, Generating)
                | (Generating, Complete)
                | (Generating, Error)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Generating => "generating",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generation record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize)]
pub struct GenerationRecord {
    pub section_id: SectionId,
    pub name: String,
    pub overview: bool,
    pub status: SectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub tokens: u64,
    pub cost_usd: f64,
    /// Generation attempts, including retries and regenerations.
    pub attempts: u32,
    pub updated_at: DateTime<Utc>,
}

impl GenerationRecord {
    fn queued(section: &Section) -> Self {
        Self {
            section_id: section.id().clone(),
            name: section.name.clone(),
            overview: section.overview,
            status: SectionStatus::Queued,
            content: None,
            error: None,
            error_kind: None,
            tokens: 0,
            cost_usd: 0.0,
            attempts: 0,
            updated_at: Utc::now(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RecordMap
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
struct Inner {
    order: Vec<SectionId>,
    records: HashMap<SectionId, GenerationRecord>,
}

/// Per-section records keyed by [`SectionId`], kept in report order.
///
/// Concurrent section tasks each touch only their own entry.
#[derive(Default)]
pub struct RecordMap {
    inner: RwLock<Inner>,
}

impl RecordMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with one queued record per section.
    pub fn reset(&self, sections: &[Section]) {
        let mut inner = self.inner.write();
        inner.order = sections.iter().map(|s| s.id().clone()).collect();
        inner.records = sections
            .iter()
            .map(|s| (s.id().clone(), GenerationRecord::queued(s)))
            .collect();
    }

    pub fn get(&self, id: &SectionId) -> Option<GenerationRecord> {
        self.inner.read().records.get(id).cloned()
    }

    pub fn status(&self, id: &SectionId) -> Option<SectionStatus> {
        self.inner.read().records.get(id).map(|r| r.status)
    }

    /// Move a section into `Generating`, checking the transition.
    pub fn begin(&self, id: &SectionId) -> Result<()> {
        let mut inner = self.inner.write();
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("section {id}")))?;
        if !record.status.can_move_to(SectionStatus::Generating) {
            return Err(Error::InvalidState(format!(
                "section \"{}\" is {}",
                record.name,
                record.status.as_str()
            )));
        }
        record.status = SectionStatus::Generating;
        record.attempts += 1;
        record.updated_at = Utc::now();
        Ok(())
    }

    pub fn complete(&self, id: &SectionId, content: String, tokens: u64, cost_usd: f64) {
        self.finish(id, |r| {
            r.status = SectionStatus::Complete;
            r.content = Some(content);
            r.error = None;
            r.error_kind = None;
            r.tokens += tokens;
            r.cost_usd += cost_usd;
        });
    }

    /// Record a failure. Content from an earlier successful attempt is
    /// dropped so the record reflects the latest attempt only.
    pub fn fail(&self, id: &SectionId, err: &Error) {
        let message = err.to_string();
        let kind = err.kind();
        self.finish(id, |r| {
            r.status = SectionStatus::Error;
            r.content = None;
            r.error = Some(message);
            r.error_kind = Some(kind);
        });
    }

    fn finish(&self, id: &SectionId, apply: impl FnOnce(&mut GenerationRecord)) {
        let mut inner = self.inner.write();
        match inner.records.get_mut(id) {
            Some(record) if record.status == SectionStatus::Generating => {
                apply(record);
                record.updated_at = Utc::now();
            }
            Some(record) => {
                tracing::warn!(section = %record.name, status = record.status.as_str(), "finish on a section that is not generating");
            }
            None => tracing::warn!(section_id = %id, "finish on an unknown section"),
        }
    }

    /// All records in report order.
    pub fn snapshot(&self) -> Vec<GenerationRecord> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id).cloned())
            .collect()
    }

    /// `(name, content)` of completed sections, in report order.
    pub fn completed(&self) -> Vec<(String, String)> {
        self.snapshot()
            .into_iter()
            .filter(|r| r.status == SectionStatus::Complete)
            .filter_map(|r| r.content.map(|c| (r.name, c)))
            .collect()
    }

    pub fn count(&self, status: SectionStatus) -> usize {
        self.inner
            .read()
            .records
            .values()
            .filter(|r| r.status == status)
            .count()
    }
}
