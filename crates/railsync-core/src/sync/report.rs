//! Outcome counters for one sync run

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::models::EntityKind;

/// What happened to one entity kind during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    /// Source records bound to an existing destination record
    pub matched: usize,
    pub created: usize,
    pub deleted: usize,
    /// Orphans left in place because deletion was disabled
    pub orphans_kept: usize,
}

impl KindCounts {
    pub const fn mutations(&self) -> usize {
        self.created + self.deleted
    }
}

/// Summary returned by [`crate::sync::Orchestrator::sync`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    counts: BTreeMap<EntityKind, KindCounts>,
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            counts: EntityKind::ALL
                .into_iter()
                .map(|kind| (kind, KindCounts::default()))
                .collect(),
        }
    }

    pub fn counts(&self, kind: EntityKind) -> KindCounts {
        self.counts.get(&kind).copied().unwrap_or_default()
    }

    /// Create and delete calls issued across all kinds
    pub fn mutations(&self) -> usize {
        self.counts.values().map(KindCounts::mutations).sum()
    }

    pub fn orphans_kept(&self) -> usize {
        self.counts.values().map(|counts| counts.orphans_kept).sum()
    }

    pub(crate) fn counts_mut(&mut self, kind: EntityKind) -> &mut KindCounts {
        self.counts.entry(kind).or_default()
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, counts) in &self.counts {
            writeln!(
                f,
                "{:<10} {} matched, {} created, {} deleted, {} orphans kept",
                kind.plural(),
                counts.matched,
                counts.created,
                counts.deleted,
                counts.orphans_kept
            )?;
        }
        if let Some(finished_at) = self.finished_at {
            let elapsed = finished_at - self.started_at;
            write!(f, "finished in {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0)?;
        }
        Ok(())
    }
}
