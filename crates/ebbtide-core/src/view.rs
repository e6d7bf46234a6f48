use serde::{Deserialize, Serialize};

use crate::entry::LedgerEntry;

/// Classification of one migration after reconciling the registry against
/// the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    /// Present on disk and recorded in the ledger.
    Applied,
    /// Present on disk, not yet recorded, next in line or later.
    Unapplied,
    /// Present on disk but a later-named migration was applied while this
    /// one was left pending.
    Skipped,
    /// Recorded in the ledger but the file no longer exists on disk.
    Missing,
}

/// Output view of a migration. The key set intentionally varies by state:
/// an unapplied migration has only a name, an applied one carries the full
/// ledger row. The asymmetry is part of the output contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MigrationView {
    Applied {
        id: i64,
        name: String,
        batch: i64,
        time: chrono::DateTime<chrono::Utc>,
    },
    Unapplied { name: String },
}

impl MigrationView {
    pub fn unapplied(name: impl Into<String>) -> Self {
        MigrationView::Unapplied { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            MigrationView::Applied { name, .. } => name,
            MigrationView::Unapplied { name } => name,
        }
    }
}

impl From<&LedgerEntry> for MigrationView {
    fn from(entry: &LedgerEntry) -> Self {
        MigrationView::Applied {
            id: entry.id,
            name: entry.name.clone(),
            batch: entry.batch,
            time: entry.applied_at,
        }
    }
}
