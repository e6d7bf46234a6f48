use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the migration ledger. Created when a migration is applied,
/// deleted when it is reverted, never mutated in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Store-assigned, strictly increasing application sequence number.
    pub id: i64,
    /// Migration file name, unique across the ledger.
    pub name: String,
    /// Groups entries applied together in one invocation.
    pub batch: i64,
    /// Store-stamped time of application.
    #[serde(rename = "time")]
    pub applied_at: DateTime<Utc>,
}
