//! ebbtide keeps a persistent ledger of applied schema migrations and
//! executes forward/backward transitions against it: discover `.sql`
//! migration files with a [`Registry`], open the ledger with a
//! [`SqliteStore`], and drive transitions through a [`Runner`].

#[doc(inline)]
pub use ebbtide_runner::Runner;

// Re-export other commonly used items
pub use ebbtide_config::{ConfigOverrides, EbbtideConfig};
pub use ebbtide_core::{LedgerEntry, MigrationStatus, MigrationView};
pub use ebbtide_loader::{MigrationScript, Registry};
pub use ebbtide_runner::{compute_status, BatchResult, RunnerError, Status, UpResult};
pub use ebbtide_store::{SqliteStore, StoreError};
