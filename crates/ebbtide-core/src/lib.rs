pub mod entry;
pub mod view;

pub use entry::LedgerEntry;
pub use view::{MigrationStatus, MigrationView};
