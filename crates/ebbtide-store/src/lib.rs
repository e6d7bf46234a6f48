pub mod error;
pub mod lock;
pub mod store;

pub use error::StoreError;
pub use store::SqliteStore;
