pub mod error;
pub mod registry;
pub mod script;

pub use error::LoaderError;
pub use registry::Registry;
pub use script::MigrationScript;
