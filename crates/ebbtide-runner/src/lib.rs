pub mod error;
pub mod runner;
pub mod status;

pub use error::RunnerError;
pub use runner::{BatchResult, Runner, UpResult};
pub use status::{compute_status, ListItem, Status, StatusSummary};
