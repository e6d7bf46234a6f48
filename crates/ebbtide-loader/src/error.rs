use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("unable to read migrations directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to read migration file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid migration file {name}: {reason}")]
    InvalidDefinition { name: String, reason: String },
    #[error("no migration named {0}")]
    NotFound(String),
}

impl LoaderError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        LoaderError::InvalidDefinition {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
