use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no database connection configured (use --connection, EBBTIDE_CONNECTION, or a config file)")]
    MissingConnection,
    #[error("no migrations directory configured (use --migrations, EBBTIDE_MIGRATIONS, or a config file)")]
    MissingMigrations,
}
