use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "ebbtide.json";

const ENV_CONNECTION: &str = "EBBTIDE_CONNECTION";
const ENV_MIGRATIONS: &str = "EBBTIDE_MIGRATIONS";

/// Resolved configuration: everything the engine needs to find its two
/// external collaborators, the database and the migrations directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EbbtideConfig {
    /// Database connection string, e.g. `sqlite://localhost/app.db`.
    pub connection: String,
    /// Directory holding the `.sql` migration files.
    pub migrations: PathBuf,
}

impl EbbtideConfig {
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations
    }
}

/// Partial configuration read from one source. Sources are merged with
/// CLI flags taking priority over environment variables over the config
/// file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default)]
    pub connection: Option<String>,
    #[serde(default)]
    pub migrations: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Read overrides from the environment.
    pub fn from_env() -> Self {
        ConfigOverrides {
            connection: std::env::var(ENV_CONNECTION).ok().filter(|v| !v.is_empty()),
            migrations: std::env::var(ENV_MIGRATIONS)
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Read overrides from a JSON config file. A missing file at the
    /// default location is fine; a missing file named explicitly is not.
    pub fn from_file(path: &Path, explicit: bool) -> Result<Self, ConfigError> {
        if !path.exists() && !explicit {
            return Ok(ConfigOverrides::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn or(self, fallback: ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            connection: self.connection.or(fallback.connection),
            migrations: self.migrations.or(fallback.migrations),
        }
    }

    /// Merge flag overrides with the environment and a config file into a
    /// complete configuration.
    pub fn resolve(self, config_file: Option<&Path>) -> Result<EbbtideConfig, ConfigError> {
        let explicit = config_file.is_some();
        let path = config_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let merged = self
            .or(ConfigOverrides::from_env())
            .or(ConfigOverrides::from_file(&path, explicit)?);

        Ok(EbbtideConfig {
            connection: merged.connection.ok_or(ConfigError::MissingConnection)?,
            migrations: merged.migrations.ok_or(ConfigError::MissingMigrations)?,
        })
    }
}
