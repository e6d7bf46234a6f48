use colored::Colorize;
use ebbtide_config::ConfigError;
use ebbtide_loader::LoaderError;
use ebbtide_runner::RunnerError;
use ebbtide_store::StoreError;
use serde::Serialize;

/// Stable machine-keyable error codes. The code, not the message, is the
/// contract for programmatic branching, and it alone determines the process
/// exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    CommandUsage,
    MissingTables,
    NoMigrations,
    NothingToRevert,
    CannotFindMigration,
    IrreversibleMigration,
    InvalidMigration,
    MigrationFailed,
    LockHeld,
    LockReleaseFailed,
    Connection,
    Config,
    Database,
    UnableCreateMigration,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::CommandUsage => "command_usage",
            ErrorCode::MissingTables => "missing_tables",
            ErrorCode::NoMigrations => "no_migrations",
            ErrorCode::NothingToRevert => "nothing_to_revert",
            ErrorCode::CannotFindMigration => "cannot_find_migration",
            ErrorCode::IrreversibleMigration => "irreversible_migration",
            ErrorCode::InvalidMigration => "invalid_migration",
            ErrorCode::MigrationFailed => "migration_failed",
            ErrorCode::LockHeld => "lock_held",
            ErrorCode::LockReleaseFailed => "lock_release_failed",
            ErrorCode::Connection => "connection",
            ErrorCode::Config => "config",
            ErrorCode::Database => "database",
            ErrorCode::UnableCreateMigration => "unable_create_migration",
        }
    }

    pub fn exit_status(self) -> i32 {
        match self {
            ErrorCode::MissingTables => 9,
            _ => 1,
        }
    }
}

/// Returned by every command function. Rendered either as JSON (the payload
/// wholesale if one is set, otherwise the response itself) or as colored
/// text for humans.
#[derive(Debug, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(rename = "error_details", skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(rename = "code", skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    success: Option<String>,
    #[serde(skip)]
    payload: Option<serde_json::Value>,
    #[serde(skip)]
    exit_status: i32,
}

impl Response {
    pub fn success(message: impl Into<String>) -> Self {
        Response {
            error: None,
            details: None,
            code: None,
            success: Some(message.into()),
            payload: None,
            exit_status: 0,
        }
    }

    /// Success with a wholesale JSON payload replacing the response envelope
    /// in `--json` mode.
    pub fn serializable(message: impl Into<String>, payload: serde_json::Value) -> Self {
        Response {
            payload: Some(payload),
            ..Response::success(message)
        }
    }

    pub fn error(message: impl Into<String>, code: ErrorCode) -> Self {
        Response {
            error: Some(message.into()),
            details: None,
            code: Some(code.as_str()),
            success: None,
            payload: None,
            exit_status: code.exit_status(),
        }
    }

    pub fn with_details(mut self, details: impl std::fmt::Display) -> Self {
        self.details = Some(details.to_string());
        self
    }

    /// Print the response and hand back the process exit status.
    pub fn render(&self, json: bool) -> i32 {
        if json {
            let serialized = match &self.payload {
                Some(payload) => serde_json::to_string(payload),
                None => serde_json::to_string(self),
            };
            match serialized {
                Ok(out) => println!("{out}"),
                Err(_) => {
                    println!("unable to serialize response output json");
                    return 1;
                }
            }
            return self.exit_status;
        }

        if let Some(error) = &self.error {
            // multi-line messages carry their own per-line colors
            if error.contains('\n') {
                println!("{error}");
            } else {
                println!("{}", error.red());
            }
        }
        if let Some(details) = &self.details {
            println!("{}", details.yellow());
        }
        if let Some(success) = &self.success {
            if success.contains('\n') {
                println!("{success}");
            } else {
                println!("{}", success.bright_green());
            }
        }

        self.exit_status
    }

    #[cfg(test)]
    pub fn exit_code(&self) -> i32 {
        self.exit_status
    }

    #[cfg(test)]
    pub fn error_code(&self) -> Option<&'static str> {
        self.code
    }
}

impl From<ConfigError> for Response {
    fn from(err: ConfigError) -> Self {
        Response::error(err.to_string(), ErrorCode::Config)
    }
}

impl From<StoreError> for Response {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingTables => Response::error(err.to_string(), ErrorCode::MissingTables),
            StoreError::Connection(_) | StoreError::UnsupportedScheme(_) | StoreError::BadHost => {
                Response::error(err.to_string(), ErrorCode::Connection)
            }
            StoreError::Script { ref source, .. } => {
                let details = source.to_string();
                Response::error(err.to_string(), ErrorCode::MigrationFailed).with_details(details)
            }
            StoreError::DuplicateName(_) | StoreError::LedgerConflict(_) | StoreError::Sqlite(_) => {
                Response::error(err.to_string(), ErrorCode::Database)
            }
        }
    }
}

impl From<LoaderError> for Response {
    fn from(err: LoaderError) -> Self {
        Response::error(err.to_string(), ErrorCode::InvalidMigration)
    }
}

impl From<RunnerError> for Response {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::NoMigrations => Response::error(err.to_string(), ErrorCode::NoMigrations),
            RunnerError::NothingToRevert => {
                Response::error(err.to_string(), ErrorCode::NothingToRevert)
            }
            RunnerError::CannotFindMigration(_) => {
                Response::error(err.to_string(), ErrorCode::CannotFindMigration)
            }
            RunnerError::NoReverseAction(_) | RunnerError::DefinitionMissing(_) => {
                Response::error(err.to_string(), ErrorCode::IrreversibleMigration)
            }
            RunnerError::LockHeld => Response::error(err.to_string(), ErrorCode::LockHeld),
            RunnerError::LockReleaseFailed => {
                Response::error(err.to_string(), ErrorCode::LockReleaseFailed)
            }
            RunnerError::Store(inner) => inner.into(),
            RunnerError::Loader(inner) => inner.into(),
        }
    }
}
