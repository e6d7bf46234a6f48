use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to open database for connection string {0}")]
    Connection(String),
    #[error("ebbtide doesn't support the '{0}' database")]
    UnsupportedScheme(String),
    #[error("sqlite connection requires a host name of localhost")]
    BadHost,
    #[error("migration tables do not exist, run `ebbtide init` first")]
    MissingTables,
    #[error("migration {0} is already recorded in the ledger")]
    DuplicateName(String),
    #[error("ledger row for {0} changed underneath us")]
    LedgerConflict(String),
    #[error("migration {name} failed: {source}")]
    Script {
        name: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
