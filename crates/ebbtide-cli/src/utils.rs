use ebbtide_config::EbbtideConfig;
use ebbtide_loader::Registry;
use ebbtide_store::SqliteStore;

use crate::response::Response;

/// Open the store without requiring the ledger tables. Only `init` takes
/// this path.
pub fn open_store(cfg: &EbbtideConfig) -> Result<SqliteStore, Response> {
    Ok(SqliteStore::open(&cfg.connection)?)
}

/// Open the store and insist the ledger tables exist.
pub fn open_ledger(cfg: &EbbtideConfig) -> Result<SqliteStore, Response> {
    let store = open_store(cfg)?;
    store.require_initialized()?;
    Ok(store)
}

/// Scan the migrations directory into a sorted registry.
pub fn load_registry(cfg: &EbbtideConfig) -> Result<Registry, Response> {
    Ok(Registry::discover(cfg.migrations_dir())?)
}
