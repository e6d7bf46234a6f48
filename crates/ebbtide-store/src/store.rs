use chrono::Utc;
use ebbtide_core::LedgerEntry;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;

const INIT: &str = "\
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    batch INTEGER NOT NULL,
    migration_time TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS migrations_lock (
    \"index\" INTEGER PRIMARY KEY,
    is_locked INTEGER NOT NULL
);
INSERT OR IGNORE INTO migrations_lock (\"index\", is_locked) VALUES (1, 0);";

/// Persistent record of applied migrations plus the advisory lock flag,
/// backed by SQLite. The single source of truth shared across invocations;
/// passed around as an explicit handle, never a singleton.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a store from a connection string. Accepts
    /// `sqlite://localhost/<path>` (doubled slash for absolute paths) or a
    /// bare filesystem path.
    pub fn open(connection: &str) -> Result<Self, StoreError> {
        let path = sqlite_path(connection)?;
        let conn =
            Connection::open(&path).map_err(|_| StoreError::Connection(connection.to_string()))?;
        Ok(SqliteStore { conn })
    }

    /// Wrap an existing connection, mainly for tests.
    pub fn from_connection(conn: Connection) -> Self {
        SqliteStore { conn }
    }

    /// Create the backing tables if absent and seed the lock row. Idempotent.
    pub fn ensure_initialized(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(INIT)?;
        Ok(())
    }

    pub fn is_initialized(&self) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'table' AND name IN ('migrations', 'migrations_lock')",
            [],
            |row| row.get(0),
        )?;
        Ok(count == 2)
    }

    /// Every read/mutate operation surfaces this error when the store was
    /// never initialized.
    pub fn require_initialized(&self) -> Result<(), StoreError> {
        if self.is_initialized()? {
            Ok(())
        } else {
            Err(StoreError::MissingTables)
        }
    }

    /// All ledger entries in application order (ascending id).
    pub fn list_applied(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        self.require_initialized()?;
        let mut stmt = self.conn.prepare(
            "SELECT id, name, batch, migration_time FROM migrations ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LedgerEntry {
                id: row.get(0)?,
                name: row.get(1)?,
                batch: row.get(2)?,
                applied_at: row.get(3)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// The most recently applied entry (highest id), if any.
    pub fn latest(&self) -> Result<Option<LedgerEntry>, StoreError> {
        self.require_initialized()?;
        let entry = self
            .conn
            .query_row(
                "SELECT id, name, batch, migration_time FROM migrations
                 ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(LedgerEntry {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        batch: row.get(2)?,
                        applied_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// Next batch number: one greater than the highest live batch. A fully
    /// reverted ledger restarts at 1.
    pub fn next_batch(&self) -> Result<i64, StoreError> {
        self.require_initialized()?;
        let highest: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(batch), 0) FROM migrations",
            [],
            |row| row.get(0),
        )?;
        Ok(highest + 1)
    }

    /// Execute a migration's forward action and record the ledger row. When
    /// `in_tx` both happen in one transaction so a failed action leaves no
    /// row behind; otherwise the action runs bare (the file opted out) and
    /// only the bookkeeping write is transactional.
    pub fn apply_migration(
        &mut self,
        name: &str,
        batch: i64,
        up_sql: &str,
        in_tx: bool,
    ) -> Result<LedgerEntry, StoreError> {
        self.require_initialized()?;
        if in_tx {
            let tx = self.conn.transaction()?;
            run_script(&tx, name, up_sql)?;
            let entry = insert_entry(&tx, name, batch)?;
            tx.commit()?;
            Ok(entry)
        } else {
            run_script(&self.conn, name, up_sql)?;
            insert_entry(&self.conn, name, batch)
        }
    }

    /// Execute a migration's reverse action and delete its ledger row, with
    /// the same transaction pairing as `apply_migration`.
    pub fn revert_migration(
        &mut self,
        entry: &LedgerEntry,
        down_sql: &str,
        in_tx: bool,
    ) -> Result<(), StoreError> {
        self.require_initialized()?;
        if in_tx {
            let tx = self.conn.transaction()?;
            run_script(&tx, &entry.name, down_sql)?;
            delete_entry(&tx, entry)?;
            tx.commit()?;
            Ok(())
        } else {
            run_script(&self.conn, &entry.name, down_sql)?;
            delete_entry(&self.conn, entry)
        }
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

fn run_script(conn: &Connection, name: &str, sql: &str) -> Result<(), StoreError> {
    conn.execute_batch(sql).map_err(|source| StoreError::Script {
        name: name.to_string(),
        source,
    })
}

fn insert_entry(conn: &Connection, name: &str, batch: i64) -> Result<LedgerEntry, StoreError> {
    let applied_at = Utc::now();
    let result = conn.execute(
        "INSERT INTO migrations (id, name, batch, migration_time)
         VALUES ((SELECT COALESCE(MAX(id), 0) + 1 FROM migrations), ?1, ?2, ?3)",
        params![name, batch, applied_at],
    );

    match result {
        Ok(_) => Ok(LedgerEntry {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            batch,
            applied_at,
        }),
        Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateName(name.to_string())),
        Err(err) => Err(err.into()),
    }
}

fn delete_entry(conn: &Connection, entry: &LedgerEntry) -> Result<(), StoreError> {
    let affected = conn.execute(
        "DELETE FROM migrations WHERE id = ?1 AND name = ?2",
        params![entry.id, entry.name],
    )?;
    if affected == 1 {
        Ok(())
    } else {
        Err(StoreError::LedgerConflict(entry.name.clone()))
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Extract the filesystem path from a connection string. Mirrors the URL
/// convention `sqlite://localhost/file.db`, where a doubled slash yields an
/// absolute path (`sqlite://localhost//var/db/app.db`).
fn sqlite_path(connection: &str) -> Result<String, StoreError> {
    if let Some(rest) = connection.strip_prefix("sqlite://") {
        let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
        if !matches!(host, "" | "localhost" | "127.0.0.1" | "::1") {
            return Err(StoreError::BadHost);
        }
        if path.is_empty() {
            return Err(StoreError::Connection(connection.to_string()));
        }
        return Ok(path.to_string());
    }

    if let Some((scheme, _)) = connection.split_once("://") {
        return Err(StoreError::UnsupportedScheme(scheme.to_string()));
    }

    Ok(connection.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> SqliteStore {
        SqliteStore::from_connection(Connection::open_in_memory().unwrap())
    }

    fn initialized_store() -> SqliteStore {
        let store = memory_store();
        store.ensure_initialized().unwrap();
        store
    }

    #[test]
    fn initialization_is_idempotent() {
        let store = memory_store();
        store.ensure_initialized().unwrap();
        store.ensure_initialized().unwrap();
        assert!(store.is_initialized().unwrap());
        assert!(!store.is_locked().unwrap());
    }

    #[test]
    fn uninitialized_store_reports_missing_tables() {
        let store = memory_store();
        assert!(!store.is_initialized().unwrap());
        assert!(matches!(
            store.list_applied().unwrap_err(),
            StoreError::MissingTables
        ));
        assert!(matches!(
            store.next_batch().unwrap_err(),
            StoreError::MissingTables
        ));
    }

    #[test]
    fn ids_and_batches_increase_from_one() {
        let mut store = initialized_store();
        assert_eq!(store.next_batch().unwrap(), 1);

        let first = store
            .apply_migration("0001_a.sql", 1, "CREATE TABLE a (id INTEGER);", true)
            .unwrap();
        assert_eq!(first.id, 1);

        let second = store
            .apply_migration("0002_b.sql", 2, "CREATE TABLE b (id INTEGER);", true)
            .unwrap();
        assert_eq!(second.id, 2);
        assert_eq!(store.next_batch().unwrap(), 3);

        let entries = store.list_applied().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "0001_a.sql");
        assert_eq!(entries[1].name, "0002_b.sql");
        assert_eq!(store.latest().unwrap().unwrap().name, "0002_b.sql");
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut store = initialized_store();
        store
            .apply_migration("0001_a.sql", 1, "CREATE TABLE a (id INTEGER);", true)
            .unwrap();
        let err = store
            .apply_migration("0001_a.sql", 2, "SELECT 1;", true)
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(_)));
    }

    #[test]
    fn failed_action_leaves_no_ledger_row() {
        let mut store = initialized_store();
        let err = store
            .apply_migration("0001_a.sql", 1, "CREATE TABLE;", true)
            .unwrap_err();
        assert!(matches!(err, StoreError::Script { .. }));
        assert!(store.list_applied().unwrap().is_empty());
        // the failed batch number was never consumed
        assert_eq!(store.next_batch().unwrap(), 1);
    }

    #[test]
    fn failed_action_rolls_back_partial_schema_changes() {
        let mut store = initialized_store();
        let err = store
            .apply_migration(
                "0001_a.sql",
                1,
                "CREATE TABLE a (id INTEGER); CREATE TABLE a (id INTEGER);",
                true,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Script { .. }));

        // first statement was rolled back with the rest
        let count: i64 = store
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'a'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn opted_out_action_still_records_the_ledger_row() {
        let mut store = initialized_store();
        let entry = store
            .apply_migration("0001_a.sql", 1, "CREATE TABLE a (id INTEGER);", false)
            .unwrap();
        assert_eq!(entry.id, 1);
        assert_eq!(store.list_applied().unwrap().len(), 1);
    }

    #[test]
    fn revert_removes_exactly_the_given_row() {
        let mut store = initialized_store();
        store
            .apply_migration("0001_a.sql", 1, "CREATE TABLE a (id INTEGER);", true)
            .unwrap();
        let latest = store.latest().unwrap().unwrap();
        store
            .revert_migration(&latest, "DROP TABLE a;", true)
            .unwrap();
        assert!(store.list_applied().unwrap().is_empty());
        assert!(store.latest().unwrap().is_none());
    }

    #[test]
    fn failed_revert_keeps_the_ledger_row() {
        let mut store = initialized_store();
        store
            .apply_migration("0001_a.sql", 1, "CREATE TABLE a (id INTEGER);", true)
            .unwrap();
        let latest = store.latest().unwrap().unwrap();
        let err = store
            .revert_migration(&latest, "DROP TABLE does_not_exist;", true)
            .unwrap_err();
        assert!(matches!(err, StoreError::Script { .. }));
        assert_eq!(store.list_applied().unwrap().len(), 1);
    }

    #[test]
    fn batch_restarts_after_full_revert() {
        let mut store = initialized_store();
        store
            .apply_migration("0001_a.sql", 1, "CREATE TABLE a (id INTEGER);", true)
            .unwrap();
        let latest = store.latest().unwrap().unwrap();
        store
            .revert_migration(&latest, "DROP TABLE a;", true)
            .unwrap();
        assert_eq!(store.next_batch().unwrap(), 1);
    }

    #[test]
    fn file_backed_store_persists_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let connection = format!(
            "sqlite://localhost/{}",
            tmp.path().join("app.db").display()
        );

        {
            let mut store = SqliteStore::open(&connection).unwrap();
            store.ensure_initialized().unwrap();
            store
                .apply_migration("0001_a.sql", 1, "CREATE TABLE a (id INTEGER);", true)
                .unwrap();
        }

        let store = SqliteStore::open(&connection).unwrap();
        assert!(store.is_initialized().unwrap());
        let entries = store.list_applied().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "0001_a.sql");
    }

    #[test]
    fn connection_string_forms() {
        assert_eq!(sqlite_path("app.db").unwrap(), "app.db");
        assert_eq!(sqlite_path("sqlite://localhost/app.db").unwrap(), "app.db");
        assert_eq!(
            sqlite_path("sqlite://localhost//var/db/app.db").unwrap(),
            "/var/db/app.db"
        );
        assert!(matches!(
            sqlite_path("sqlite://example.com/app.db").unwrap_err(),
            StoreError::BadHost
        ));
        assert!(matches!(
            sqlite_path("postgresql://localhost/app").unwrap_err(),
            StoreError::UnsupportedScheme(scheme) if scheme == "postgresql"
        ));
    }
}
