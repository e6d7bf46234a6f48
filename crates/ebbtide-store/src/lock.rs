use crate::error::StoreError;
use crate::store::SqliteStore;

const OBTAIN: &str =
    "UPDATE migrations_lock SET is_locked = 1 WHERE \"index\" = 1 AND is_locked = 0";
const RELEASE: &str =
    "UPDATE migrations_lock SET is_locked = 0 WHERE \"index\" = 1 AND is_locked = 1";

/// Advisory lock operations. The flag is a single persistent row set with
/// compare-and-set updates, so two invocations racing for it on the same
/// database cannot both win.
impl SqliteStore {
    pub fn is_locked(&self) -> Result<bool, StoreError> {
        self.require_initialized()?;
        let locked: i64 = self.conn().query_row(
            "SELECT is_locked FROM migrations_lock WHERE \"index\" = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(locked != 0)
    }

    /// Atomically take the lock. Returns false when another invocation (or
    /// an explicit `lock` command) already holds it.
    pub fn try_obtain_lock(&self) -> Result<bool, StoreError> {
        self.require_initialized()?;
        let affected = self.conn().execute(OBTAIN, [])?;
        Ok(affected == 1)
    }

    /// Atomically drop the lock. Returns false when it was not held.
    pub fn release_lock(&self) -> Result<bool, StoreError> {
        self.require_initialized()?;
        let affected = self.conn().execute(RELEASE, [])?;
        Ok(affected == 1)
    }

    /// Set the flag to the given value, returning the previous value. The
    /// explicit `lock`/`unlock` commands use this so they can report an
    /// "already" outcome instead of failing.
    pub fn set_locked(&mut self, locked: bool) -> Result<bool, StoreError> {
        self.require_initialized()?;
        let tx = self.conn_mut().transaction()?;
        let previous: i64 = tx.query_row(
            "SELECT is_locked FROM migrations_lock WHERE \"index\" = 1",
            [],
            |row| row.get(0),
        )?;
        tx.execute(
            "UPDATE migrations_lock SET is_locked = ?1 WHERE \"index\" = 1",
            [locked as i64],
        )?;
        tx.commit()?;
        Ok(previous != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn initialized_store() -> SqliteStore {
        let store = SqliteStore::from_connection(Connection::open_in_memory().unwrap());
        store.ensure_initialized().unwrap();
        store
    }

    #[test]
    fn obtain_and_release_round_trip() {
        let store = initialized_store();
        assert!(!store.is_locked().unwrap());

        assert!(store.try_obtain_lock().unwrap());
        assert!(store.is_locked().unwrap());

        // second taker loses
        assert!(!store.try_obtain_lock().unwrap());

        assert!(store.release_lock().unwrap());
        assert!(!store.is_locked().unwrap());

        // releasing an unheld lock changes nothing
        assert!(!store.release_lock().unwrap());
    }

    #[test]
    fn set_locked_reports_previous_state() {
        let mut store = initialized_store();

        assert!(!store.set_locked(true).unwrap());
        assert!(store.set_locked(true).unwrap()); // already locked
        assert!(store.is_locked().unwrap());

        assert!(store.set_locked(false).unwrap());
        assert!(!store.set_locked(false).unwrap()); // already unlocked
        assert!(!store.is_locked().unwrap());
    }

    #[test]
    fn lock_operations_require_initialization() {
        let store = SqliteStore::from_connection(Connection::open_in_memory().unwrap());
        assert!(matches!(
            store.is_locked().unwrap_err(),
            StoreError::MissingTables
        ));
        assert!(matches!(
            store.try_obtain_lock().unwrap_err(),
            StoreError::MissingTables
        ));
    }
}
