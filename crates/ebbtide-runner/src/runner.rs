use ebbtide_core::LedgerEntry;
use ebbtide_loader::{LoaderError, Registry};
use ebbtide_store::SqliteStore;

use crate::error::RunnerError;
use crate::status::{compute_status, Status};

/// Result of a single `up` transition.
#[derive(Debug, Clone, PartialEq)]
pub struct UpResult {
    pub batch: i64,
    pub migration: LedgerEntry,
}

/// Result of an `upto`/`all` transition: every newly applied entry shares
/// one batch number.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub batch: i64,
    pub migrations: Vec<LedgerEntry>,
}

/// The state machine that executes apply/revert transitions against the
/// registry-resolved scripts and commits each transition to the ledger.
///
/// Every mutating operation brackets its work with the advisory lock: it is
/// taken with a compare-and-set before anything runs and released only on
/// success. A failed migration leaves the flag held on purpose, so nothing
/// else mutates the database until an operator has looked and run `unlock`.
pub struct Runner<'a> {
    registry: &'a Registry,
    store: &'a mut SqliteStore,
}

impl<'a> Runner<'a> {
    pub fn new(registry: &'a Registry, store: &'a mut SqliteStore) -> Self {
        Runner { registry, store }
    }

    /// Reconcile the registry against the ledger.
    pub fn status(&self) -> Result<Status, RunnerError> {
        let applied = self.store.list_applied()?;
        Ok(compute_status(self.registry.names(), &applied))
    }

    /// Apply exactly one migration: the first unapplied one in registry
    /// order, under a freshly allocated batch number.
    pub fn up(&mut self) -> Result<UpResult, RunnerError> {
        let status = self.status()?;
        let next = status.summary.next.ok_or(RunnerError::NoMigrations)?;
        let script = self.registry.load(&next)?;

        self.obtain_lock()?;
        let batch = self.store.next_batch()?;
        let migration = self
            .store
            .apply_migration(&next, batch, &script.up, script.up_tx)?;
        self.release_lock()?;

        Ok(UpResult { batch, migration })
    }

    /// Revert exactly one migration: the entry with the highest id. Fails
    /// if its file is gone or defines no reverse action, without touching
    /// the ledger.
    pub fn down(&mut self) -> Result<LedgerEntry, RunnerError> {
        let last = self.store.latest()?.ok_or(RunnerError::NothingToRevert)?;

        let script = self.registry.load(&last.name).map_err(|err| match err {
            LoaderError::NotFound(name) => RunnerError::DefinitionMissing(name),
            other => other.into(),
        })?;
        if !script.has_down() {
            return Err(RunnerError::NoReverseAction(last.name));
        }

        self.obtain_lock()?;
        self.store
            .revert_migration(&last, &script.down, script.down_tx)?;
        self.release_lock()?;

        Ok(last)
    }

    /// Apply every pending migration up to and including `target`, all
    /// stamped with one batch number. The target must name a pending
    /// migration; an applied or unknown name is rejected.
    pub fn upto(&mut self, target: &str) -> Result<BatchResult, RunnerError> {
        if !self.registry.contains(target) {
            return Err(RunnerError::CannotFindMigration(target.to_string()));
        }

        let status = self.status()?;
        let pending = status.pending();
        if pending.is_empty() {
            return Err(RunnerError::NoMigrations);
        }
        if !pending.iter().any(|name| name == target) {
            return Err(RunnerError::CannotFindMigration(target.to_string()));
        }

        self.obtain_lock()?;
        let batch = self.store.next_batch()?;
        let mut migrations = Vec::new();

        // strictly sequential, later scripts may depend on earlier ones
        for name in &pending {
            if name.as_str() > target {
                break;
            }
            let script = self.registry.load(name)?;
            let entry = self
                .store
                .apply_migration(name, batch, &script.up, script.up_tx)?;
            migrations.push(entry);
            if name == target {
                break;
            }
        }

        self.release_lock()?;
        Ok(BatchResult { batch, migrations })
    }

    /// Apply everything pending, targeting the lexicographically last
    /// definition.
    pub fn all(&mut self) -> Result<BatchResult, RunnerError> {
        let status = self.status()?;
        let target = status
            .pending()
            .last()
            .cloned()
            .ok_or(RunnerError::NoMigrations)?;
        self.upto(&target)
    }

    fn obtain_lock(&self) -> Result<(), RunnerError> {
        if self.store.try_obtain_lock()? {
            Ok(())
        } else {
            Err(RunnerError::LockHeld)
        }
    }

    fn release_lock(&self) -> Result<(), RunnerError> {
        if self.store.release_lock()? {
            Ok(())
        } else {
            Err(RunnerError::LockReleaseFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const A: &str = "20230101120058_add_users_table.sql";
    const B: &str = "20230101120107_add_email_to_users.sql";

    const SCRIPT_A: &str = "\
--BEGIN MIGRATION UP--
CREATE TABLE users (
  id INTEGER PRIMARY KEY,
  username TEXT UNIQUE
);
--END MIGRATION UP--
--BEGIN MIGRATION DOWN--
DROP TABLE users;
--END MIGRATION DOWN--
";

    const SCRIPT_B: &str = "\
--BEGIN MIGRATION UP--
ALTER TABLE users ADD COLUMN email TEXT;
--END MIGRATION UP--
--BEGIN MIGRATION DOWN--
ALTER TABLE users DROP COLUMN email;
--END MIGRATION DOWN--
";

    fn fixture() -> (TempDir, Registry, SqliteStore) {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join(A), SCRIPT_A).unwrap();
        fs::write(tmp.path().join(B), SCRIPT_B).unwrap();
        let registry = Registry::discover(tmp.path()).unwrap();

        let store = SqliteStore::from_connection(Connection::open_in_memory().unwrap());
        store.ensure_initialized().unwrap();

        (tmp, registry, store)
    }

    // SCRIPT_B alters the table SCRIPT_A creates, so the whole suite only
    // passes when the forward and reverse actions really execute.

    #[test]
    fn up_applies_migrations_one_at_a_time_with_increasing_batches() {
        let (_tmp, registry, mut store) = fixture();
        let mut runner = Runner::new(&registry, &mut store);

        let first = runner.up().unwrap();
        assert_eq!(first.batch, 1);
        assert_eq!(first.migration.id, 1);
        assert_eq!(first.migration.name, A);

        let second = runner.up().unwrap();
        assert_eq!(second.batch, 2);
        assert_eq!(second.migration.id, 2);
        assert_eq!(second.migration.name, B);

        assert!(matches!(runner.up().unwrap_err(), RunnerError::NoMigrations));
    }

    #[test]
    fn down_reverts_the_highest_id_until_empty() {
        let (_tmp, registry, mut store) = fixture();
        let mut runner = Runner::new(&registry, &mut store);
        runner.up().unwrap();
        runner.up().unwrap();

        assert_eq!(runner.down().unwrap().name, B);
        assert_eq!(runner.down().unwrap().name, A);
        assert!(matches!(
            runner.down().unwrap_err(),
            RunnerError::NothingToRevert
        ));
    }

    #[test]
    fn up_then_down_returns_status_to_its_previous_values() {
        let (_tmp, registry, mut store) = fixture();
        let mut runner = Runner::new(&registry, &mut store);

        let before = runner.status().unwrap();
        runner.up().unwrap();
        runner.down().unwrap();
        let after = runner.status().unwrap();

        assert_eq!(before.summary, after.summary);
    }

    #[test]
    fn upto_applies_everything_through_target_in_one_batch() {
        let (_tmp, registry, mut store) = fixture();
        let mut runner = Runner::new(&registry, &mut store);

        let result = runner.upto(B).unwrap();
        assert_eq!(result.batch, 1);
        assert_eq!(result.migrations.len(), 2);
        assert_eq!(result.migrations[0].id, 1);
        assert_eq!(result.migrations[0].name, A);
        assert_eq!(result.migrations[0].batch, 1);
        assert_eq!(result.migrations[1].id, 2);
        assert_eq!(result.migrations[1].name, B);
        assert_eq!(result.migrations[1].batch, 1);
    }

    #[test]
    fn upto_stops_at_target() {
        let (_tmp, registry, mut store) = fixture();
        let mut runner = Runner::new(&registry, &mut store);

        let result = runner.upto(A).unwrap();
        assert_eq!(result.migrations.len(), 1);
        assert_eq!(result.migrations[0].name, A);
        assert_eq!(runner.status().unwrap().summary.next.as_deref(), Some(B));
    }

    #[test]
    fn upto_rejects_unknown_and_already_applied_targets() {
        let (_tmp, registry, mut store) = fixture();
        let mut runner = Runner::new(&registry, &mut store);

        assert!(matches!(
            runner.upto("2001_a_fake_migration.sql").unwrap_err(),
            RunnerError::CannotFindMigration(_)
        ));

        runner.upto(A).unwrap();
        assert!(matches!(
            runner.upto(A).unwrap_err(),
            RunnerError::CannotFindMigration(_)
        ));
    }

    #[test]
    fn all_applies_everything_pending_then_reports_empty() {
        let (_tmp, registry, mut store) = fixture();
        let mut runner = Runner::new(&registry, &mut store);

        let result = runner.all().unwrap();
        assert_eq!(result.batch, 1);
        assert_eq!(result.migrations.len(), 2);

        assert!(matches!(
            runner.all().unwrap_err(),
            RunnerError::NoMigrations
        ));
    }

    #[test]
    fn batch_numbers_restart_after_a_full_revert() {
        let (_tmp, registry, mut store) = fixture();
        let mut runner = Runner::new(&registry, &mut store);
        runner.up().unwrap();
        runner.up().unwrap();
        runner.down().unwrap();
        runner.down().unwrap();

        let result = runner.all().unwrap();
        assert_eq!(result.batch, 1);
        assert_eq!(result.migrations[0].id, 1);
    }

    #[test]
    fn mutating_operations_refuse_to_run_while_locked() {
        let (_tmp, registry, mut store) = fixture();
        store.set_locked(true).unwrap();
        let mut runner = Runner::new(&registry, &mut store);

        assert!(matches!(runner.up().unwrap_err(), RunnerError::LockHeld));
        assert!(matches!(runner.all().unwrap_err(), RunnerError::LockHeld));
        assert!(matches!(runner.upto(A).unwrap_err(), RunnerError::LockHeld));
    }

    #[test]
    fn lock_is_released_after_a_successful_run() {
        let (_tmp, registry, mut store) = fixture();
        Runner::new(&registry, &mut store).up().unwrap();
        assert!(!store.is_locked().unwrap());
    }

    #[test]
    fn failed_migration_leaves_the_lock_held() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join(A),
            "\
--BEGIN MIGRATION UP--
CREATE TABLE;
--END MIGRATION UP--
--BEGIN MIGRATION DOWN--
DROP TABLE users;
--END MIGRATION DOWN--
",
        )
        .unwrap();
        let registry = Registry::discover(tmp.path()).unwrap();
        let mut store = SqliteStore::from_connection(Connection::open_in_memory().unwrap());
        store.ensure_initialized().unwrap();

        let err = Runner::new(&registry, &mut store).up().unwrap_err();
        assert!(matches!(err, RunnerError::Store(_)));
        assert!(store.is_locked().unwrap());
        assert!(store.list_applied().unwrap().is_empty());
    }

    #[test]
    fn skipped_migration_does_not_block_up() {
        let (_tmp, registry, mut store) = fixture();
        // apply B out of order, leaving A pending
        store
            .apply_migration(B, 1, "SELECT 1;", true)
            .unwrap();

        let mut runner = Runner::new(&registry, &mut store);
        let status = runner.status().unwrap();
        assert_eq!(status.summary.skipped, 1);
        assert_eq!(status.summary.next.as_deref(), Some(A));

        // applying next heals the skip
        let result = runner.up().unwrap();
        assert_eq!(result.migration.name, A);
        assert_eq!(runner.status().unwrap().summary.skipped, 0);
    }

    #[test]
    fn down_fails_when_the_file_is_gone() {
        let (tmp, _registry, mut store) = fixture();
        let mut runner_registry = Registry::discover(tmp.path()).unwrap();
        {
            let mut runner = Runner::new(&runner_registry, &mut store);
            runner.up().unwrap();
        }

        fs::remove_file(tmp.path().join(A)).unwrap();
        runner_registry = Registry::discover(tmp.path()).unwrap();

        let mut runner = Runner::new(&runner_registry, &mut store);
        let err = runner.down().unwrap_err();
        assert!(matches!(err, RunnerError::DefinitionMissing(name) if name == A));
        // the ledger row was not silently removed
        assert_eq!(store.list_applied().unwrap().len(), 1);
    }

    #[test]
    fn down_fails_when_no_reverse_action_is_defined() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join(A),
            "\
--BEGIN MIGRATION UP--
CREATE TABLE users (id INTEGER PRIMARY KEY);
--END MIGRATION UP--
--BEGIN MIGRATION DOWN--
--END MIGRATION DOWN--
",
        )
        .unwrap();
        let registry = Registry::discover(tmp.path()).unwrap();
        let mut store = SqliteStore::from_connection(Connection::open_in_memory().unwrap());
        store.ensure_initialized().unwrap();

        let mut runner = Runner::new(&registry, &mut store);
        runner.up().unwrap();
        let err = runner.down().unwrap_err();
        assert!(matches!(err, RunnerError::NoReverseAction(name) if name == A));
        assert_eq!(store.list_applied().unwrap().len(), 1);
    }

    #[test]
    fn operations_on_an_uninitialized_store_report_missing_tables() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join(A), SCRIPT_A).unwrap();
        let registry = Registry::discover(tmp.path()).unwrap();
        let mut store = SqliteStore::from_connection(Connection::open_in_memory().unwrap());

        let mut runner = Runner::new(&registry, &mut store);
        assert!(matches!(
            runner.status().unwrap_err(),
            RunnerError::Store(ebbtide_store::StoreError::MissingTables)
        ));
        assert!(matches!(
            runner.up().unwrap_err(),
            RunnerError::Store(ebbtide_store::StoreError::MissingTables)
        ));
    }
}
