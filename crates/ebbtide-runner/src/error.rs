use ebbtide_loader::LoaderError;
use ebbtide_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("there are no migrations to run")]
    NoMigrations,
    #[error("there are no migrations to revert")]
    NothingToRevert,
    #[error("unable to find an unexecuted upcoming migration named {0}")]
    CannotFindMigration(String),
    #[error("migration {0} defines no reverse action and cannot be migrated down")]
    NoReverseAction(String),
    #[error("migration {0} is recorded in the ledger but its file is gone; restore it before migrating down")]
    DefinitionMissing(String),
    #[error("another invocation holds the migration lock; run `ebbtide unlock` if it is stale")]
    LockHeld,
    #[error("unable to release the migration lock")]
    LockReleaseFailed,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Loader(#[from] LoaderError),
}
