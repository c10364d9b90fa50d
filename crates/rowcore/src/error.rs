//! Responsibility: the command-execution error taxonomy (spec §7).
//! Does not own: lock-scheduling internals (the concurrency manager raises
//! `Timeout`/`Deadlock`; this module only carries them).
//! Boundary: every `db::*_path` function returns `Result<_, ExecError>`.

use crate::model::{RelationName, TableName};
use std::fmt;

/// Error raised by a command-execution path.
///
/// Mirrors the source system's error taxonomy one-for-one: a table
/// constraint rejects an entity before any mutation is attempted
/// (`ConstraintViolation`), a relation rejects it after the mutation has
/// been tentatively applied and the enclosing log scope has unwound it
/// (`ForeignKeyViolation`), an index rejects an insert under its current
/// key (`UniqueConstraintViolation`), the concurrency manager could not
/// grant a lock (`Timeout`/`Deadlock`), or caller-supplied plan/updater code
/// threw (`UserError`).
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("constraint violation on table {table}: {message}")]
    ConstraintViolation { table: TableName, message: String },

    #[error("foreign key violation: relation {relation} rejected key {key}")]
    ForeignKeyViolation { relation: RelationName, key: String },

    #[error("unique constraint violation on index {index} of table {table}: key {key}")]
    UniqueConstraintViolation {
        table: TableName,
        index: &'static str,
        key: String,
    },

    #[error("lock acquisition timed out on table {table}")]
    Timeout { table: TableName },

    #[error("deadlock detected while locking table {table}")]
    Deadlock { table: TableName },

    #[error("user error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A schema/registration mistake (unknown table, index, or relation).
    /// Not part of spec §7's command-execution taxonomy; these indicate a
    /// caller bug at schema-build time, not a command-time failure.
    #[error("schema error: {0}")]
    Schema(String),
}

impl ExecError {
    #[must_use]
    pub fn user(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(err))
    }

    /// Wrap an already-boxed error, for collaborators (an `Updater::apply`
    /// or a `Plan::execute`) that return `Box<dyn Error + Send + Sync>`
    /// directly rather than a concrete error type.
    #[must_use]
    pub fn user_boxed(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::UserError(err)
    }
}

/// From the concurrency manager's own error enum (spec §4.4/§5): these two
/// variants are the only ones a lock acquisition may raise.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LockError {
    Timeout,
    Deadlock,
}

impl LockError {
    #[must_use]
    pub(crate) fn into_exec_error(self, table: TableName) -> ExecError {
        match self {
            Self::Timeout => ExecError::Timeout { table },
            Self::Deadlock => ExecError::Deadlock { table },
        }
    }
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Deadlock => write!(f, "deadlock"),
        }
    }
}
