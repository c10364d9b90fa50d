//! Command execution core for an in-memory relational store: tables of
//! strongly-typed records, each with one or more indexes, related by
//! foreign-key constraints, with transactional multi-statement semantics.
//!
//! This crate covers the *command execution core* only — the subsystem
//! that takes a prepared query/mutation plan, acquires the right locks in
//! the right order, validates constraints, keeps every index consistent
//! with the base data, and arranges that a failure at any point leaves the
//! store in its pre-command state. Query planning and compilation, the
//! index data structures' own storage layout, the concurrency manager's
//! scheduling internals, durable log replay, and the public database
//! facade all live outside this crate; `db` ships a minimal reference
//! implementation of the pieces it needs to be buildable and testable on
//! its own (see [`db::TableLockManager`], [`db::Database`]).

pub mod db;
pub mod error;
pub mod model;
pub mod value;

/// Re-exports for the common path: build a schema, begin a transaction,
/// run the four mutation/query entry points.
pub mod prelude {
    pub use crate::db::{
        delete_path::execute_delete, insert_path::execute_insert, query_runner::run_query,
        update_path::{execute_updater, Updater},
        Database, ExecutionContext, ExecutorConfig, Transaction,
    };
    pub use crate::error::ExecError;
    pub use crate::model::{Cloner, EntityKind, IndexModel, RelationModel, TableName};
    pub use crate::value::Value;
}
