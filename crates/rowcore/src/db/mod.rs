//! Command execution core (spec §1-§2): the subsystem that takes a prepared
//! plan and an execution context, locks the right tables in the right
//! order, validates constraints, keeps every index consistent with the base
//! data, and undoes a failed mutation's partial effect.
//!
//! Submodules map onto the spec's C1-C11 components one-to-one; `mod.rs`
//! owns the schema registry (`Database`) and the two handles every
//! component threads through (`ExecutionContext`, `Transaction`).

pub mod cascade;
pub mod concurrency;
pub mod fk_validator;
pub mod index_maintainer;
pub mod introspector;
pub mod lock_planner;
pub mod locator;
pub mod log_scope;
pub mod query_runner;

pub mod delete_path;
pub mod insert_path;
pub mod update_path;

pub use concurrency::{ConcurrencyManager, LockMode, TableLockManager, TransactionId};

use crate::{
    error::ExecError,
    model::{EntityKind, RelationModel, Table, TableName},
};
use std::{
    any::Any,
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, RwLock,
    },
};

/// Tunables the executor paths consult; not part of any one component, kept
/// here the way the source system keeps its engine-wide limits alongside
/// the schema registry.
#[derive(Clone, Copy, Debug)]
pub struct ExecutorConfig {
    /// Upper bound on the number of fields a single index may project.
    /// `register_table` rejects an `IndexModel` that exceeds it.
    pub max_index_fields: usize,
    /// Upper bound on `CascadeCollector`'s transitive closure, guarding
    /// against a cyclic or unbounded schema graph despite the visited-set
    /// memoisation (spec §4.3, §9 "cyclic schemas").
    pub max_cascade_depth: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_index_fields: 4,
            max_cascade_depth: 64,
        }
    }
}

struct TableEntry {
    indexes: &'static [crate::model::IndexModel],
    storage: Arc<dyn Any + Send + Sync>,
}

/// The schema registry: every table, every relation, the concurrency
/// manager, and the tunable limits. Built once via `register_table` /
/// `register_relation` before any transaction begins, then shared behind
/// `Arc` the way the source system's `Database` handle is shared.
pub struct Database {
    tables: HashMap<TableName, TableEntry>,
    relations: Vec<RelationModel>,
    concurrency: Arc<dyn ConcurrencyManager>,
    config: ExecutorConfig,
    next_txn: AtomicU64,
}

impl Database {
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        Self::with_concurrency(config, Arc::new(TableLockManager::new()))
    }

    #[must_use]
    pub fn with_concurrency(config: ExecutorConfig, concurrency: Arc<dyn ConcurrencyManager>) -> Self {
        Self {
            tables: HashMap::new(),
            relations: Vec::new(),
            concurrency,
            config,
            next_txn: AtomicU64::new(1),
        }
    }

    /// Register a table for entity type `E`. Idempotent per type; a second
    /// call for the same `E::TABLE` replaces the (still-empty) storage,
    /// which is only safe before any transaction has touched it — schema
    /// registration happens once, up front.
    ///
    /// # Errors
    /// Returns [`ExecError::Schema`] if any of `E::INDEXES` projects more
    /// fields than `self.config.max_index_fields` allows.
    pub fn register_table<E: EntityKind>(&mut self) -> Result<(), ExecError> {
        for index in E::INDEXES {
            if index.fields.len() > self.config.max_index_fields {
                return Err(ExecError::Schema(format!(
                    "index {} on table {} has {} fields; maximum is {}",
                    index.name,
                    E::TABLE,
                    index.fields.len(),
                    self.config.max_index_fields
                )));
            }
        }

        self.tables.insert(
            E::TABLE,
            TableEntry {
                indexes: E::INDEXES,
                storage: Arc::new(RwLock::new(Table::<E>::new())),
            },
        );
        Ok(())
    }

    pub fn register_relation(&mut self, relation: RelationModel) {
        self.relations.push(relation);
    }

    /// Borrow the live table for `E`.
    ///
    /// # Errors
    /// Returns [`ExecError::Schema`] if `E` was never registered.
    pub fn table<E: EntityKind>(&self) -> Result<Arc<RwLock<Table<E>>>, ExecError> {
        let entry = self
            .tables
            .get(&E::TABLE)
            .ok_or_else(|| ExecError::Schema(format!("table {} is not registered", E::TABLE)))?;
        Arc::clone(&entry.storage)
            .downcast::<RwLock<Table<E>>>()
            .map_err(|_| ExecError::Schema(format!("table {} registered under a different type", E::TABLE)))
    }

    /// Every index declared over `table`, or an empty slice if it is
    /// unregistered (callers that reach this through `E::INDEXES` already
    /// know the table exists; this path is for the type-erased callers in
    /// `introspector`/`cascade`).
    #[must_use]
    pub fn indexes_of(&self, table: TableName) -> &'static [crate::model::IndexModel] {
        self.tables.get(&table).map_or(&[], |entry| entry.indexes)
    }

    #[must_use]
    pub fn relations(&self) -> &[RelationModel] {
        &self.relations
    }

    #[must_use]
    pub fn concurrency(&self) -> &Arc<dyn ConcurrencyManager> {
        &self.concurrency
    }

    #[must_use]
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Begin a new transaction against this database.
    #[must_use]
    pub fn begin(&self) -> Transaction<'_> {
        let id = TransactionId(self.next_txn.fetch_add(1, Ordering::Relaxed));
        Transaction {
            db: self,
            id,
            cancel: CancellationSignal::new(),
        }
    }
}

/// A transaction-scoped cancellation flag (spec §3's `ExecutionContext`
/// "cancellation signal"). The core never polls it mid-scope (spec §5); a
/// plan's own `execute` observes it between commands.
#[derive(Clone)]
pub struct CancellationSignal(Arc<AtomicBool>);

impl CancellationSignal {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A long-lived handle spanning multiple commands (spec §3's
/// "ExecutionContext... transactions are long-lived across multiple
/// commands"). Dropping it without calling `commit`/`abort` still releases
/// its locks — `Drop` calls `release_all` as the fallback path, same as an
/// explicit `abort` would.
pub struct Transaction<'db> {
    db: &'db Database,
    id: TransactionId,
    cancel: CancellationSignal,
}

impl<'db> Transaction<'db> {
    #[must_use]
    pub const fn id(&self) -> TransactionId {
        self.id
    }

    /// Request cancellation of this transaction's remaining commands.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The call-scoped bundle every command takes: database handle plus the
    /// active transaction.
    #[must_use]
    pub fn context(&self) -> ExecutionContext<'db> {
        ExecutionContext {
            db: self.db,
            txn: self.id,
            cancel: self.cancel.clone(),
        }
    }

    /// Release every lock this transaction holds. Commands already applied
    /// stay applied; only their locks are released.
    pub fn commit(self) {
        self.db.concurrency().release_all(self.id);
    }

    /// Identical to `commit` — this core has no undo *across* commands, only
    /// within one (`AtomicLogScope`); "abort" here means "stop holding
    /// locks", matching spec §5's "released at transaction commit or
    /// abort".
    pub fn abort(self) {
        self.db.concurrency().release_all(self.id);
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.db.concurrency().release_all(self.id);
    }
}

/// The call-scoped bundle every command receives (spec §3's
/// `ExecutionContext`): a database handle, the active transaction, plus the
/// transaction's cancellation signal.
#[derive(Clone)]
pub struct ExecutionContext<'db> {
    pub db: &'db Database,
    pub txn: TransactionId,
    pub cancel: CancellationSignal,
}
