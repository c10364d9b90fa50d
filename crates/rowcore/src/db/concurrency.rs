//! Responsibility: lock scheduling for tables, keyed by transaction (spec
//! §4.4/§5). Does not own: deciding *which* tables a command needs to lock or
//! in what order — that is `lock_planner`. Boundary: every acquire returns
//! `LockError::Timeout`/`LockError::Deadlock`, never blocks the caller.

use crate::{error::LockError, model::TableName};
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

/// A transaction identity, opaque to everything except `Database` (which
/// hands them out) and the concurrency manager (which keys its ledger by
/// them).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TransactionId(pub(crate) u64);

/// The three lock strengths the core ever requests (spec §4.4).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LockMode {
    /// "This transaction is reading this table."
    Shared,
    /// "This transaction is mutating this table's rows or indexes."
    Exclusive,
    /// "This table is structurally involved but not itself being read or
    /// written" — `acquire_related`'s weaker assertion. Compatible with any
    /// non-`Exclusive` mode from another transaction.
    Related,
}

/// The locking contract the core calls out to (spec's "out of scope:
/// the concurrency manager's lock scheduling internals"). A command only
/// ever sees this trait; how contention, queuing or deadlock detection are
/// implemented is the concurrency manager's business.
pub trait ConcurrencyManager: Send + Sync {
    fn acquire_read(&self, txn: TransactionId, table: TableName) -> Result<(), LockError>;
    fn release_read(&self, txn: TransactionId, table: TableName);
    fn acquire_write(&self, txn: TransactionId, table: TableName) -> Result<(), LockError>;
    fn release_write(&self, txn: TransactionId, table: TableName);
    fn acquire_related(&self, txn: TransactionId, table: TableName) -> Result<(), LockError>;

    /// Release every lock a transaction holds, in any table. Called once, at
    /// transaction commit or abort (spec §5: "all locks are released at
    /// transaction commit or abort").
    fn release_all(&self, txn: TransactionId);
}

/// Default reader/writer-set lock manager, generalised from a two-mode
/// (shared/exclusive) table lock to this core's three modes. This is a
/// reference implementation, not a scheduler: a conflicting request fails
/// immediately with `LockError::Timeout` rather than queuing and blocking —
/// a real deployment plugs in whatever its surrounding transaction runtime
/// already provides.
#[derive(Debug, Default)]
pub struct TableLockManager {
    state: Mutex<LockState>,
}

#[derive(Debug, Default)]
struct LockState {
    holders: HashMap<TableName, Vec<Holder>>,
    held_by_txn: HashMap<TransactionId, HashSet<TableName>>,
}

#[derive(Debug, Clone, Copy)]
struct Holder {
    txn: TransactionId,
    mode: LockMode,
}

impl TableLockManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self, txn: TransactionId, table: TableName, mode: LockMode) -> Result<(), LockError> {
        let mut state = self.state.lock().expect("lock manager mutex poisoned");

        let holders = state.holders.entry(table).or_default();
        for holder in holders.iter() {
            if holder.txn == txn {
                continue;
            }
            let conflicts = matches!(holder.mode, LockMode::Exclusive)
                || matches!(mode, LockMode::Exclusive);
            if conflicts {
                return Err(LockError::Timeout);
            }
        }

        let mut strongest = mode;
        holders.retain(|holder| {
            if holder.txn == txn {
                if matches!(holder.mode, LockMode::Exclusive) {
                    strongest = LockMode::Exclusive;
                }
                false
            } else {
                true
            }
        });
        holders.push(Holder { txn, mode: strongest });
        state.held_by_txn.entry(txn).or_default().insert(table);
        Ok(())
    }

    fn release(&self, txn: TransactionId, table: TableName) {
        let mut state = self.state.lock().expect("lock manager mutex poisoned");
        if let Some(holders) = state.holders.get_mut(&table) {
            holders.retain(|holder| holder.txn != txn);
            if holders.is_empty() {
                state.holders.remove(&table);
            }
        }
        if let Some(tables) = state.held_by_txn.get_mut(&txn) {
            tables.remove(&table);
        }
    }
}

impl ConcurrencyManager for TableLockManager {
    fn acquire_read(&self, txn: TransactionId, table: TableName) -> Result<(), LockError> {
        self.acquire(txn, table, LockMode::Shared)
    }

    fn release_read(&self, txn: TransactionId, table: TableName) {
        self.release(txn, table);
    }

    fn acquire_write(&self, txn: TransactionId, table: TableName) -> Result<(), LockError> {
        self.acquire(txn, table, LockMode::Exclusive)
    }

    fn release_write(&self, txn: TransactionId, table: TableName) {
        self.release(txn, table);
    }

    fn acquire_related(&self, txn: TransactionId, table: TableName) -> Result<(), LockError> {
        self.acquire(txn, table, LockMode::Related)
    }

    fn release_all(&self, txn: TransactionId) {
        let mut state = self.state.lock().expect("lock manager mutex poisoned");
        let Some(tables) = state.held_by_txn.remove(&txn) else {
            return;
        };
        for table in tables {
            if let Some(holders) = state.holders.get_mut(&table) {
                holders.retain(|holder| holder.txn != txn);
                if holders.is_empty() {
                    state.holders.remove(&table);
                }
            }
        }
    }
}
