//! C4 LockPlanner (spec §4.4): orders and requests read/write/related locks
//! from the concurrency manager. A thin wrapper — every operation delegates
//! straight through, passing `context.txn` — whose value is in collecting
//! the one non-trivial rule, `lock_related`, in one place.

use crate::{
    db::{ConcurrencyManager, ExecutionContext},
    error::ExecError,
    model::{RelationGroup, TableName},
};
use std::collections::BTreeSet;

pub fn acquire_read(ctx: &ExecutionContext, table: TableName) -> Result<(), ExecError> {
    ctx.db
        .concurrency()
        .acquire_read(ctx.txn, table)
        .map_err(|e| e.into_exec_error(table))
}

pub fn release_read(ctx: &ExecutionContext, table: TableName) {
    ctx.db.concurrency().release_read(ctx.txn, table);
}

pub fn acquire_write(ctx: &ExecutionContext, table: TableName) -> Result<(), ExecError> {
    ctx.db
        .concurrency()
        .acquire_write(ctx.txn, table)
        .map_err(|e| e.into_exec_error(table))
}

pub fn release_write(ctx: &ExecutionContext, table: TableName) {
    ctx.db.concurrency().release_write(ctx.txn, table);
}

pub fn acquire_related(ctx: &ExecutionContext, table: TableName) -> Result<(), ExecError> {
    ctx.db
        .concurrency()
        .acquire_related(ctx.txn, table)
        .map_err(|e| e.into_exec_error(table))
}

/// `lock_related(relations, except) = ∪ referring.foreign_table ∪
/// referred.primary_table, minus except, deduplicated, then acquire_related
/// over each` (spec §4.4). Locks alphabetically by `TableName` rather than
/// `RelationGroup`'s own discovery order — a deliberate substitution for
/// spec §5's "deterministic order" guarantee: `BTreeSet` gives dedup and a
/// total order in one step, and any fixed total order over the same table
/// set avoids the same lock-ordering deadlocks discovery order would.
pub fn lock_related(
    ctx: &ExecutionContext,
    group: &RelationGroup,
    except: &[TableName],
) -> Result<(), ExecError> {
    let mut tables: BTreeSet<TableName> = group.referring.iter().map(|r| r.foreign_table).collect();
    tables.extend(group.referred.iter().map(|r| r.primary_table));
    for table in except {
        tables.remove(table);
    }
    for table in tables {
        acquire_related(ctx, table)?;
    }
    Ok(())
}
