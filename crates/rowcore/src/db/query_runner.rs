//! C8 QueryRunner (spec §4.8): execute a read plan under read locks,
//! optionally cloning results into a stable, lock-free snapshot.

use crate::{
    db::{
        lock_planner, locator,
        locator::{Plan, ScalarPlan},
        ExecutionContext,
    },
    error::ExecError,
    model::{EntityKind, TableName},
};

/// Scalar overload: acquire read locks on every table the plan touches,
/// compute, release, return the value (spec §4.8 "*Scalar plan*").
///
/// # Errors
/// Propagates a lock-acquisition failure (`Timeout`/`Deadlock`).
pub fn run_scalar<E, R>(ctx: &ExecutionContext, plan: &impl ScalarPlan<E, R>, tables_to_lock: &[TableName]) -> Result<R, ExecError>
where
    E: EntityKind,
{
    for &table in tables_to_lock {
        lock_planner::acquire_read(ctx, table)?;
    }
    let table = ctx.db.table::<E>()?;
    let value = {
        let guard = table.read().expect("table lock poisoned");
        plan.compute(guard.rows())
    };
    for &table in tables_to_lock {
        lock_planner::release_read(ctx, table);
    }
    Ok(value)
}

/// Sequence overload: acquire read locks, drain the plan into a materialised
/// `Vec`, release locks, return the snapshot (spec §4.8 "*Sequence plan*").
/// Every caller gets clones here — entities are value-owned by their table,
/// so an owned, lock-free snapshot is the only shape a drained result can
/// take; the distinction spec §4.8 draws between the public overload and
/// the mutation paths' "internal variant" is which tables get locked
/// (`tables_to_lock`), not whether the rows are cloned.
///
/// `tables_to_lock` defaults to every table `TableLocator` finds for the
/// plan; mutation paths instead pass the join tables only, having already
/// taken a *write* lock on the base table themselves.
///
/// # Errors
/// Propagates a lock-acquisition failure (`Timeout`/`Deadlock`).
pub fn run_query<E: EntityKind>(
    ctx: &ExecutionContext,
    plan: &impl Plan<E>,
    tables_to_lock: &[TableName],
) -> Result<Vec<E>, ExecError> {
    materialise(ctx, plan, tables_to_lock)
}

/// Alias used by the mutation paths (spec §4.8's "internal variant"), kept
/// distinct from [`run_query`] so a reader can tell a mutation-path call
/// site from a read-only one at a glance.
pub(crate) fn query_for_mutation<E: EntityKind>(
    ctx: &ExecutionContext,
    plan: &impl Plan<E>,
    tables_to_lock: &[TableName],
) -> Result<Vec<E>, ExecError> {
    materialise(ctx, plan, tables_to_lock)
}

fn materialise<E: EntityKind>(
    ctx: &ExecutionContext,
    plan: &impl Plan<E>,
    tables_to_lock: &[TableName],
) -> Result<Vec<E>, ExecError> {
    for &table in tables_to_lock {
        lock_planner::acquire_read(ctx, table)?;
    }
    let table = ctx.db.table::<E>()?;
    let rows = {
        let guard = table.read().expect("table lock poisoned");
        let keys = plan.select(guard.rows());
        keys.into_iter()
            .filter_map(|key| guard.get_row(&key).cloned())
            .collect()
    };
    for &table in tables_to_lock {
        lock_planner::release_read(ctx, table);
    }
    Ok(rows)
}

/// `TableLocator::find_affected_tables` narrowed to "every table but the
/// base one", for the common case of locking a plan's join tables only.
#[must_use]
pub fn join_tables<E: EntityKind>(plan: &impl Plan<E>) -> Vec<TableName> {
    locator::find_affected_tables(plan)
        .into_iter()
        .filter(|&t| t != E::TABLE)
        .collect()
}
