//! C10 DeletePath (spec §4.10): `execute_delete(plan, context)`.
//!
//! The internal delete primitive (spec §4.10 step 7) recurses across entity
//! types when a cascade fires, so it cannot be one generic function called
//! directly — `RelationModel::cascaded_delete` closes over the foreign
//! type's own `delete_by_keys_in_scope` call and hands the executor a
//! type-erased callback (design notes §9's "small capability object").

use crate::{
    db::{
        cascade, fk_validator, index_maintainer, introspector,
        locator::Plan,
        lock_planner,
        log_scope::AtomicLogScope,
        query_runner, Database, ExecutionContext,
    },
    error::ExecError,
    model::{EntityKind, RelationGroup, RelationModel, TableName},
    value::Value,
};

/// 1. Resolve `T`; collect its cascaded tables. 2. Gather the referring
/// relations over `T` and every cascaded table, for locking. 3. Lock `T` for
/// write. 4. Materialise the victims under the plan's own join locks. 5. Lock
/// every cascaded table for write, then lock whatever else the relations
/// touch. 6. Open one log scope spanning the whole cascade, run the internal
/// delete primitive, complete. 7. Return the victims.
///
/// Step 3's write lock on `T` is acquired *before* step 4 materialises the
/// victims, and the cascaded tables' write locks are acquired *after* — the
/// reverse of the usual "lock everything, then read" order. This is
/// deliberate and load-bearing for callers observing the original system's
/// locking behaviour (design notes §9's second open question): `T`'s own
/// write lock is what makes the materialising read in step 4 safe to run
/// without its own read lock (a write lock subsumes a read lock for `T`),
/// and only the cascaded/related tables need a fresh acquisition afterward.
///
/// # Errors
/// - Lock acquisition failures (`Timeout`/`Deadlock`) at any `acquire_*`.
/// - [`ExecError::ForeignKeyViolation`] if a referrer without a cascade
///   relation still points at a victim — the log scope unwinds every index
///   and row change made across the whole cascade.
#[tracing::instrument(skip(plan, ctx), fields(table = %E::TABLE))]
pub fn execute_delete<E: EntityKind>(
    plan: &impl Plan<E>,
    ctx: &ExecutionContext,
) -> Result<Vec<E>, ExecError> {
    let cascaded = cascade::get_cascaded_tables(ctx.db, E::TABLE, ctx.db.config().max_cascade_depth);

    let mut all_tables: Vec<TableName> = Vec::with_capacity(cascaded.len() + 1);
    all_tables.push(E::TABLE);
    all_tables.extend(cascaded.iter().copied());

    let relations = referring_relations_over(ctx.db, &all_tables);

    lock_planner::acquire_write(ctx, E::TABLE)?;

    let join_tables = query_runner::join_tables(plan);
    let victims = query_runner::query_for_mutation(ctx, plan, &join_tables)?;

    for &table in &cascaded {
        lock_planner::acquire_write(ctx, table)?;
    }
    lock_planner::lock_related(ctx, &relations, &all_tables)?;

    {
        let mut log = AtomicLogScope::new();
        delete_victims_in_scope::<E>(ctx.db, &mut log, &victims).inspect_err(|err| {
            tracing::debug!(%err, victims = victims.len(), "delete rolled back");
        })?;
        log.complete();
    }

    Ok(victims)
}

/// Union of `find_relations(.., referring=true, referred=false)` over every
/// table in `tables`, deduplicated by relation name — spec §4.10 step 2's
/// "`allTables.flat_indexes`".
fn referring_relations_over(db: &Database, tables: &[TableName]) -> RelationGroup {
    let mut group = RelationGroup::default();
    for &table in tables {
        let indexes = db.indexes_of(table);
        let found = introspector::find_relations(db, indexes, true, false);
        for relation in found.referring {
            if !group.referring.iter().any(|r: &RelationModel| r.name == relation.name) {
                group.referring.push(relation);
            }
        }
    }
    group
}

/// Internal delete primitive (spec §4.10 step 7): deletes `victims` from
/// every index and the row store of `E`'s table, recurses into any
/// cascaded referrer, then validates that no non-cascade referrer still
/// points at a removed row — all within the caller's already-open `log`.
pub(crate) fn delete_victims_in_scope<E: EntityKind>(
    db: &Database,
    log: &mut AtomicLogScope,
    victims: &[E],
) -> Result<(), ExecError> {
    if victims.is_empty() {
        return Ok(());
    }

    let relations = introspector::find_relations(db, E::INDEXES, true, false);
    let mut referring_entities = find_referring_entities(db, victims, &relations.referring)?;

    let table = db.table::<E>()?;
    let index_positions: Vec<usize> = (0..E::INDEXES.len()).collect();
    for victim in victims {
        index_maintainer::apply_deletes(&table, &index_positions, victim, log);
    }
    for victim in victims {
        let key = victim.key();
        {
            let mut guard = table.write().expect("table lock poisoned");
            guard.remove_row(&key);
        }
        log.write_row_delete(&table, key, victim.clone());
    }

    for (relation, bucket) in &mut referring_entities {
        if relation.cascaded_deletion && !bucket.is_empty() {
            relation.cascaded_delete(db, log, bucket.as_slice())?;
            bucket.clear();
        }
    }

    fk_validator::validate_referring(db, &referring_entities)
}

/// Re-fetches rows by key and runs them through `delete_victims_in_scope`.
/// This is the recursion target `RelationModel::cascaded_delete` closes
/// over: a cascade only knows the *foreign keys* currently pointing at a
/// removed primary (from `find_referring`), not the live entities.
pub(crate) fn delete_by_keys_in_scope<E: EntityKind>(
    db: &Database,
    log: &mut AtomicLogScope,
    keys: &[E::Key],
) -> Result<usize, ExecError> {
    let table = db.table::<E>()?;
    let victims: Vec<E> = {
        let guard = table.read().expect("table lock poisoned");
        keys.iter().filter_map(|key| guard.get_row(key).cloned()).collect()
    };
    let count = victims.len();
    delete_victims_in_scope::<E>(db, log, &victims)?;
    Ok(count)
}

/// `FindReferringEntities(victims, referring)` (spec §4.10 step 7b): for
/// each referring relation, the foreign table's primary keys currently
/// pointing at any of `victims`.
pub(crate) fn find_referring_entities<E: EntityKind>(
    db: &Database,
    victims: &[E],
    referring: &[RelationModel],
) -> Result<Vec<(RelationModel, Vec<Value>)>, ExecError> {
    let mut out = Vec::with_capacity(referring.len());
    for relation in referring {
        let mut bucket = Vec::new();
        for victim in victims {
            let key_value: Value = victim.key().into();
            bucket.extend(relation.find_referring(db, &key_value)?);
        }
        out.push((*relation, bucket));
    }
    Ok(out)
}
