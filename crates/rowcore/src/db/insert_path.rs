//! C9 InsertPath (spec §4.9): `execute_insert(entity, context)`.

use crate::{
    db::{fk_validator, introspector, lock_planner, log_scope::AtomicLogScope, ExecutionContext},
    error::ExecError,
    model::EntityKind,
};

/// 1. Resolve `T`. 2. Apply table constraints (mutates `entity` in place).
/// 3. Find the relations `entity` must satisfy. 4. Lock `T` for write, lock
/// related tables. 5. Validate FKs. 6. Open a log scope, insert into every
/// index, complete. 7. Release `T`'s write lock (related locks stay until
/// the transaction ends).
///
/// # Errors
/// - [`ExecError::ConstraintViolation`] from step 2 — no state change.
/// - [`ExecError::ForeignKeyViolation`] from step 5 — no state change.
/// - [`ExecError::UniqueConstraintViolation`] from step 6 — the log scope
///   rolls back whatever indexes had already accepted the insert.
#[tracing::instrument(skip(entity, ctx), fields(table = %E::TABLE))]
pub fn execute_insert<E: EntityKind>(entity: &mut E, ctx: &ExecutionContext) -> Result<(), ExecError> {
    entity.apply_constraints().inspect_err(|err| {
        tracing::debug!(%err, "insert rejected by table constraints");
    })?;

    let relations = introspector::find_relations(ctx.db, E::INDEXES, false, true);

    lock_planner::acquire_write(ctx, E::TABLE)?;
    lock_planner::lock_related(ctx, &relations, &[E::TABLE])?;

    fk_validator::validate_referred(ctx.db, &relations.referred, std::slice::from_ref(entity)).inspect_err(
        |err| tracing::debug!(%err, "insert rejected by a foreign key"),
    )?;

    let table = ctx.db.table::<E>()?;
    {
        let mut log = AtomicLogScope::new();
        let key = entity.key();
        {
            let mut guard = table.write().expect("table lock poisoned");
            guard.put_row(key.clone(), entity.clone());
        }
        log.write_row_insert(&table, key);

        let positions: Vec<usize> = (0..E::INDEXES.len()).collect();
        crate::db::index_maintainer::apply_inserts(&table, &positions, entity, &mut log)?;
        log.complete();
    }

    lock_planner::release_write(ctx, E::TABLE);
    Ok(())
}
