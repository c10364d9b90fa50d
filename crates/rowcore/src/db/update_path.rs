//! C11 UpdatePath (spec §4.11): `execute_updater(plan, updater, context)`.
//!
//! The largest of the three mutation paths because an update can break a
//! foreign key from either side: the updated row's own FK field might now
//! dangle (the referred side), or — if the update touches a primary key —
//! rows that used to point at it might now be orphaned (the referring
//! side). Both get validated, against two different pre/post snapshots.

use crate::{
    db::{
        delete_path, fk_validator, index_maintainer, introspector,
        locator::Plan,
        lock_planner,
        log_scope::AtomicLogScope,
        query_runner, ExecutionContext,
    },
    error::ExecError,
    model::EntityKind,
};

/// The set of fields an update changes, plus the function that computes the
/// new value of an entity from its old one (spec §6's `Updater<T>`
/// collaborator). `apply` may return the same instance with fields mutated
/// or a brand new one — the update path only looks at its output, never at
/// whether the input was reused.
///
/// # Errors
/// `apply` returns an arbitrary boxed error when the updater itself rejects
/// an entity (spec §7's *UserError*); the update path wraps it in
/// [`ExecError::user_boxed`] and unwinds exactly like a constraint
/// violation.
pub trait Updater<E: EntityKind> {
    /// Field names this update may change. Used to decide which indexes
    /// need re-keying (spec §4.11 step 2) — an update is never assumed to
    /// touch every index of its table.
    fn changes(&self) -> &[&'static str];

    fn apply(&self, entity: E) -> Result<E, Box<dyn std::error::Error + Send + Sync>>;
}

/// 1. Resolve `T`. 2. Compute the indexes this update can affect. 3. Find
/// the relations through those indexes, both sides. 4. Lock `T` for write,
/// materialise the victims, lock related tables. 5. Capture the referrers
/// pointing at each victim *before* mutation. 6. Delete every victim from
/// every affected index. 7. Mutate each victim, logging a snapshot for
/// rollback. 8. Re-insert every victim into every affected index under its
/// new key. 9. Validate both FK directions. 10. Complete the scope, release
/// `T`'s write lock.
///
/// # Errors
/// - [`ExecError::ConstraintViolation`] / [`ExecError::UserError`] from step
///   7 — the scope unwinds the deletes already applied in step 6.
/// - [`ExecError::UniqueConstraintViolation`] from step 8 — the scope
///   unwinds the re-inserts and the field mutation.
/// - [`ExecError::ForeignKeyViolation`] from step 9 — the scope unwinds the
///   whole command; every victim is restored to its pre-update state.
#[tracing::instrument(skip(plan, updater, ctx), fields(table = %E::TABLE))]
pub fn execute_updater<E: EntityKind>(
    plan: &impl Plan<E>,
    updater: &impl Updater<E>,
    ctx: &ExecutionContext,
) -> Result<Vec<E>, ExecError> {
    let affected_positions: Vec<usize> = E::INDEXES
        .iter()
        .enumerate()
        .filter(|(_, index)| index.fields.iter().any(|field| updater.changes().contains(field)))
        .map(|(pos, _)| pos)
        .collect();
    let affected_indexes: Vec<_> = affected_positions.iter().map(|&pos| E::INDEXES[pos]).collect();

    let relations = introspector::find_relations(ctx.db, &affected_indexes, true, true);

    lock_planner::acquire_write(ctx, E::TABLE)?;

    let join_tables = query_runner::join_tables(plan);
    let victims = query_runner::query_for_mutation(ctx, plan, &join_tables)?;

    lock_planner::lock_related(ctx, &relations, &[E::TABLE])?;

    let referring_entities = delete_path::find_referring_entities(ctx.db, &victims, &relations.referring)?;

    let table = ctx.db.table::<E>()?;
    let updated = {
        let mut log = AtomicLogScope::new();

        for victim in &victims {
            index_maintainer::apply_deletes(&table, &affected_positions, victim, &mut log);
        }

        let mut updated = Vec::with_capacity(victims.len());
        for victim in victims {
            let old_key = victim.key();
            let backup = victim.clone();

            let mut new = updater
                .apply(victim)
                .map_err(ExecError::user_boxed)
                .inspect_err(|err| tracing::debug!(%err, "update rejected by the updater"))?;
            new.apply_constraints()?;
            let new_key = new.key();

            {
                let mut guard = table.write().expect("table lock poisoned");
                if new_key == old_key {
                    if let Some(live) = guard.row_mut(&old_key) {
                        E::clone_into(&new, live);
                    }
                } else {
                    guard.remove_row(&old_key);
                    guard.put_row(new_key.clone(), new.clone());
                }
            }
            if new_key == old_key {
                log.write_entity_update(&table, old_key, backup);
            } else {
                log.write_entity_rekey(&table, old_key, new_key, backup);
            }

            updated.push(new);
        }

        for victim in &updated {
            index_maintainer::apply_inserts(&table, &affected_positions, victim, &mut log)?;
        }

        fk_validator::validate_referred(ctx.db, &relations.referred, &updated)
            .inspect_err(|err| tracing::debug!(%err, "update broke its own foreign key"))?;
        fk_validator::validate_referring(ctx.db, &referring_entities)
            .inspect_err(|err| tracing::debug!(%err, "update orphaned an existing referrer"))?;

        log.complete();
        updated
    };

    lock_planner::release_write(ctx, E::TABLE);
    Ok(updated)
}
