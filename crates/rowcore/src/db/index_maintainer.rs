//! C6 IndexMaintainer (spec §4.6): for an entity, apply insert/delete to
//! every affected index of its table, logging each step's inverse.

use crate::{
    db::log_scope::AtomicLogScope,
    error::ExecError,
    model::{EntityKind, Table},
};
use std::sync::{Arc, RwLock};

/// `apply_inserts(indexes, entity, log)`: for each index position in
/// `index_positions`, insert then log. The log record is written *after*
/// the successful insert — spec §4.6: "log record is written after the
/// successful insert so that replay always matches a real state". On the
/// first failure the already-logged inserts for this entity are left for
/// the enclosing scope's rollback to undo; this function itself does not
/// unwind them.
///
/// # Errors
/// Returns [`ExecError::UniqueConstraintViolation`] from the first index
/// that rejects `entity`.
pub fn apply_inserts<E: EntityKind>(
    table: &Arc<RwLock<Table<E>>>,
    index_positions: &[usize],
    entity: &E,
    log: &mut AtomicLogScope,
) -> Result<(), ExecError> {
    for &pos in index_positions {
        {
            let mut guard = table.write().expect("table lock poisoned");
            guard.indexes_mut()[pos].insert(entity)?;
        }
        log.write_index_insert(table, pos, entity.clone());
    }
    Ok(())
}

/// `apply_deletes(indexes, entity, log)`: symmetric to `apply_inserts`.
/// `Index::delete` cannot fail, so every position is processed.
pub fn apply_deletes<E: EntityKind>(
    table: &Arc<RwLock<Table<E>>>,
    index_positions: &[usize],
    entity: &E,
    log: &mut AtomicLogScope,
) {
    for &pos in index_positions {
        {
            let mut guard = table.write().expect("table lock poisoned");
            guard.indexes_mut()[pos].delete(entity);
        }
        log.write_index_delete(table, pos, entity.clone());
    }
}
