//! Responsibility: the per-command undo buffer (spec §3/§4.5 "AtomicLogScope").
//! Does not own: deciding what to log — that belongs to whichever component
//! performs the mutation (`index_maintainer`, the update path). Boundary: a
//! scope that is dropped without `complete()` rolls back; one that calls
//! `complete()` discards silently on drop.

use crate::model::{EntityKind, Index, Table};
use std::sync::{Arc, RwLock};

/// A scoped undo buffer spanning one command (spec §4.5). Type-erased: a
/// cascade delete walks through several concrete entity types in one atomic
/// boundary (spec §4.10 step 6, "the *same* log scope"), so the buffer
/// cannot be generic over a single `E` — each inverse instead closes over
/// whatever `Arc<RwLock<Table<E>>>` it needs, which is cheap to clone and
/// carries no borrow of the scope itself.
///
/// Closing without `complete()` replays inverses in LIFO order (`Drop`);
/// closing after `complete()` just drops the (now-unused) buffer. Secondary
/// failures during rollback are swallowed — spec §9 calls this out
/// explicitly ("best-effort; those are logged but not re-raised, to
/// preserve the original error").
#[must_use = "an AtomicLogScope rolls back on drop unless complete() is called"]
pub struct AtomicLogScope {
    inverses: Vec<Box<dyn FnOnce() + Send>>,
    completed: bool,
}

impl AtomicLogScope {
    pub fn new() -> Self {
        Self {
            inverses: Vec::new(),
            completed: false,
        }
    }

    fn push(&mut self, inverse: impl FnOnce() + Send + 'static) {
        self.inverses.push(Box::new(inverse));
    }

    /// Record "undo: delete `entity` from index `pos` of `table`" — the
    /// inverse of a just-applied `IndexMaintainer::apply_inserts` step.
    pub fn write_index_insert<E: EntityKind>(
        &mut self,
        table: &Arc<RwLock<Table<E>>>,
        index_pos: usize,
        entity: E,
    ) {
        let table = Arc::clone(table);
        self.push(move || {
            let mut guard = table.write().expect("table lock poisoned");
            guard.indexes_mut()[index_pos].delete(&entity);
        });
    }

    /// Record "undo: insert `entity` into index `pos` of `table`" — the
    /// inverse of a just-applied `IndexMaintainer::apply_deletes` step.
    pub fn write_index_delete<E: EntityKind>(
        &mut self,
        table: &Arc<RwLock<Table<E>>>,
        index_pos: usize,
        entity: E,
    ) {
        let table = Arc::clone(table);
        self.push(move || {
            let mut guard = table.write().expect("table lock poisoned");
            if guard.indexes_mut()[index_pos].insert(&entity).is_err() {
                tracing::warn!("log scope rollback: re-insert into index {index_pos} failed");
            }
        });
    }

    /// Record "undo: copy `snapshot` back over the live row at `key`" — the
    /// inverse of the update path's field mutation (spec §4.5
    /// `write_entity_update`).
    pub fn write_entity_update<E: EntityKind>(
        &mut self,
        table: &Arc<RwLock<Table<E>>>,
        key: E::Key,
        snapshot: E,
    ) {
        let table = Arc::clone(table);
        self.push(move || {
            let mut guard = table.write().expect("table lock poisoned");
            if let Some(live) = guard.row_mut(&key) {
                E::clone_into(&snapshot, live);
            }
        });
    }

    /// Record "undo: remove the row `entity` was just stored under" — the
    /// row-store half of an insert, alongside whatever `write_index_insert`
    /// calls cover the index side. Used only by the insert path, which adds
    /// a row outright; the update path's re-key never adds or removes a
    /// row, only moves index entries and mutates fields in place.
    pub fn write_row_insert<E: EntityKind>(&mut self, table: &Arc<RwLock<Table<E>>>, key: E::Key) {
        let table = Arc::clone(table);
        self.push(move || {
            let mut guard = table.write().expect("table lock poisoned");
            guard.remove_row(&key);
        });
    }

    /// Record "undo: put `entity` back under `key`" — the row-store half of
    /// a delete. Used only by the delete path.
    pub fn write_row_delete<E: EntityKind>(&mut self, table: &Arc<RwLock<Table<E>>>, key: E::Key, entity: E) {
        let table = Arc::clone(table);
        self.push(move || {
            let mut guard = table.write().expect("table lock poisoned");
            guard.put_row(key, entity);
        });
    }

    /// Record "undo: move the row back from `new_key` to `old_key`,
    /// restoring `snapshot`" — the row-store half of an update that changed
    /// the entity's primary key. Distinct from `write_entity_update` because
    /// that one assumes the row stays under the same key and only its
    /// fields change in place; a primary-key update instead moves the row
    /// store entry itself.
    pub fn write_entity_rekey<E: EntityKind>(
        &mut self,
        table: &Arc<RwLock<Table<E>>>,
        old_key: E::Key,
        new_key: E::Key,
        snapshot: E,
    ) {
        let table = Arc::clone(table);
        self.push(move || {
            let mut guard = table.write().expect("table lock poisoned");
            guard.remove_row(&new_key);
            guard.put_row(old_key, snapshot);
        });
    }

    /// Mark the scope successful; its buffer is discarded on drop instead of
    /// replayed.
    pub fn complete(&mut self) {
        self.completed = true;
    }
}

impl Default for AtomicLogScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AtomicLogScope {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        if !self.inverses.is_empty() {
            tracing::debug!(ops = self.inverses.len(), "rolling back atomic log scope");
        }
        for inverse in self.inverses.drain(..).rev() {
            inverse();
        }
    }
}
