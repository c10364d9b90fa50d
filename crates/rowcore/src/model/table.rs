use crate::model::{EntityKind, Index};
use std::collections::BTreeMap;

///
/// Table
///
/// An ordered collection of entities of one type plus every index declared
/// over that type (spec §3's "Table"). Created once at schema build time
/// and lives for the process; the core never constructs one on its own —
/// callers register it via `Database::register_table`.
///
#[derive(Debug)]
pub struct Table<E: EntityKind> {
    rows: BTreeMap<E::Key, E>,
    indexes: Vec<Index<E>>,
}

impl<E: EntityKind> Table<E> {
    #[must_use]
    pub fn new() -> Self {
        let indexes = E::INDEXES.iter().copied().map(Index::new).collect();
        Self {
            rows: BTreeMap::new(),
            indexes,
        }
    }

    #[must_use]
    pub const fn rows(&self) -> &BTreeMap<E::Key, E> {
        &self.rows
    }

    #[must_use]
    pub fn indexes(&self) -> &[Index<E>] {
        &self.indexes
    }

    pub fn indexes_mut(&mut self) -> &mut [Index<E>] {
        &mut self.indexes
    }

    #[must_use]
    pub fn index_named(&self, name: &str) -> Option<&Index<E>> {
        self.indexes.iter().find(|index| index.model().name == name)
    }

    /// Row-store insert/remove. Index maintenance is the caller's
    /// responsibility (`db::index_maintainer`) — a table never updates its
    /// own indexes implicitly, so every mutation path stays explicit about
    /// ordering (spec §4.11's delete-before-modify-before-reinsert rule).
    pub fn put_row(&mut self, key: E::Key, entity: E) -> Option<E> {
        self.rows.insert(key, entity)
    }

    pub fn remove_row(&mut self, key: &E::Key) -> Option<E> {
        self.rows.remove(key)
    }

    #[must_use]
    pub fn get_row(&self, key: &E::Key) -> Option<&E> {
        self.rows.get(key)
    }

    pub fn row_mut(&mut self, key: &E::Key) -> Option<&mut E> {
        self.rows.get_mut(key)
    }
}

impl<E: EntityKind> Default for Table<E> {
    fn default() -> Self {
        Self::new()
    }
}
