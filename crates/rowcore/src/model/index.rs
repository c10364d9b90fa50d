use crate::{error::ExecError, model::EntityKind, model::TableName, value::Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

///
/// IndexModel
///
/// Static descriptor for an index: which table it belongs to, which fields
/// it projects (in order), and whether it enforces uniqueness. Runtime
/// `Index<E>` values are built from one of these per entity type.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IndexModel {
    pub name: &'static str,
    pub table: TableName,
    pub fields: &'static [&'static str],
    pub unique: bool,
}

impl IndexModel {
    #[must_use]
    pub const fn new(
        name: &'static str,
        table: TableName,
        fields: &'static [&'static str],
        unique: bool,
    ) -> Self {
        Self {
            name,
            table,
            fields,
            unique,
        }
    }
}

impl Display for IndexModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields.join(", ");
        if self.unique {
            write!(f, "{}: UNIQUE {}({})", self.name, self.table, fields)
        } else {
            write!(f, "{}: {}({})", self.name, self.table, fields)
        }
    }
}

///
/// Index
///
/// A mapping from a projected key tuple to the set of entities matching
/// that key (spec §3's "Index"). Contract: `insert(e)` makes `e` findable
/// under its *current* key; `delete(e)` removes it under its current key;
/// behaviour is undefined if the entity's key changed between an insert and
/// a delete without an intervening delete+insert pair — callers (the
/// update path) always delete under the old key before re-inserting under
/// the new one.
///
#[derive(Debug)]
pub struct Index<E: EntityKind> {
    model: IndexModel,
    entries: BTreeMap<Vec<Value>, BTreeSet<E::Key>>,
}

impl<E: EntityKind> Index<E> {
    #[must_use]
    pub fn new(model: IndexModel) -> Self {
        Self {
            model,
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn model(&self) -> &IndexModel {
        &self.model
    }

    /// Insert `entity` under its current key.
    ///
    /// # Errors
    /// Returns [`ExecError::UniqueConstraintViolation`] if this index is
    /// unique and another entity already occupies the key.
    pub fn insert(&mut self, entity: &E) -> Result<(), ExecError> {
        let key = entity.index_key(&self.model);
        let bucket = self.entries.entry(key.clone()).or_default();

        if self.model.unique && !bucket.is_empty() && !bucket.contains(&entity.key()) {
            return Err(ExecError::UniqueConstraintViolation {
                table: self.model.table,
                index: self.model.name,
                key: render_key(&key),
            });
        }

        bucket.insert(entity.key());
        Ok(())
    }

    /// Remove `entity` from under its current key.
    pub fn delete(&mut self, entity: &E) {
        let key = entity.index_key(&self.model);
        if let Some(bucket) = self.entries.get_mut(&key) {
            bucket.remove(&entity.key());
            if bucket.is_empty() {
                self.entries.remove(&key);
            }
        }
    }

    /// Every primary key currently filed under `key`.
    #[must_use]
    pub fn lookup(&self, key: &[Value]) -> Vec<E::Key> {
        self.entries
            .get(key)
            .map(|bucket| bucket.iter().cloned().collect())
            .unwrap_or_default()
    }
}

fn render_key(key: &[Value]) -> String {
    key.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
