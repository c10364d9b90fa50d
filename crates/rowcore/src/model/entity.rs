use crate::{error::ExecError, model::Cloner, model::IndexModel, model::TableName, value::Value};
use std::fmt::Debug;
use std::hash::Hash;

///
/// EntityKind
///
/// A typed record stored in exactly one table (spec §3's "Entity"). Identity
/// is given by `Key`; `INDEXES` enumerates every index of the owning table,
/// one of them primary, in the fixed order the executor paths use to decide
/// lock/undo ordering.
///
pub trait EntityKind: Sized + Clone + Debug + Cloner + Send + Sync + 'static {
    /// The primary-key type. Also the type every other index's key members
    /// are ultimately projected from via [`EntityKind::field_value`].
    type Key: Ord
        + Clone
        + Debug
        + Hash
        + Eq
        + Send
        + Sync
        + Into<Value>
        + TryFrom<Value, Error = crate::error::ExecError>;

    /// The table this entity type belongs to.
    const TABLE: TableName;

    /// Every index of this entity's table, primary index first.
    const INDEXES: &'static [IndexModel];

    /// This entity's current primary key.
    fn key(&self) -> Self::Key;

    /// Project a named field to a [`Value`] for index-key construction and
    /// relation checks. Returns `None` for unknown field names (a schema
    /// bug, not a runtime condition the executor should see in practice).
    fn field_value(&self, field: &str) -> Option<Value>;

    /// Table constraints: field generators, not-null checks, default
    /// fill-in. Mutates `self` in place; called before any index sees the
    /// entity (insert) or before an updated entity is re-indexed (update).
    ///
    /// # Errors
    /// Returns [`ExecError::ConstraintViolation`] if a constraint rejects
    /// the entity.
    fn apply_constraints(&mut self) -> Result<(), ExecError>;

    /// Convenience: project this entity's current key under one index.
    #[must_use]
    fn index_key(&self, index: &IndexModel) -> Vec<Value> {
        index
            .fields
            .iter()
            .map(|field| self.field_value(field).unwrap_or(Value::Null))
            .collect()
    }

    /// The entity's primary index (first entry of `INDEXES` by convention,
    /// matching the source system's "one of them declared primary").
    #[must_use]
    fn primary_index() -> &'static IndexModel {
        Self::INDEXES
            .first()
            .expect("EntityKind::INDEXES must declare at least one index")
    }
}
