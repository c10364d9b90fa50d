//! Data model (spec §3): entities, tables, indexes, relations.
//!
//! This module owns the *shape* of the data model only. It does not own
//! locking, log scopes, or the mutation paths — those live in `db`.

mod cloner;
mod entity;
mod index;
mod relation;
mod table;

pub use cloner::Cloner;
pub use entity::EntityKind;
pub use index::{Index, IndexModel};
pub use relation::{RelationGroup, RelationModel};
pub use table::Table;

use std::fmt;

/// Stable identifier for a table, used wherever the core needs to name a
/// table without knowing its entity type (locking, relation bookkeeping).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TableName(pub &'static str);

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier for a relation, used in error messages and dedup.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RelationName(pub &'static str);

impl fmt::Display for RelationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
