//! Minimal dynamic value used as the common currency for index keys and
//! foreign-key comparisons across entity types.
//!
//! Entities stay plain typed Rust structs; `Value` only exists at the
//! boundary where the core needs to compare or project fields without
//! knowing the concrete entity type (index key tuples, relation checks).

use crate::error::ExecError;
use std::fmt;

/// A projected field value.
///
/// `Tuple` represents a composite index key (several fields projected
/// together); the other variants cover the scalar field types entities
/// are expected to expose through [`crate::model::EntityKind::field_value`].
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Tuple(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// The reverse direction: recovering a concrete key type from a `Value`
/// carried across a type-erased boundary (a relation's foreign-key field,
/// or a cascade's discovered primary-key set). `EntityKind::Key` requires
/// this for exactly that reason — `RelationModel` only ever sees keys as
/// `Value`.
impl TryFrom<Value> for i64 {
    type Error = ExecError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(ExecError::Schema(format!("expected an integer key, found {other}"))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = ExecError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(ExecError::Schema(format!("expected a text key, found {other}"))),
        }
    }
}
