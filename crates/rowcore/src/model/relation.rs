use crate::{
    db::Database,
    error::ExecError,
    model::{EntityKind, Index, IndexModel, RelationName, Table, TableName},
    value::Value,
};

///
/// RelationModel
///
/// A directed foreign-key pair: a foreign index on a *foreign* table
/// pointing at a primary index on a *primary* table, with
/// `cascaded_deletion` controlling whether deleting a primary entity
/// cascades to its referrers (spec §3's "Relation").
///
/// The callback fields are the capability-object indirection design notes
/// §9 calls for: a relation is defined between two concrete entity types at
/// schema-build time (`RelationModel::between::<Foreign, Primary>`), but
/// the cross-table executor paths (C2/C3/C7/C10) only ever see it through
/// this type-erased shape, so they can walk a schema graph without being
/// generic over every entity type in it.
///
#[derive(Clone, Copy)]
pub struct RelationModel {
    pub name: RelationName,
    pub foreign_table: TableName,
    pub foreign_index: IndexModel,
    pub primary_table: TableName,
    pub primary_index: IndexModel,
    pub cascaded_deletion: bool,

    /// Does the primary table contain a row whose primary index yields
    /// `key`?
    primary_exists: fn(&Database, &IndexModel, &Value) -> Result<bool, ExecError>,

    /// Primary keys (of the *foreign* table) currently referencing `key`.
    find_referring: fn(&Database, &IndexModel, &Value) -> Result<Vec<Value>, ExecError>,

    /// Does the foreign row whose own primary key is `foreign_key` still
    /// satisfy this relation (i.e. does its foreign-key field resolve to an
    /// existing primary row)? Raises `ForeignKeyViolation` if not.
    validate_foreign_row: fn(&Database, RelationModel, &Value) -> Result<(), ExecError>,

    /// Delete the foreign rows named by `foreign_keys`, within the caller's
    /// already-open log scope, recursing into that table's own cascade.
    /// Returns the primary-key values of whatever was actually removed (for
    /// §4.10 step 8's "stable snapshot of originally deleted victims" to
    /// compose across heterogeneous cascade levels is not required here —
    /// callers only need the count for diagnostics).
    cascaded_delete:
        fn(&Database, &mut crate::db::log_scope::AtomicLogScope, &[Value]) -> Result<usize, ExecError>,
}

impl RelationModel {
    /// Build a relation between two concrete entity types. `foreign_index`
    /// is expected to project a single field (today's executor paths only
    /// support single-field foreign keys; composite FKs are an Open
    /// Question left for a future revision, matching the source system's
    /// own index-field limit).
    #[must_use]
    pub fn between<Foreign, Primary>(
        name: &'static str,
        foreign_index: IndexModel,
        primary_index: IndexModel,
        cascaded_deletion: bool,
    ) -> Self
    where
        Foreign: EntityKind,
        Primary: EntityKind,
    {
        Self {
            name: RelationName(name),
            foreign_table: Foreign::TABLE,
            foreign_index,
            primary_table: Primary::TABLE,
            primary_index,
            cascaded_deletion,
            primary_exists: primary_exists_impl::<Primary>,
            find_referring: find_referring_impl::<Foreign>,
            validate_foreign_row: validate_foreign_row_impl::<Foreign>,
            cascaded_delete: cascaded_delete_impl::<Foreign>,
        }
    }

    pub(crate) fn primary_exists(&self, db: &Database, key: &Value) -> Result<bool, ExecError> {
        (self.primary_exists)(db, &self.primary_index, key)
    }

    pub(crate) fn find_referring(&self, db: &Database, key: &Value) -> Result<Vec<Value>, ExecError> {
        (self.find_referring)(db, &self.foreign_index, key)
    }

    pub(crate) fn validate_foreign_row(&self, db: &Database, foreign_key: &Value) -> Result<(), ExecError> {
        (self.validate_foreign_row)(db, *self, foreign_key)
    }

    pub(crate) fn cascaded_delete(
        &self,
        db: &Database,
        log: &mut crate::db::log_scope::AtomicLogScope,
        foreign_keys: &[Value],
    ) -> Result<usize, ExecError> {
        (self.cascaded_delete)(db, log, foreign_keys)
    }
}

fn primary_exists_impl<P: EntityKind>(
    db: &Database,
    index: &IndexModel,
    key: &Value,
) -> Result<bool, ExecError> {
    let table = db.table::<P>()?;
    let guard = table.read().expect("table lock poisoned");
    Ok(lookup_by_model(&guard, index, key).map_or(false, |keys| !keys.is_empty()))
}

fn find_referring_impl<F: EntityKind>(
    db: &Database,
    index: &IndexModel,
    key: &Value,
) -> Result<Vec<Value>, ExecError> {
    let table = db.table::<F>()?;
    let guard = table.read().expect("table lock poisoned");
    let keys = lookup_by_model(&guard, index, key).unwrap_or_default();
    Ok(keys.into_iter().map(Into::into).collect())
}

fn lookup_by_model<E: EntityKind>(
    table: &Table<E>,
    index: &IndexModel,
    key: &Value,
) -> Option<Vec<E::Key>> {
    let idx: &Index<E> = table.index_named(index.name)?;
    Some(idx.lookup(std::slice::from_ref(key)))
}

fn validate_foreign_row_impl<F: EntityKind>(
    db: &Database,
    relation: RelationModel,
    foreign_key: &Value,
) -> Result<(), ExecError> {
    let table = db.table::<F>()?;
    let guard = table.read().expect("table lock poisoned");
    let key: F::Key = F::Key::try_from(foreign_key.clone())?;
    let Some(row) = guard.get_row(&key) else {
        return Ok(());
    };
    let field = relation
        .foreign_index
        .fields
        .first()
        .copied()
        .unwrap_or_default();
    let fk_value = row.field_value(field).unwrap_or(Value::Null);
    if matches!(fk_value, Value::Null) {
        return Ok(());
    }
    if relation.primary_exists(db, &fk_value)? {
        Ok(())
    } else {
        Err(ExecError::ForeignKeyViolation {
            relation: relation.name,
            key: fk_value.to_string(),
        })
    }
}

fn cascaded_delete_impl<F: EntityKind>(
    db: &Database,
    log: &mut crate::db::log_scope::AtomicLogScope,
    foreign_keys: &[Value],
) -> Result<usize, ExecError> {
    let keys: Vec<F::Key> = foreign_keys
        .iter()
        .map(|value| F::Key::try_from(value.clone()))
        .collect::<Result<_, _>>()?;
    crate::db::delete_path::delete_by_keys_in_scope::<F>(db, log, &keys)
}

///
/// RelationGroup
///
/// A pair (referring[], referred[]) with uniqueness preserved by insertion
/// order of first discovery (spec §3's "RelationGroup").
///
#[derive(Clone, Debug, Default)]
pub struct RelationGroup {
    /// Relations in which the queried table is the *primary* side — others
    /// point at it.
    pub referring: Vec<RelationModel>,
    /// Relations in which the queried table is the *foreign* side — it
    /// points at others.
    pub referred: Vec<RelationModel>,
}

impl std::fmt::Debug for RelationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationModel")
            .field("name", &self.name)
            .field("foreign_table", &self.foreign_table)
            .field("primary_table", &self.primary_table)
            .field("cascaded_deletion", &self.cascaded_deletion)
            .finish()
    }
}
