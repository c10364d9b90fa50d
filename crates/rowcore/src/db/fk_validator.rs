//! C7 ForeignKeyValidator (spec §4.7): checks that a set of entities
//! satisfies a set of relations, in either of the two shapes the mutation
//! paths need.

use crate::{db::Database, error::ExecError, model::EntityKind, model::RelationModel, value::Value};

/// `validate(relations, entities: flat sequence)` (spec §4.7): each
/// relation checks each entity's own foreign-key field against that
/// relation's primary table. Used by the insert path and by the update
/// path's referred-side check. A null foreign key always satisfies the
/// relation (nullable FKs are never enforced). Empty `relations`
/// short-circuits to `Ok`.
///
/// # Errors
/// Returns [`ExecError::ForeignKeyViolation`] on the first entity whose
/// foreign key does not resolve.
pub fn validate_referred<E: EntityKind>(
    db: &Database,
    relations: &[RelationModel],
    entities: &[E],
) -> Result<(), ExecError> {
    for relation in relations {
        let field = relation.foreign_index.fields.first().copied().unwrap_or_default();
        for entity in entities {
            let fk_value = entity.field_value(field).unwrap_or(Value::Null);
            if matches!(fk_value, Value::Null) {
                continue;
            }
            if !relation.primary_exists(db, &fk_value)? {
                return Err(ExecError::ForeignKeyViolation {
                    relation: relation.name,
                    key: fk_value.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// `validate(relations, entities_by_relation: map)` (spec §4.7): each
/// relation checks only its own bucket, built by `find_referring` (spec
/// §4.10's `FindReferringEntities`). A non-empty bucket on a relation
/// without cascade is itself the violation — those are foreign rows whose
/// target just vanished.
///
/// # Errors
/// Returns [`ExecError::ForeignKeyViolation`] naming the first non-empty
/// bucket's relation and one of its members.
pub fn validate_referring(
    db: &Database,
    referring: &[(RelationModel, Vec<Value>)],
) -> Result<(), ExecError> {
    for (relation, bucket) in referring {
        for foreign_key in bucket {
            relation.validate_foreign_row(db, foreign_key)?;
        }
    }
    Ok(())
}
