//! C2 RelationIntrospector (spec §4.2): `find_relations(indexes,
//! include_referring, include_referred) → RelationGroup`.

use crate::{
    db::Database,
    model::{IndexModel, RelationGroup, RelationModel},
};

/// For each index in `indexes`, gather every relation in which it
/// participates as the foreign side (`referring=true` wants these — they
/// point *at* the table the caller is asking about) and/or the primary side
/// (`referred=true` wants these — the table's own outgoing FKs). Each
/// relation appears at most once per list, in insertion order of first
/// discovery (spec §4.2).
#[must_use]
pub fn find_relations(
    db: &Database,
    indexes: &[IndexModel],
    include_referring: bool,
    include_referred: bool,
) -> RelationGroup {
    let mut group = RelationGroup::default();

    for relation in db.relations() {
        if include_referring
            && indexes.contains(&relation.primary_index)
            && !group.referring.iter().any(|r: &RelationModel| r.name == relation.name)
        {
            group.referring.push(*relation);
        }
        if include_referred
            && indexes.contains(&relation.foreign_index)
            && !group.referred.iter().any(|r: &RelationModel| r.name == relation.name)
        {
            group.referred.push(*relation);
        }
    }

    group
}
