//! C1 TableLocator (spec §4.1): `find_affected_tables(database, plan) → set
//! of tables`. The plan traits themselves live here too — they are the
//! "opaque execution plan" collaborator spec §1 lists as out of scope, but
//! the core still needs a shape to call through.

use crate::model::{EntityKind, TableName};
use std::collections::{BTreeMap, BTreeSet};

/// A read or mutation plan over rows of one base entity type `E`. Plans are
/// precompiled and opaque to the core (spec §1); all the core asks of one
/// is which other tables it joins against and how to select rows given the
/// base table's row store.
pub trait Plan<E: EntityKind> {
    /// Tables this plan reads in addition to `E::TABLE`, e.g. join targets.
    /// Most plans touch only their own table.
    fn joined_tables(&self) -> Vec<TableName> {
        Vec::new()
    }

    /// Select and order the keys of matching rows.
    fn select(&self, rows: &BTreeMap<E::Key, E>) -> Vec<E::Key>;
}

/// A plan that reduces a base table to a single scalar (count, aggregate,
/// existence check) rather than a row sequence.
pub trait ScalarPlan<E: EntityKind, R> {
    fn joined_tables(&self) -> Vec<TableName> {
        Vec::new()
    }

    fn compute(&self, rows: &BTreeMap<E::Key, E>) -> R;
}

/// `FindAffectedTables(database, plan) → set of tables` (spec §4.1):
/// `E::TABLE` plus whatever the plan declares as joined. Deterministic and
/// pure — it only reads the plan's own declarations, never a table's rows.
#[must_use]
pub fn find_affected_tables<E: EntityKind>(plan: &impl Plan<E>) -> BTreeSet<TableName> {
    let mut tables = BTreeSet::new();
    tables.insert(E::TABLE);
    tables.extend(plan.joined_tables());
    tables
}

/// A plan built from a plain predicate closure, for tests and for simple
/// single-table scans where no dedicated plan type is worth defining.
pub struct FilterPlan<F> {
    predicate: F,
}

impl<F> FilterPlan<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> Plan<E> for FilterPlan<F>
where
    E: EntityKind,
    F: Fn(&E) -> bool,
{
    fn select(&self, rows: &BTreeMap<E::Key, E>) -> Vec<E::Key> {
        rows.iter()
            .filter(|(_, entity)| (self.predicate)(entity))
            .map(|(key, _)| key.clone())
            .collect()
    }
}

/// A plan selecting exactly one row by key.
pub struct KeyPlan<K> {
    key: K,
}

impl<K> KeyPlan<K> {
    pub fn new(key: K) -> Self {
        Self { key }
    }
}

impl<E: EntityKind> Plan<E> for KeyPlan<E::Key> {
    fn select(&self, rows: &BTreeMap<E::Key, E>) -> Vec<E::Key> {
        rows.contains_key(&self.key)
            .then(|| vec![self.key.clone()])
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ExecError, model::Cloner, model::IndexModel, value::Value};

    #[derive(Clone, Debug)]
    struct Item {
        id: i64,
    }

    impl Cloner for Item {
        fn clone_into(src: &Self, dst: &mut Self) {
            dst.id = src.id;
        }
    }

    const ITEM_TABLE: TableName = TableName("item");
    const PK: IndexModel = IndexModel::new("item_pk", ITEM_TABLE, &["id"], true);

    impl EntityKind for Item {
        type Key = i64;
        const TABLE: TableName = ITEM_TABLE;
        const INDEXES: &'static [IndexModel] = &[PK];

        fn key(&self) -> Self::Key {
            self.id
        }

        fn field_value(&self, field: &str) -> Option<Value> {
            (field == "id").then_some(Value::Int(self.id))
        }

        fn apply_constraints(&mut self) -> Result<(), ExecError> {
            Ok(())
        }
    }

    #[test]
    fn affected_tables_includes_base_and_joins() {
        struct JoinsOrders;
        impl Plan<Item> for JoinsOrders {
            fn joined_tables(&self) -> Vec<TableName> {
                vec![TableName("orders")]
            }

            fn select(&self, rows: &BTreeMap<i64, Item>) -> Vec<i64> {
                rows.keys().copied().collect()
            }
        }

        let tables = find_affected_tables(&JoinsOrders);
        assert!(tables.contains(&ITEM_TABLE));
        assert!(tables.contains(&TableName("orders")));
    }

    #[test]
    fn filter_plan_selects_matching_keys() {
        let mut rows = BTreeMap::new();
        rows.insert(1, Item { id: 1 });
        rows.insert(2, Item { id: 2 });
        let plan = FilterPlan::new(|item: &Item| item.id == 2);
        assert_eq!(Plan::<Item>::select(&plan, &rows), vec![2]);
    }
}
