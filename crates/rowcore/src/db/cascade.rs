//! C3 CascadeCollector (spec §4.3): `get_cascaded_tables(root) → ordered
//! sequence of tables`, the transitive closure over referring relations
//! whose `cascaded_deletion` is set.

use crate::{db::Database, db::introspector, model::TableName};
use std::collections::HashSet;

/// Breadth-first transitive closure over `referring` relations with
/// `cascaded_deletion=true`, excluding `root` itself. Memoises visited
/// tables so a cyclic schema terminates (spec §9 "cyclic schemas") and caps
/// at `max_depth` levels as an extra backstop against a schema cycle that
/// slips past the visited-set (shouldn't happen, but a misbehaving
/// `EntityKind` impl could in principle keep discovering "new" tables if it
/// violates `INDEXES`' invariants).
///
/// Order is the order of first discovery, which is what makes two
/// concurrent cascade-deletes of the same root request cascaded-table locks
/// in the same order (spec §4.3, §5).
#[must_use]
pub fn get_cascaded_tables(db: &Database, root: TableName, max_depth: usize) -> Vec<TableName> {
    let mut visited = HashSet::from([root]);
    let mut ordered = Vec::new();
    let mut frontier = vec![root];

    for _ in 0..max_depth {
        if frontier.is_empty() {
            break;
        }
        let mut next_frontier = Vec::new();
        for table in frontier {
            let indexes = db.indexes_of(table);
            let group = introspector::find_relations(db, indexes, true, false);
            for relation in group.referring {
                if !relation.cascaded_deletion {
                    continue;
                }
                if visited.insert(relation.foreign_table) {
                    ordered.push(relation.foreign_table);
                    next_frontier.push(relation.foreign_table);
                }
            }
        }
        frontier = next_frontier;
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::ExecutorConfig,
        error::ExecError,
        model::{Cloner, EntityKind, IndexModel, RelationModel},
        value::Value,
    };

    #[derive(Clone, Debug)]
    struct Customer {
        id: i64,
    }
    impl Cloner for Customer {
        fn clone_into(src: &Self, dst: &mut Self) {
            dst.id = src.id;
        }
    }
    const CUSTOMER_TABLE: TableName = TableName("customer");
    const CUSTOMER_PK: IndexModel = IndexModel::new("customer_pk", CUSTOMER_TABLE, &["id"], true);
    impl EntityKind for Customer {
        type Key = i64;
        const TABLE: TableName = CUSTOMER_TABLE;
        const INDEXES: &'static [IndexModel] = &[CUSTOMER_PK];
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

    #[derive(Clone, Debug)]
    struct Order {
        id: i64,
        customer_id: i64,
    }
    impl Cloner for Order {
        fn clone_into(src: &Self, dst: &mut Self) {
            dst.id = src.id;
            dst.customer_id = src.customer_id;
        }
    }
    const ORDER_TABLE: TableName = TableName("order");
    const ORDER_PK: IndexModel = IndexModel::new("order_pk", ORDER_TABLE, &["id"], true);
    const ORDER_CUSTOMER_FK: IndexModel =
        IndexModel::new("order_customer_fk", ORDER_TABLE, &["customer_id"], false);
    impl EntityKind for Order {
        type Key = i64;
        const TABLE: TableName = ORDER_TABLE;
        const INDEXES: &'static [IndexModel] = &[ORDER_PK, ORDER_CUSTOMER_FK];
        fn key(&self) -> Self::Key {
            self.id
        }
        fn field_value(&self, field: &str) -> Option<Value> {
            match field {
                "id" => Some(Value::Int(self.id)),
                "customer_id" => Some(Value::Int(self.customer_id)),
                _ => None,
            }
        }
        fn apply_constraints(&mut self) -> Result<(), ExecError> {
            Ok(())
        }
    }

    #[derive(Clone, Debug)]
    struct OrderLine {
        id: i64,
        order_id: i64,
    }
    impl Cloner for OrderLine {
        fn clone_into(src: &Self, dst: &mut Self) {
            dst.id = src.id;
            dst.order_id = src.order_id;
        }
    }
    const ORDER_LINE_TABLE: TableName = TableName("order_line");
    const ORDER_LINE_PK: IndexModel = IndexModel::new("order_line_pk", ORDER_LINE_TABLE, &["id"], true);
    const ORDER_LINE_ORDER_FK: IndexModel =
        IndexModel::new("order_line_order_fk", ORDER_LINE_TABLE, &["order_id"], false);
    impl EntityKind for OrderLine {
        type Key = i64;
        const TABLE: TableName = ORDER_LINE_TABLE;
        const INDEXES: &'static [IndexModel] = &[ORDER_LINE_PK, ORDER_LINE_ORDER_FK];
        fn key(&self) -> Self::Key {
            self.id
        }
        fn field_value(&self, field: &str) -> Option<Value> {
            match field {
                "id" => Some(Value::Int(self.id)),
                "order_id" => Some(Value::Int(self.order_id)),
                _ => None,
            }
        }
        fn apply_constraints(&mut self) -> Result<(), ExecError> {
            Ok(())
        }
    }

    fn two_level_cascade_db() -> Database {
        let mut db = Database::new(ExecutorConfig::default());
        db.register_table::<Customer>().unwrap();
        db.register_table::<Order>().unwrap();
        db.register_table::<OrderLine>().unwrap();
        db.register_relation(RelationModel::between::<Order, Customer>(
            "order_customer",
            ORDER_CUSTOMER_FK,
            CUSTOMER_PK,
            true,
        ));
        db.register_relation(RelationModel::between::<OrderLine, Order>(
            "order_line_order",
            ORDER_LINE_ORDER_FK,
            ORDER_PK,
            true,
        ));
        db
    }

    #[test]
    fn recurses_past_the_immediate_child_into_grandchildren() {
        let db = two_level_cascade_db();
        let tables = get_cascaded_tables(&db, CUSTOMER_TABLE, 64);
        assert_eq!(tables, vec![ORDER_TABLE, ORDER_LINE_TABLE]);
    }

    #[test]
    fn non_cascade_relation_is_excluded() {
        let mut db = Database::new(ExecutorConfig::default());
        db.register_table::<Customer>().unwrap();
        db.register_table::<Order>().unwrap();
        db.register_relation(RelationModel::between::<Order, Customer>(
            "order_customer",
            ORDER_CUSTOMER_FK,
            CUSTOMER_PK,
            false,
        ));
        assert!(get_cascaded_tables(&db, CUSTOMER_TABLE, 64).is_empty());
    }
}
