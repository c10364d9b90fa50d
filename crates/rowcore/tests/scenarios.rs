//! Cross-module scenario suite (Customer/Order/Item schemas), exercised
//! entirely through the public `rowcore` API the way a consumer would use
//! it — unlike the unit tests alongside each component, these drive the
//! whole insert/delete/update path end to end.

use rowcore::db::locator::{FilterPlan, KeyPlan};
use rowcore::db::update_path::Updater;
use rowcore::db::{Database, ExecutorConfig};
use rowcore::error::ExecError;
use rowcore::model::{Cloner, EntityKind, IndexModel, RelationModel, TableName};
use rowcore::value::Value;

#[derive(Clone, Debug)]
struct Customer {
    id: i64,
    name: String,
}

impl Cloner for Customer {
    fn clone_into(src: &Self, dst: &mut Self) {
        dst.id = src.id;
        dst.name.clone_from(&src.name);
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
        match field {
            "id" => Some(Value::Int(self.id)),
            "name" => Some(Value::Text(self.name.clone())),
            _ => None,
        }
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
struct Item {
    id: i64,
    code: String,
}

impl Cloner for Item {
    fn clone_into(src: &Self, dst: &mut Self) {
        dst.id = src.id;
        dst.code.clone_from(&src.code);
    }
}

const ITEM_TABLE: TableName = TableName("item");
const ITEM_PK: IndexModel = IndexModel::new("item_pk", ITEM_TABLE, &["id"], true);
const ITEM_CODE: IndexModel = IndexModel::new("item_code", ITEM_TABLE, &["code"], true);

impl EntityKind for Item {
    type Key = i64;
    const TABLE: TableName = ITEM_TABLE;
    const INDEXES: &'static [IndexModel] = &[ITEM_PK, ITEM_CODE];

    fn key(&self) -> Self::Key {
        self.id
    }

    fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(Value::Int(self.id)),
            "code" => Some(Value::Text(self.code.clone())),
            _ => None,
        }
    }

    fn apply_constraints(&mut self) -> Result<(), ExecError> {
        Ok(())
    }
}

fn customer_order_db(cascaded_deletion: bool) -> Database {
    let mut db = Database::new(ExecutorConfig::default());
    db.register_table::<Customer>().unwrap();
    db.register_table::<Order>().unwrap();
    db.register_relation(RelationModel::between::<Order, Customer>(
        "order_customer",
        ORDER_CUSTOMER_FK,
        CUSTOMER_PK,
        cascaded_deletion,
    ));
    db
}

struct RenameCustomer(&'static str);

impl Updater<Customer> for RenameCustomer {
    fn changes(&self) -> &[&'static str] {
        &["name"]
    }

    fn apply(&self, mut entity: Customer) -> Result<Customer, Box<dyn std::error::Error + Send + Sync>> {
        entity.name = self.0.to_string();
        Ok(entity)
    }
}

struct RenumberCustomer(i64);

impl Updater<Customer> for RenumberCustomer {
    fn changes(&self) -> &[&'static str] {
        &["id"]
    }

    fn apply(&self, mut entity: Customer) -> Result<Customer, Box<dyn std::error::Error + Send + Sync>> {
        entity.id = self.0;
        Ok(entity)
    }
}

struct SetItemCode(&'static str);

impl Updater<Item> for SetItemCode {
    fn changes(&self) -> &[&'static str] {
        &["code"]
    }

    fn apply(&self, mut entity: Item) -> Result<Item, Box<dyn std::error::Error + Send + Sync>> {
        entity.code = self.0.to_string();
        Ok(entity)
    }
}

// S1 Insert-FK-fail.
#[test]
fn s1_insert_with_dangling_foreign_key_is_rejected() {
    let db = customer_order_db(true);
    let txn = db.begin();
    let ctx = txn.context();

    let mut order = Order { id: 1, customer_id: 99 };
    let err = rowcore::db::insert_path::execute_insert(&mut order, &ctx).unwrap_err();
    assert!(matches!(err, ExecError::ForeignKeyViolation { .. }));

    let table = db.table::<Order>().unwrap();
    assert!(table.read().unwrap().get_row(&1).is_none());
}

// S2 Update-breaks-referrer.
#[test]
fn s2_update_that_breaks_a_referrer_is_rejected() {
    let db = customer_order_db(false);
    {
        let mut customer = Customer { id: 1, name: "A".into() };
        let txn = db.begin();
        let ctx = txn.context();
        rowcore::db::insert_path::execute_insert(&mut customer, &ctx).unwrap();
    }
    {
        let mut order = Order { id: 1, customer_id: 1 };
        let txn = db.begin();
        let ctx = txn.context();
        rowcore::db::insert_path::execute_insert(&mut order, &ctx).unwrap();
    }

    let txn = db.begin();
    let ctx = txn.context();
    let plan = KeyPlan::<i64>::new(1);
    let updater = RenumberCustomer(2);
    let err = rowcore::db::update_path::execute_updater(&plan, &updater, &ctx).unwrap_err();
    assert!(matches!(err, ExecError::ForeignKeyViolation { .. }));

    assert_eq!(db.table::<Customer>().unwrap().read().unwrap().get_row(&1).unwrap().id, 1);
    assert_eq!(db.table::<Order>().unwrap().read().unwrap().get_row(&1).unwrap().customer_id, 1);
}

// S3 Cascade delete.
#[test]
fn s3_cascade_delete_removes_customer_and_orders() {
    let db = customer_order_db(true);
    {
        let mut customer = Customer { id: 1, name: "A".into() };
        let txn = db.begin();
        let ctx = txn.context();
        rowcore::db::insert_path::execute_insert(&mut customer, &ctx).unwrap();
    }
    for id in [10, 11] {
        let mut order = Order { id, customer_id: 1 };
        let txn = db.begin();
        let ctx = txn.context();
        rowcore::db::insert_path::execute_insert(&mut order, &ctx).unwrap();
    }

    let txn = db.begin();
    let ctx = txn.context();
    let plan = FilterPlan::new(|c: &Customer| c.id == 1);
    let victims = rowcore::db::delete_path::execute_delete(&plan, &ctx).unwrap();

    assert_eq!(victims.len(), 1);
    assert!(db.table::<Customer>().unwrap().read().unwrap().rows().is_empty());
    assert!(db.table::<Order>().unwrap().read().unwrap().rows().is_empty());
}

// S4 Update key re-indexes.
#[test]
fn s4_update_key_rekeys_the_unique_index() {
    let mut db = Database::new(ExecutorConfig::default());
    db.register_table::<Item>().unwrap();
    for (id, code) in [(1, "a"), (2, "b")] {
        let mut item = Item { id, code: code.to_string() };
        let txn = db.begin();
        let ctx = txn.context();
        rowcore::db::insert_path::execute_insert(&mut item, &ctx).unwrap();
    }

    let txn = db.begin();
    let ctx = txn.context();
    let plan = KeyPlan::<i64>::new(1);
    let updater = SetItemCode("c");
    rowcore::db::update_path::execute_updater(&plan, &updater, &ctx).unwrap();

    let table = db.table::<Item>().unwrap();
    let guard = table.read().unwrap();
    let code_index = guard.index_named("item_code").unwrap();
    assert!(code_index.lookup(&[Value::Text("a".into())]).is_empty());
    assert_eq!(code_index.lookup(&[Value::Text("c".into())]), vec![1]);
    assert_eq!(code_index.lookup(&[Value::Text("b".into())]), vec![2]);
}

// S5 Update key collision.
#[test]
fn s5_update_into_a_colliding_key_is_rejected() {
    let mut db = Database::new(ExecutorConfig::default());
    db.register_table::<Item>().unwrap();
    for (id, code) in [(1, "a"), (2, "b")] {
        let mut item = Item { id, code: code.to_string() };
        let txn = db.begin();
        let ctx = txn.context();
        rowcore::db::insert_path::execute_insert(&mut item, &ctx).unwrap();
    }

    let txn = db.begin();
    let ctx = txn.context();
    let plan = KeyPlan::<i64>::new(1);
    let updater = SetItemCode("b");
    let err = rowcore::db::update_path::execute_updater(&plan, &updater, &ctx).unwrap_err();
    assert!(matches!(err, ExecError::UniqueConstraintViolation { .. }));

    let table = db.table::<Item>().unwrap();
    let guard = table.read().unwrap();
    assert_eq!(guard.get_row(&1).unwrap().code, "a");
    let code_index = guard.index_named("item_code").unwrap();
    assert_eq!(code_index.lookup(&[Value::Text("a".into())]), vec![1]);
    assert_eq!(code_index.lookup(&[Value::Text("b".into())]), vec![2]);
}

// S6 Query cloning.
#[test]
fn s6_query_results_are_clones_not_live_references() {
    let db = customer_order_db(true);
    {
        let mut customer = Customer { id: 1, name: "A".into() };
        let txn = db.begin();
        let ctx = txn.context();
        rowcore::db::insert_path::execute_insert(&mut customer, &ctx).unwrap();
    }

    let txn = db.begin();
    let ctx = txn.context();
    let plan = FilterPlan::new(|_: &Customer| true);
    let mut rows = rowcore::db::query_runner::run_query(&ctx, &plan, &[]).unwrap();
    rows[0].name = "mutated".to_string();

    let rows_again = rowcore::db::query_runner::run_query(&ctx, &plan, &[]).unwrap();
    assert_eq!(rows_again[0].name, "A");
}

#[test]
fn renaming_a_customer_leaves_its_orders_untouched() {
    let db = customer_order_db(true);
    {
        let mut customer = Customer { id: 1, name: "A".into() };
        let txn = db.begin();
        let ctx = txn.context();
        rowcore::db::insert_path::execute_insert(&mut customer, &ctx).unwrap();
    }
    {
        let mut order = Order { id: 1, customer_id: 1 };
        let txn = db.begin();
        let ctx = txn.context();
        rowcore::db::insert_path::execute_insert(&mut order, &ctx).unwrap();
    }

    let txn = db.begin();
    let ctx = txn.context();
    let plan = KeyPlan::<i64>::new(1);
    let updater = RenameCustomer("B");
    let updated = rowcore::db::update_path::execute_updater(&plan, &updater, &ctx).unwrap();

    assert_eq!(updated[0].name, "B");
    assert_eq!(db.table::<Order>().unwrap().read().unwrap().get_row(&1).unwrap().customer_id, 1);
}
