#![allow(dead_code)]

use audit_trail::domain::field::FieldType;
use audit_trail::domain::schema::EntitySchema;
use audit_trail::infra::sqlite::store::EntityStore;

/// In-memory store with the test schemas created. Each test gets full
/// isolation — its own database.
pub async fn setup_store() -> EntityStore {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();

    let store = EntityStore::in_memory()
        .await
        .expect("failed to open in-memory store");
    store
        .create_schema(&[user_schema(), book_schema()])
        .await
        .expect("failed to create schema");
    store
}

pub fn user_schema() -> EntitySchema {
    EntitySchema::new("User", "user")
        .unwrap()
        .field("name", FieldType::Text)
        .unwrap()
        .field("age", FieldType::Integer)
        .unwrap()
}

/// Unique title — violating it is the canonical way to force a commit
/// failure in the rollback tests.
pub fn book_schema() -> EntitySchema {
    EntitySchema::new("Book", "book")
        .unwrap()
        .unique_field("title", FieldType::Text)
        .unwrap()
        .field("pages", FieldType::Integer)
        .unwrap()
}
