mod common;

use audit_trail::domain::entity::TrackedEntity;
use audit_trail::domain::error::AuditError;
use common::*;

// ── 1. unique_violation_rolls_back_row_and_audit ───────────────────────────

#[tokio::test]
async fn unique_violation_rolls_back_row_and_audit() {
    let store = setup_store().await;
    let mut uow = store.begin();
    let schema = book_schema();

    let mut first = TrackedEntity::new(&schema);
    first.set(&mut uow, "title", "Dune").unwrap();
    first.set(&mut uow, "pages", 412i64).unwrap();
    uow.add(&first);
    uow.commit().await.unwrap();
    assert_eq!(uow.audit_log().await.unwrap().len(), 2);

    // Same unique title — the insert must fail at commit.
    let mut duplicate = TrackedEntity::new(&schema);
    duplicate.set(&mut uow, "title", "Dune").unwrap();
    duplicate.set(&mut uow, "pages", 600i64).unwrap();
    uow.add(&duplicate);
    let err = uow.commit().await.unwrap_err();
    assert!(matches!(err, AuditError::Database(_)));

    // Neither the row nor any of its staged audit records survived.
    assert_eq!(uow.query(&schema, &[]).await.unwrap().len(), 1);
    assert_eq!(uow.audit_log().await.unwrap().len(), 2);
}

// ── 2. failure_takes_down_everything_staged_with_it ────────────────────────

#[tokio::test]
async fn failure_takes_down_everything_staged_with_it() {
    let store = setup_store().await;
    let mut uow = store.begin();
    let books = book_schema();
    let users = user_schema();

    let mut seed = TrackedEntity::new(&books);
    seed.set(&mut uow, "title", "Dune").unwrap();
    uow.add(&seed);
    uow.commit().await.unwrap();
    let baseline = uow.audit_log().await.unwrap().len();

    // A perfectly valid user staged alongside a doomed duplicate book.
    let mut user = TrackedEntity::new(&users);
    user.set(&mut uow, "name", "Max").unwrap();
    uow.add(&user);

    let mut duplicate = TrackedEntity::new(&books);
    duplicate.set(&mut uow, "title", "Dune").unwrap();
    uow.add(&duplicate);

    assert!(uow.commit().await.is_err());

    // The valid user went down with the transaction — no partial success.
    assert!(uow.query(&users, &[]).await.unwrap().is_empty());
    assert_eq!(uow.audit_log().await.unwrap().len(), baseline);
}

// ── 3. failed_commit_clears_the_staged_set ─────────────────────────────────

#[tokio::test]
async fn failed_commit_clears_the_staged_set() {
    let store = setup_store().await;
    let mut uow = store.begin();
    let schema = book_schema();

    let mut first = TrackedEntity::new(&schema);
    first.set(&mut uow, "title", "Dune").unwrap();
    uow.add(&first);
    uow.commit().await.unwrap();

    let mut duplicate = TrackedEntity::new(&schema);
    duplicate.set(&mut uow, "title", "Dune").unwrap();
    uow.add(&duplicate);
    assert!(uow.commit().await.is_err());

    // The unit of work is empty again: committing is a no-op, not a retry
    // of the failed operations.
    uow.commit().await.unwrap();
    assert_eq!(uow.query(&schema, &[]).await.unwrap().len(), 1);
    assert_eq!(uow.audit_log().await.unwrap().len(), 1);
}
