//! Repository behaviour over the in-memory store.

use std::sync::Arc;

use common::AppError;
use domain::{NewStaffRole, StaffRole, StaffRolePatch, StaffRoleRecord, ROLES_COLLECTION};
use serde_json::json;
use store_lib::{
    CollectionPath, Direction, DocumentRepository, DocumentStore, MemoryStore, Query,
    ReadRepository, WriteRepository, DeleteRepository,
};

fn roles(store: Arc<MemoryStore>) -> DocumentRepository<StaffRoleRecord> {
    DocumentRepository::new(store, CollectionPath::new(ROLES_COLLECTION).unwrap())
}

#[tokio::test]
async fn test_create_then_get_returns_payload_with_stamps() {
    let repo = roles(Arc::new(MemoryStore::new()));
    let payload = NewStaffRole::new("r1", "a@x.com", StaffRole::Manager);

    let created = repo.create_one(&payload, "r1").await.unwrap();
    let fetched = repo.get_one("r1").await.unwrap();

    assert_eq!(created, fetched);
    assert_eq!(fetched.email, "a@x.com");
    assert_eq!(fetched.role, StaffRole::Manager);
    assert!(!fetched.disabled);
    assert_eq!(fetched.created_at, fetched.updated_at);
}

#[tokio::test]
async fn test_update_changes_only_given_fields() {
    let repo = roles(Arc::new(MemoryStore::new()));
    let created = repo
        .create_one(&NewStaffRole::new("r1", "a@x.com", StaffRole::Staff), "r1")
        .await
        .unwrap();

    let updated = repo
        .update_one(&StaffRolePatch::disabled(true), "r1")
        .await
        .unwrap();

    assert!(updated.disabled);
    assert_eq!(updated.email, created.email);
    assert_eq!(updated.role, created.role);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
}

#[tokio::test]
async fn test_update_of_missing_document_fails() {
    let repo = roles(Arc::new(MemoryStore::new()));
    let err = repo
        .update_one(&StaffRolePatch::disabled(true), "missing")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "not-found");
}

#[tokio::test]
async fn test_get_all_orders_and_filters() {
    let repo = roles(Arc::new(MemoryStore::new()));
    for (id, email, role) in [
        ("r2", "b@x.com", StaffRole::Printing),
        ("r1", "a@x.com", StaffRole::Manager),
        ("r3", "c@x.com", StaffRole::Printing),
    ] {
        repo.create_one(&NewStaffRole::new(id, email, role), id)
            .await
            .unwrap();
    }

    let ordered = repo
        .get_all(Query::new().order_by("createdAt", Direction::Ascending))
        .await
        .unwrap();
    let emails: Vec<_> = ordered.iter().map(|r| r.email.as_str()).collect();
    assert_eq!(emails, vec!["b@x.com", "a@x.com", "c@x.com"]);

    let printing = repo
        .get_all(Query::new().where_eq("role", "printing"))
        .await
        .unwrap();
    assert_eq!(printing.len(), 2);
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let repo = roles(Arc::new(MemoryStore::new()));
    repo.create_one(&NewStaffRole::new("r1", "a@x.com", StaffRole::Staff), "r1")
        .await
        .unwrap();

    repo.delete_one("r1").await.unwrap();
    assert_eq!(repo.get_one("r1").await.unwrap_err(), AppError::DocumentNotFound);
}

#[tokio::test]
async fn test_malformed_document_is_decode_error() {
    let store = Arc::new(MemoryStore::new());
    let raw: DocumentRepository<serde_json::Value> =
        DocumentRepository::new(store.clone(), CollectionPath::new(ROLES_COLLECTION).unwrap());
    raw.create_one(&json!({ "email": "a@x.com", "role": "overlord" }), "r1")
        .await
        .unwrap();

    let err = roles(store).get_one("r1").await.unwrap_err();
    assert!(matches!(err, AppError::Decode(_)));
}

#[tokio::test]
async fn test_batch_commits_all_or_nothing() {
    let store = Arc::new(MemoryStore::new());
    let repo = roles(store.clone());
    repo.create_one(&NewStaffRole::new("r1", "a@x.com", StaffRole::Staff), "r1")
        .await
        .unwrap();

    let mut batch = repo.batch();
    batch.batch_update(&StaffRolePatch::disabled(true), "r1").unwrap();
    batch.batch_update(&StaffRolePatch::disabled(true), "missing").unwrap();
    assert!(batch.commit().await.is_err());
    assert!(!repo.get_one("r1").await.unwrap().disabled);

    let mut batch = repo.batch();
    batch.batch_update(&StaffRolePatch::disabled(true), "r1").unwrap();
    batch
        .set(&NewStaffRole::new("r2", "b@x.com", StaffRole::Shipping), "r2")
        .unwrap();
    assert_eq!(batch.len(), 2);
    batch.commit().await.unwrap();

    assert!(repo.get_one("r1").await.unwrap().disabled);
    assert_eq!(repo.get_one("r2").await.unwrap().role, StaffRole::Shipping);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_transaction_commits_buffered_writes_on_success() {
    let repo = roles(Arc::new(MemoryStore::new()));
    repo.create_one(&NewStaffRole::new("r1", "a@x.com", StaffRole::Staff), "r1")
        .await
        .unwrap();

    let count = repo
        .transaction(|tx| {
            Box::pin(async move {
                let all = tx.get_all(Query::new()).await?;
                tx.writes()
                    .set(&NewStaffRole::new("r2", "b@x.com", StaffRole::Manager), "r2")?;
                // Buffered writes are not visible before commit
                assert!(tx.get_one("r2").await.is_err());
                Ok(all.len())
            })
        })
        .await
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(repo.get_one("r2").await.unwrap().email, "b@x.com");
}

#[tokio::test]
async fn test_transaction_error_discards_writes() {
    let repo = roles(Arc::new(MemoryStore::new()));

    let result: Result<(), AppError> = repo
        .transaction(|tx| {
            Box::pin(async move {
                tx.writes()
                    .set(&NewStaffRole::new("r1", "a@x.com", StaffRole::Manager), "r1")?;
                Err(AppError::validation("abort"))
            })
        })
        .await;

    assert!(result.is_err());
    assert_eq!(repo.get_one("r1").await.unwrap_err(), AppError::DocumentNotFound);
}

#[tokio::test]
async fn test_concurrent_transactions_serialise_on_path() {
    let store = Arc::new(MemoryStore::new());
    let repo = roles(store.clone());

    let mut handles = Vec::new();
    for n in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.transaction(move |tx| {
                Box::pin(async move {
                    let existing = tx.get_all(Query::new()).await?;
                    let id = format!("r{}", existing.len());
                    let email = format!("user{}@x.com", n);
                    tx.writes()
                        .set(&NewStaffRole::new(id.clone(), email, StaffRole::Staff), &id)?;
                    Ok(())
                })
            })
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let docs = store
        .query(&CollectionPath::new(ROLES_COLLECTION).unwrap(), &Query::new())
        .await
        .unwrap();
    assert_eq!(docs.len(), 8);
}
