//! Catalog taxonomy over the in-memory store.

use std::sync::Arc;

use admin_client::{Catalog, CollectionSlice};
use common::{AppError, Severity};
use domain::{CatalogLevel, CatalogNode, NewCatalogNode, NodeStatus};
use store_lib::{CollectionPath, DocumentRepository, DocumentStore, MemoryStore};
use tokio_util::sync::CancellationToken;

fn catalog(store: &Arc<dyn DocumentStore>, level: CatalogLevel, limit: usize) -> Catalog {
    Catalog::new(
        level,
        DocumentRepository::new(store.clone(), CollectionPath::new(level.collection()).unwrap()),
        limit,
        Arc::new(CollectionSlice::new()),
    )
}

fn families(limit: usize) -> Catalog {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    catalog(&store, CatalogLevel::Family, limit)
}

fn names(nodes: &[CatalogNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.name.as_str()).collect()
}

fn indices(nodes: &[CatalogNode]) -> Vec<usize> {
    nodes.iter().map(|n| n.index).collect()
}

async fn seed(catalog: &Catalog, names: &[&str]) -> Vec<CatalogNode> {
    let cancel = CancellationToken::new();
    let mut added = Vec::new();
    for name in names {
        added.push(
            catalog
                .add(NewCatalogNode::family(*name, "ana"), &cancel)
                .await
                .unwrap(),
        );
    }
    added
}

#[tokio::test]
async fn test_add_appends_published_nodes() {
    let families = families(4);
    let added = seed(&families, &["Shirts", "Mugs"]).await;

    assert_eq!(indices(&added), vec![0, 1]);
    assert!(added.iter().all(|n| n.status == NodeStatus::Published));
    assert!(added.iter().all(|n| n.created_by == "ana" && n.updated_by == "ana"));
    assert_eq!(names(&families.slice().records()), vec!["Shirts", "Mugs"]);
}

#[tokio::test]
async fn test_add_rejects_duplicate_name_and_full_scope() {
    let families = families(2);
    let cancel = CancellationToken::new();
    seed(&families, &["Shirts"]).await;

    let duplicate = families
        .add(NewCatalogNode::family("Shirts", "ana"), &cancel)
        .await
        .unwrap_err();
    assert_eq!(duplicate, AppError::conflict_or_limit());
    assert_eq!(duplicate.severity(), Severity::Info);
    assert_eq!(duplicate.to_object().name, "Naming Conflict/Limit");

    seed(&families, &["Mugs"]).await;
    let over_limit = families
        .add(NewCatalogNode::family("Caps", "ana"), &cancel)
        .await
        .unwrap_err();
    assert_eq!(over_limit.code(), "Conflict/Limit");
    assert_eq!(
        over_limit.message(),
        "Naming Conflicts or Limit of Documents has Exceeded"
    );
    assert!(families.slice().add_error().current().is_some());
}

#[tokio::test]
async fn test_concurrent_adds_keep_index_dense() {
    let families = families(10);
    let cancel = CancellationToken::new();

    let mut handles = Vec::new();
    for n in 0..6 {
        let families = families.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            families
                .add(NewCatalogNode::family(format!("F{}", n), "ana"), &cancel)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let scope = families.get_scope(None, &cancel).await.unwrap();
    assert_eq!(indices(&scope), vec![0, 1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_categories_are_scoped_by_family() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let categories = catalog(&store, CatalogLevel::Category, 1);
    let cancel = CancellationToken::new();

    let tees = categories
        .add(NewCatalogNode::category("Tees", "ana", "f1"), &cancel)
        .await
        .unwrap();
    // Same name and a fresh limit under another family
    let other = categories
        .add(NewCatalogNode::category("Tees", "ana", "f2"), &cancel)
        .await
        .unwrap();

    assert_eq!(tees.index, 0);
    assert_eq!(other.index, 0);
    assert_eq!(other.family_id.as_deref(), Some("f2"));

    let missing_parent = categories
        .add(NewCatalogNode::family("Loose", "ana"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(missing_parent, AppError::WrongInput(_)));
}

#[tokio::test]
async fn test_reorder_moves_and_renumbers() {
    let families = families(4);
    let cancel = CancellationToken::new();
    seed(&families, &["A", "B", "C", "D"]).await;

    let scope = families.reorder(None, 0, 2, "bo", &cancel).await.unwrap();

    assert_eq!(names(&scope), vec!["C", "A", "B", "D"]);
    assert_eq!(indices(&scope), vec![0, 1, 2, 3]);
    assert_eq!(scope[0].updated_by, "bo");
    assert_eq!(scope[3].updated_by, "ana");
}

#[tokio::test]
async fn test_reorder_out_of_range_changes_nothing() {
    let families = families(4);
    let cancel = CancellationToken::new();
    seed(&families, &["A", "B"]).await;

    let err = families.reorder(None, 5, 0, "bo", &cancel).await.unwrap_err();
    assert!(matches!(err, AppError::WrongInput(_)));
    assert!(families.slice().edit_error().current().is_some());

    let scope = families.get_scope(None, &cancel).await.unwrap();
    assert_eq!(names(&scope), vec!["A", "B"]);
}

#[tokio::test]
async fn test_delete_marks_deleted_and_closes_gap() {
    let families = families(4);
    let cancel = CancellationToken::new();
    let added = seed(&families, &["A", "B", "C"]).await;

    let scope = families.delete(&added[0].id, "bo", &cancel).await.unwrap();
    assert_eq!(names(&scope), vec!["B", "C"]);
    assert_eq!(indices(&scope), vec![0, 1]);

    let deleted = families.fetch_by_id(&added[0].id, &cancel).await.unwrap();
    assert_eq!(deleted.status, NodeStatus::Deleted);
    assert_eq!(deleted.updated_by, "bo");

    // The name is free again and the slice still lists every node
    families
        .add(NewCatalogNode::family("A", "ana"), &cancel)
        .await
        .unwrap();
    assert_eq!(families.get_all(&cancel).await.unwrap().len(), 4);

    let again = families.delete(&added[0].id, "bo", &cancel).await.unwrap_err();
    assert_eq!(again, AppError::DocumentNotFound);
}

#[tokio::test]
async fn test_rename_keeps_names_unique() {
    let families = families(4);
    let cancel = CancellationToken::new();
    let added = seed(&families, &["A", "B"]).await;

    let renamed = families.rename(&added[0].id, "Z", "bo", &cancel).await.unwrap();
    assert_eq!(renamed.name, "Z");
    assert_eq!(renamed.updated_by, "bo");

    let clash = families.rename(&added[0].id, "B", "bo", &cancel).await.unwrap_err();
    assert_eq!(clash, AppError::conflict_or_limit());

    // Renaming to its own name is allowed
    families.rename(&added[1].id, "B", "bo", &cancel).await.unwrap();
}

#[tokio::test]
async fn test_fetch_by_name_needs_exactly_one_match() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let categories = catalog(&store, CatalogLevel::Category, 10);
    let cancel = CancellationToken::new();

    categories
        .add(NewCatalogNode::category("Tees", "ana", "f1"), &cancel)
        .await
        .unwrap();
    let found = categories.fetch_by_name("Tees", &cancel).await.unwrap();
    assert_eq!(found.family_id.as_deref(), Some("f1"));

    categories
        .add(NewCatalogNode::category("Tees", "ana", "f2"), &cancel)
        .await
        .unwrap();
    assert_eq!(
        categories.fetch_by_name("Tees", &cancel).await.unwrap_err(),
        AppError::DocumentNotFound
    );
    assert_eq!(
        categories.fetch_by_name("Hats", &cancel).await.unwrap_err(),
        AppError::DocumentNotFound
    );
}
