//! Catalog taxonomy management.
//!
//! One [`Catalog`] serves one level (family, category or sub-category). Nodes
//! are ordered by a dense `index` inside their parent scope; adding, deleting
//! and reordering run as transactions on the level's collection so the index
//! stays contiguous.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use validator::Validate;

use common::{with_cancel, AppError, AppResult};
use domain::{
    new_document_id, reorder, CatalogLevel, CatalogNode, CatalogNodeWrite, CatalogPatch,
    DomainError, NewCatalogNode, NodeStatus, FIELD_CREATED_AT,
};
use store_lib::{Direction, DocumentRepository, Query, ReadRepository};

use crate::state::CollectionSlice;

/// Live nodes of one parent scope, ordered by index
fn scope_query(level: CatalogLevel, parent: Option<&str>) -> AppResult<Query> {
    let query = Query::new()
        .where_ne("status", "deleted")
        .order_by("index", Direction::Ascending);

    match (level.parent_field(), parent) {
        (None, None) => Ok(query),
        (Some(field), Some(parent)) => Ok(query.where_eq(field, parent)),
        (None, Some(_)) => Err(AppError::WrongInput(format!("a {} has no parent", level))),
        (Some(field), None) => Err(AppError::WrongInput(format!(
            "a {} needs its {}",
            level, field
        ))),
    }
}

#[derive(Clone)]
pub struct Catalog {
    level: CatalogLevel,
    repo: DocumentRepository<CatalogNode>,
    limit: usize,
    slice: Arc<CollectionSlice<CatalogNode>>,
}

impl Catalog {
    pub fn new(
        level: CatalogLevel,
        repo: DocumentRepository<CatalogNode>,
        limit: usize,
        slice: Arc<CollectionSlice<CatalogNode>>,
    ) -> Self {
        Self {
            level,
            repo,
            limit,
            slice,
        }
    }

    pub fn level(&self) -> CatalogLevel {
        self.level
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn slice(&self) -> &Arc<CollectionSlice<CatalogNode>> {
        &self.slice
    }

    /// Every node of this level, deleted ones included, oldest first
    pub async fn get_all(&self, cancel: &CancellationToken) -> AppResult<Vec<CatalogNode>> {
        let query = Query::new().order_by(FIELD_CREATED_AT, Direction::Ascending);
        let result = with_cancel(cancel, self.repo.get_all(query)).await;
        self.slice.fetched(&result);
        result
    }

    /// Live nodes under `parent` in display order
    pub async fn get_scope(
        &self,
        parent: Option<&str>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<CatalogNode>> {
        let query = scope_query(self.level, parent)?;
        with_cancel(cancel, self.repo.get_all(query)).await
    }

    pub async fn fetch_by_id(&self, id: &str, cancel: &CancellationToken) -> AppResult<CatalogNode> {
        with_cancel(cancel, self.repo.get_one(id)).await
    }

    /// The single live node called `name`; none or several is `DocumentNotFound`
    pub async fn fetch_by_name(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> AppResult<CatalogNode> {
        let query = Query::new()
            .where_eq("name", name)
            .where_ne("status", "deleted");
        let mut found = with_cancel(cancel, self.repo.get_all(query)).await?;
        if found.len() == 1 {
            Ok(found.remove(0))
        } else {
            debug!(level = %self.level, name = %name, matches = found.len(), "No unique node");
            Err(AppError::DocumentNotFound)
        }
    }

    /// Add a node at the end of its scope.
    ///
    /// Fails with `Conflict/Limit` when the scope is full or a live sibling
    /// already uses the name.
    pub async fn add(&self, node: NewCatalogNode, cancel: &CancellationToken) -> AppResult<CatalogNode> {
        let result = with_cancel(cancel, self.add_inner(node)).await;
        self.slice.added(&result);
        result
    }

    async fn add_inner(&self, node: NewCatalogNode) -> AppResult<CatalogNode> {
        node.validate().map_err(DomainError::from)?;
        let query = scope_query(self.level, node.parent_id(self.level))?;
        let limit = self.limit;
        let id = new_document_id();
        let doc_id = id.clone();

        self.repo
            .transaction(move |tx| {
                Box::pin(async move {
                    let siblings = tx.get_all(query).await?;
                    if siblings.len() >= limit || siblings.iter().any(|s| s.name == node.name) {
                        return Err(AppError::conflict_or_limit());
                    }
                    let write = CatalogNodeWrite::from_new(doc_id.clone(), siblings.len(), node);
                    tx.writes().set(&write, &doc_id)?;
                    Ok(())
                })
            })
            .await?;

        let created = self.repo.get_one(&id).await?;
        info!(level = %self.level, id = %created.id, index = created.index, "Catalog node added");
        Ok(created)
    }

    /// Rename a live node; the name must stay unique among its siblings
    pub async fn rename(
        &self,
        id: &str,
        name: &str,
        user: &str,
        cancel: &CancellationToken,
    ) -> AppResult<CatalogNode> {
        let result = with_cancel(cancel, self.rename_inner(id, name, user)).await;
        self.slice.edited(&result);
        result
    }

    async fn rename_inner(&self, id: &str, name: &str, user: &str) -> AppResult<CatalogNode> {
        NewCatalogNode::family(name, user)
            .validate()
            .map_err(DomainError::from)?;
        let level = self.level;
        let doc_id = id.to_string();
        let patch = CatalogPatch::rename(name, user);

        self.repo
            .transaction(move |tx| {
                Box::pin(async move {
                    let current = tx.get_one(&doc_id).await?;
                    if !current.is_live() {
                        return Err(AppError::DocumentNotFound);
                    }
                    let siblings = tx
                        .get_all(scope_query(level, current.parent_id(level))?)
                        .await?;
                    let taken = siblings
                        .iter()
                        .any(|s| s.id != doc_id && Some(&s.name) == patch.name.as_ref());
                    if taken {
                        return Err(AppError::conflict_or_limit());
                    }
                    tx.writes().batch_update(&patch, &doc_id)?;
                    Ok(())
                })
            })
            .await?;

        self.repo.get_one(id).await
    }

    /// Mark a node deleted and close the gap it leaves in its scope.
    ///
    /// Returns the remaining live siblings in their new order.
    pub async fn delete(
        &self,
        id: &str,
        user: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<CatalogNode>> {
        let result = with_cancel(cancel, self.delete_inner(id, user)).await;
        self.after_bulk_edit(result, cancel).await
    }

    async fn delete_inner(&self, id: &str, user: &str) -> AppResult<Vec<CatalogNode>> {
        let level = self.level;
        let doc_id = id.to_string();
        let user = user.to_string();

        let parent = self
            .repo
            .transaction(move |tx| {
                Box::pin(async move {
                    let current = tx.get_one(&doc_id).await?;
                    if !current.is_live() {
                        return Err(AppError::DocumentNotFound);
                    }
                    let parent = current.parent_id(level).map(str::to_string);
                    let siblings = tx.get_all(scope_query(level, parent.as_deref())?).await?;

                    let remaining = siblings.iter().filter(|s| s.id != doc_id);
                    for (position, sibling) in remaining.enumerate() {
                        if sibling.index != position {
                            tx.writes()
                                .batch_update(&CatalogPatch::reindex(position, user.as_str()), &sibling.id)?;
                        }
                    }
                    tx.writes()
                        .batch_update(&CatalogPatch::status(NodeStatus::Deleted, user.as_str()), &doc_id)?;
                    Ok(parent)
                })
            })
            .await?;

        info!(level = %self.level, id = %id, "Catalog node deleted");
        self.repo
            .get_all(scope_query(self.level, parent.as_deref())?)
            .await
    }

    /// Move the node at position `doc_index` of the scope to `to_place`.
    ///
    /// Positions refer to the scope as [`Catalog::get_scope`] returns it.
    /// Returns the scope re-read after the move.
    pub async fn reorder(
        &self,
        parent: Option<&str>,
        to_place: usize,
        doc_index: usize,
        user: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<CatalogNode>> {
        let result = with_cancel(cancel, self.reorder_inner(parent, to_place, doc_index, user)).await;
        self.after_bulk_edit(result, cancel).await
    }

    async fn reorder_inner(
        &self,
        parent: Option<&str>,
        to_place: usize,
        doc_index: usize,
        user: &str,
    ) -> AppResult<Vec<CatalogNode>> {
        let query = scope_query(self.level, parent)?;
        let reread = query.clone();
        let user = user.to_string();

        let moved = self
            .repo
            .transaction(move |tx| {
                Box::pin(async move {
                    let siblings = tx.get_all(query).await?;
                    let stored: HashMap<String, usize> =
                        siblings.iter().map(|s| (s.id.clone(), s.index)).collect();
                    let reordered = reorder(&siblings, to_place, doc_index)?;

                    let mut moved = 0;
                    for node in &reordered {
                        if stored.get(&node.id) != Some(&node.index) {
                            tx.writes()
                                .batch_update(&CatalogPatch::reindex(node.index, user.as_str()), &node.id)?;
                            moved += 1;
                        }
                    }
                    Ok(moved)
                })
            })
            .await?;

        debug!(level = %self.level, moved, "Catalog scope reordered");
        self.repo.get_all(reread).await
    }

    /// Refresh the slice after a multi-document edit, or record its error
    async fn after_bulk_edit(
        &self,
        result: AppResult<Vec<CatalogNode>>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<CatalogNode>> {
        match result {
            Ok(scope) => {
                // A failed refresh is already recorded as a fetch error
                let _ = self.get_all(cancel).await;
                Ok(scope)
            }
            Err(AppError::Cancelled) => Err(AppError::Cancelled),
            Err(e) => {
                self.slice.edit_failed(e.to_object());
                Err(e)
            }
        }
    }
}
