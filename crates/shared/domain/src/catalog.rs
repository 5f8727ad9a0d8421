//! Catalog taxonomy: product families, categories and sub-categories.
//!
//! The three levels share one record shape. A category points at its family
//! through `familyId`, a sub-category additionally at its category through
//! `categoryId`. The hierarchy is not enforced by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::{
    CATEGORY_COLLECTION, DEFAULT_CATEGORY_LIMIT, DEFAULT_FAMILY_LIMIT,
    DEFAULT_SUB_CATEGORY_LIMIT, FAMILY_COLLECTION, SUB_CATEGORY_COLLECTION,
};
use crate::record::{Identified, Indexed};

/// Publication status of a catalog node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Published,
    Unpublished,
    Archived,
    Deleted,
}

impl NodeStatus {
    pub fn is_deleted(&self) -> bool {
        matches!(self, NodeStatus::Deleted)
    }
}

/// Level of the catalog hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogLevel {
    Family,
    Category,
    SubCategory,
}

impl CatalogLevel {
    /// Collection path holding nodes of this level
    pub fn collection(&self) -> &'static str {
        match self {
            CatalogLevel::Family => FAMILY_COLLECTION,
            CatalogLevel::Category => CATEGORY_COLLECTION,
            CatalogLevel::SubCategory => SUB_CATEGORY_COLLECTION,
        }
    }

    /// Document field naming the parent node, if any
    pub fn parent_field(&self) -> Option<&'static str> {
        match self {
            CatalogLevel::Family => None,
            CatalogLevel::Category => Some("familyId"),
            CatalogLevel::SubCategory => Some("categoryId"),
        }
    }

    /// Default number of live nodes allowed per parent scope
    pub fn default_limit(&self) -> usize {
        match self {
            CatalogLevel::Family => DEFAULT_FAMILY_LIMIT,
            CatalogLevel::Category => DEFAULT_CATEGORY_LIMIT,
            CatalogLevel::SubCategory => DEFAULT_SUB_CATEGORY_LIMIT,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CatalogLevel::Family => "family",
            CatalogLevel::Category => "category",
            CatalogLevel::SubCategory => "sub-category",
        }
    }
}

impl std::fmt::Display for CatalogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Family, category or sub-category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogNode {
    pub id: String,
    pub name: String,
    pub index: usize,
    pub created_by: String,
    pub updated_by: String,
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogNode {
    /// Identifier of the parent this node is ordered under
    pub fn parent_id(&self, level: CatalogLevel) -> Option<&str> {
        match level {
            CatalogLevel::Family => None,
            CatalogLevel::Category => self.family_id.as_deref(),
            CatalogLevel::SubCategory => self.category_id.as_deref(),
        }
    }

    pub fn is_live(&self) -> bool {
        !self.status.is_deleted()
    }
}

impl Identified for CatalogNode {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Indexed for CatalogNode {
    fn index(&self) -> usize {
        self.index
    }

    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

/// Input accepted when adding a catalog node
#[derive(Debug, Clone, Validate)]
pub struct NewCatalogNode {
    #[validate(length(
        min = 1,
        max = 15,
        message = "Name must be between 1 and 15 characters"
    ))]
    pub name: String,
    #[validate(length(min = 1, message = "Creator is required"))]
    pub created_by: String,
    pub family_id: Option<String>,
    pub category_id: Option<String>,
}

impl NewCatalogNode {
    pub fn family(name: impl Into<String>, created_by: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_by: created_by.into(),
            family_id: None,
            category_id: None,
        }
    }

    pub fn category(
        name: impl Into<String>,
        created_by: impl Into<String>,
        family_id: impl Into<String>,
    ) -> Self {
        Self {
            family_id: Some(family_id.into()),
            ..Self::family(name, created_by)
        }
    }

    pub fn sub_category(
        name: impl Into<String>,
        created_by: impl Into<String>,
        family_id: impl Into<String>,
        category_id: impl Into<String>,
    ) -> Self {
        Self {
            category_id: Some(category_id.into()),
            ..Self::category(name, created_by, family_id)
        }
    }

    /// Parent identifier relevant for `level`
    pub fn parent_id(&self, level: CatalogLevel) -> Option<&str> {
        match level {
            CatalogLevel::Family => None,
            CatalogLevel::Category => self.family_id.as_deref(),
            CatalogLevel::SubCategory => self.category_id.as_deref(),
        }
    }
}

/// Document body written when a node is created
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogNodeWrite {
    pub id: String,
    pub name: String,
    pub index: usize,
    pub created_by: String,
    pub updated_by: String,
    pub status: NodeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl CatalogNodeWrite {
    /// New nodes are published at the end of their scope
    pub fn from_new(id: impl Into<String>, index: usize, node: NewCatalogNode) -> Self {
        Self {
            id: id.into(),
            name: node.name,
            index,
            updated_by: node.created_by.clone(),
            created_by: node.created_by,
            status: NodeStatus::Published,
            family_id: node.family_id,
            category_id: node.category_id,
        }
    }
}

/// Partial update of a catalog node
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl CatalogPatch {
    pub fn rename(name: impl Into<String>, updated_by: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            updated_by: Some(updated_by.into()),
            ..Self::default()
        }
    }

    pub fn reindex(index: usize, updated_by: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            updated_by: Some(updated_by.into()),
            ..Self::default()
        }
    }

    pub fn status(status: NodeStatus, updated_by: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            updated_by: Some(updated_by.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_from_new_copies_creator() {
        let write = CatalogNodeWrite::from_new("f1", 2, NewCatalogNode::family("Shirts", "ana"));
        assert_eq!(write.updated_by, "ana");
        assert_eq!(write.index, 2);
        assert_eq!(write.status, NodeStatus::Published);
    }

    #[test]
    fn test_family_write_omits_parent_fields() {
        let write = CatalogNodeWrite::from_new("f1", 0, NewCatalogNode::family("Shirts", "ana"));
        let value = serde_json::to_value(write).unwrap();
        assert!(value.get("familyId").is_none());
        assert!(value.get("categoryId").is_none());
    }

    #[test]
    fn test_name_length_validation() {
        assert!(NewCatalogNode::family("", "ana").validate().is_err());
        assert!(NewCatalogNode::family("a".repeat(16), "ana").validate().is_err());
        assert!(NewCatalogNode::family("Shirts", "ana").validate().is_ok());
    }

    #[test]
    fn test_parent_scope_per_level() {
        let node = NewCatalogNode::sub_category("Tees", "ana", "f1", "c1");
        assert_eq!(node.parent_id(CatalogLevel::Family), None);
        assert_eq!(node.parent_id(CatalogLevel::Category), Some("f1"));
        assert_eq!(node.parent_id(CatalogLevel::SubCategory), Some("c1"));
    }
}
