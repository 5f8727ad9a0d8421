//! Domain layer - Core records, roles and pure business rules.
//!
//! This crate has no infrastructure dependencies. Store, identity and client
//! crates all build on the types defined here.

pub mod catalog;
pub mod constants;
pub mod error;
pub mod gate;
pub mod identity;
pub mod record;
pub mod reorder;
pub mod staff;

pub use catalog::{
    CatalogLevel, CatalogNode, CatalogNodeWrite, CatalogPatch, NewCatalogNode, NodeStatus,
};
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use gate::{AdminGate, ClaimLookup, GateView};
pub use identity::{AdminUserState, CustomClaims, IdTokenResult, Identity, TokenClaims};
pub use record::{new_document_id, Identified, Indexed};
pub use reorder::reorder;
pub use staff::{AdminGrant, NewStaffRole, RoleDocument, StaffRole, StaffRolePatch, StaffRoleRecord};
