//! Staff role records and related types.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::{ROLE_ADMIN, ROLE_MANAGER, ROLE_PRINTING, ROLE_SHIPPING, ROLE_STAFF};
use crate::error::DomainError;
use crate::record::Identified;

/// Role labels assignable to staff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Manager,
    Staff,
    Printing,
    Shipping,
}

impl StaffRole {
    pub const ALL: [StaffRole; 4] = [
        StaffRole::Manager,
        StaffRole::Staff,
        StaffRole::Printing,
        StaffRole::Shipping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Manager => ROLE_MANAGER,
            StaffRole::Staff => ROLE_STAFF,
            StaffRole::Printing => ROLE_PRINTING,
            StaffRole::Shipping => ROLE_SHIPPING,
        }
    }
}

impl FromStr for StaffRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_MANAGER => Ok(StaffRole::Manager),
            ROLE_STAFF => Ok(StaffRole::Staff),
            ROLE_PRINTING => Ok(StaffRole::Printing),
            ROLE_SHIPPING => Ok(StaffRole::Shipping),
            other => Err(DomainError::validation(format!(
                "'{}' is not one of manager, staff, printing, shipping",
                other
            ))),
        }
    }
}

impl From<StaffRole> for String {
    fn from(role: StaffRole) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Staff member and the role assigned to them (`roles/{id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffRoleRecord {
    pub id: String,
    pub email: String,
    pub role: StaffRole,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StaffRoleRecord {
    /// Check if the staff member may currently act
    pub fn is_active(&self) -> bool {
        !self.disabled
    }
}

impl Identified for StaffRoleRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Payload written when a staff member is added
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewStaffRole {
    pub id: String,
    /// Staff email address
    #[validate(
        email(message = "Must Be a Valid Email Address"),
        length(max = 200, message = "Exceeding Max Character Limit of 200")
    )]
    pub email: String,
    pub role: StaffRole,
    pub disabled: bool,
}

impl NewStaffRole {
    /// New staff members start enabled
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: StaffRole) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role,
            disabled: false,
        }
    }
}

/// Partial update of a staff role record
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StaffRolePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        email(message = "Must Be a Valid Email Address"),
        length(max = 200, message = "Exceeding Max Character Limit of 200")
    )]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<StaffRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

impl StaffRolePatch {
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn role(role: StaffRole) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    pub fn disabled(disabled: bool) -> Self {
        Self {
            disabled: Some(disabled),
            ..Self::default()
        }
    }
}

/// Grant written to `admin/{id}` to promote an identity to administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminGrant {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl AdminGrant {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role: ROLE_ADMIN.to_string(),
        }
    }
}

/// Fields a role trigger reads from a written role or admin document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDocument {
    pub email: String,
    pub role: String,
}
