//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Roles
// =============================================================================

/// Claim value granted to administrators
pub const ROLE_ADMIN: &str = "admin";

pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_STAFF: &str = "staff";
pub const ROLE_PRINTING: &str = "printing";
pub const ROLE_SHIPPING: &str = "shipping";

/// Role labels that may be assigned to staff members
pub const STAFF_ROLES: &[&str] = &[ROLE_MANAGER, ROLE_STAFF, ROLE_PRINTING, ROLE_SHIPPING];

/// Role labels accepted by the admin trigger
pub const ADMIN_ROLES: &[&str] = &[ROLE_ADMIN];

/// Name of the custom claim carrying the role label
pub const ROLE_CLAIM: &str = "role";

/// Check if a role value is a valid staff role
pub fn is_staff_role(role: &str) -> bool {
    STAFF_ROLES.contains(&role)
}

// =============================================================================
// Collections
// =============================================================================

pub const ROLES_COLLECTION: &str = "roles";
pub const ADMIN_COLLECTION: &str = "admin";
pub const FAMILY_COLLECTION: &str = "meta/products/family";
pub const CATEGORY_COLLECTION: &str = "meta/products/category";
pub const SUB_CATEGORY_COLLECTION: &str = "meta/products/sub_category";

/// Server-assigned creation timestamp field
pub const FIELD_CREATED_AT: &str = "createdAt";

/// Server-assigned modification timestamp field
pub const FIELD_UPDATED_AT: &str = "updatedAt";

// =============================================================================
// Limits & validation
// =============================================================================

/// Maximum families in the catalog
pub const DEFAULT_FAMILY_LIMIT: usize = 4;

/// Maximum categories per family
pub const DEFAULT_CATEGORY_LIMIT: usize = 10;

/// Maximum sub-categories per category
pub const DEFAULT_SUB_CATEGORY_LIMIT: usize = 10;

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// Messages
// =============================================================================

/// Fallback message for failures that carry no provider detail
pub const DEFAULT_ERROR_MESSAGE: &str =
    "Something Has Gone Wrong Maybe! Sorry For the Inconvenience.";

pub const SIGN_OUT_MESSAGE: &str = "Signed Out Successfully";

// =============================================================================
// Geography lookup
// =============================================================================

pub const COUNTRIES_API_URL: &str = "https://countriesnow.space/api/v0.1/countries/positions";
pub const STATES_API_URL: &str = "https://countriesnow.space/api/v0.1/countries/states";
pub const CITIES_API_URL: &str = "https://countriesnow.space/api/v0.1/countries/state/cities";
