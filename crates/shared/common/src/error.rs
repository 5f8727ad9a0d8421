//! Unified application error.
//!
//! Every public operation in the workspace fails with an [`AppError`]. Each
//! variant maps onto the uniform `{ code, name, message, severity }` object
//! that callers display or store in an error holder.

use domain::{DomainError, DEFAULT_ERROR_MESSAGE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code used for failures raised by this application rather than a provider
pub const DEFAULT_CODE: &str = "Unknown/Default";

/// How loudly a failure should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Expected outcome, e.g. a missing document
    Info,
    Error,
    Fatal,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Error => f.write_str("error"),
            Severity::Fatal => f.write_str("fatal"),
        }
    }
}

/// Serialisable failure representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: String,
    pub name: String,
    pub message: String,
    pub severity: Severity,
}

/// Application error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    // Backend failures
    #[error("{code}: {message}")]
    Provider {
        code: String,
        name: String,
        message: String,
        severity: Severity,
    },

    #[error("{name}: {message}")]
    Unknown {
        name: String,
        message: String,
        severity: Severity,
    },

    // Resource errors
    #[error("This Specific Document Cannot be Found")]
    DocumentNotFound,

    #[error("{name}: {message}")]
    Conflict {
        code: String,
        name: String,
        message: String,
        severity: Severity,
    },

    // Input
    #[error("Wrong inputs: {0}")]
    WrongInput(String),

    #[error("{0}")]
    Validation(String),

    #[error("Document does not match the expected shape: {0}")]
    Decode(String),

    // Authentication & Authorization
    #[error("Authentication required")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Operation cancelled")]
    Cancelled,

    // External service errors
    #[error("{name}: {message}")]
    External { name: String, message: String },

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &str {
        match self {
            AppError::Provider { code, .. } | AppError::Conflict { code, .. } => code,
            AppError::Unknown { .. } | AppError::WrongInput(_) | AppError::External { .. } => {
                DEFAULT_CODE
            }
            AppError::DocumentNotFound => "Document/Resource Not Found",
            AppError::Validation(_) => "Validation",
            AppError::Decode(_) => "Decode",
            AppError::Unauthorized => "Unauthorized",
            AppError::Forbidden => "Forbidden",
            AppError::Cancelled => "Cancelled",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Short human readable label
    pub fn name(&self) -> &str {
        match self {
            AppError::Provider { name, .. }
            | AppError::Unknown { name, .. }
            | AppError::Conflict { name, .. }
            | AppError::External { name, .. } => name,
            AppError::DocumentNotFound => "No Document",
            AppError::WrongInput(_) => "Wrong Inputs",
            AppError::Validation(_) => "Invalid Input",
            AppError::Decode(_) => "Malformed Document",
            AppError::Unauthorized => "Not Signed In",
            AppError::Forbidden => "Not An Admin",
            AppError::Cancelled => "Cancelled",
            AppError::Internal(_) => "Internal Error",
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn message(&self) -> String {
        match self {
            AppError::Provider { message, .. }
            | AppError::Unknown { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::External { message, .. } => message.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::WrongInput(_) => {
                "The Given Inputs Are Wrong or An Unknown Error Occurred for Client".to_string()
            }
            AppError::Decode(detail) => {
                tracing::error!("Decode error: {}", detail);
                DEFAULT_ERROR_MESSAGE.to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                DEFAULT_ERROR_MESSAGE.to_string()
            }
            _ => self.to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AppError::Provider { severity, .. }
            | AppError::Unknown { severity, .. }
            | AppError::Conflict { severity, .. } => *severity,
            AppError::DocumentNotFound | AppError::Validation(_) | AppError::Cancelled => {
                Severity::Info
            }
            AppError::Internal(_) => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Expected outcomes are not surfaced as failures
    pub fn is_info(&self) -> bool {
        self.severity() == Severity::Info
    }

    pub fn to_object(&self) -> ErrorObject {
        ErrorObject {
            code: self.code().to_string(),
            name: self.name().to_string(),
            message: self.message(),
            severity: self.severity(),
        }
    }
}

impl From<&AppError> for ErrorObject {
    fn from(err: &AppError) -> Self {
        err.to_object()
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(msg),
            DomainError::WrongInput(msg) => AppError::WrongInput(msg),
            DomainError::NotFound(_) => AppError::DocumentNotFound,
            DomainError::Conflict(msg) => AppError::Conflict {
                code: "Conflict".to_string(),
                name: "Conflict".to_string(),
                message: msg,
                severity: Severity::Info,
            },
            DomainError::Decode(msg) => AppError::Decode(msg),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::DocumentNotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn conflict(
        code: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        AppError::Conflict {
            code: code.into(),
            name: name.into(),
            message: message.into(),
            severity,
        }
    }

    /// Naming collision or scope limit when adding a catalog node
    pub fn conflict_or_limit() -> Self {
        Self::conflict(
            "Conflict/Limit",
            "Naming Conflict/Limit",
            "Naming Conflicts or Limit of Documents has Exceeded",
            Severity::Info,
        )
    }

    /// A staff role with this email already exists
    pub fn duplicate_email() -> Self {
        Self::conflict(
            "Duplicate Field",
            "Duplicate Email",
            "The Email is Already Taken",
            Severity::Info,
        )
    }

    pub fn unknown(name: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        AppError::Unknown {
            name: name.into(),
            message: message.into(),
            severity,
        }
    }

    /// Failure of an external lookup, shown with the default message
    pub fn external(name: impl Into<String>) -> Self {
        AppError::External {
            name: name.into(),
            message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

// =============================================================================
// Provider faults
// =============================================================================

/// Raw failure reported by a store or identity backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderFault {
    /// Failure carrying a provider error code
    #[error("{code}: {message}")]
    Coded { code: String, message: String },

    /// Anything the provider could not classify
    #[error("{0}")]
    Unclassified(String),
}

impl ProviderFault {
    pub fn coded(code: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderFault::Coded {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unclassified(msg: impl Into<String>) -> Self {
        ProviderFault::Unclassified(msg.into())
    }
}

#[cfg(feature = "database")]
impl From<sea_orm::DbErr> for ProviderFault {
    fn from(err: sea_orm::DbErr) -> Self {
        match &err {
            sea_orm::DbErr::RecordNotFound(msg) => ProviderFault::coded("store/not-found", msg),
            sea_orm::DbErr::RecordNotInserted | sea_orm::DbErr::RecordNotUpdated => {
                ProviderFault::coded("store/aborted", err.to_string())
            }
            sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_) => {
                ProviderFault::coded("store/unavailable", err.to_string())
            }
            _ => ProviderFault::unclassified(err.to_string()),
        }
    }
}

/// Normalises provider faults into application errors
#[derive(Debug, Clone)]
pub struct ErrorMapper {
    default_message: String,
}

impl ErrorMapper {
    pub fn new(default_message: impl Into<String>) -> Self {
        Self {
            default_message: default_message.into(),
        }
    }

    /// Known codes pass through, anything else becomes the default error
    pub fn map(&self, fault: ProviderFault, severity: Severity) -> AppError {
        match fault {
            ProviderFault::Coded { code, message } => AppError::Provider {
                code,
                name: "ProviderError".to_string(),
                message,
                severity,
            },
            ProviderFault::Unclassified(detail) => {
                tracing::debug!("Unclassified provider failure: {}", detail);
                AppError::unknown("Unknown", self.default_message.clone(), severity)
            }
        }
    }

    pub fn default_message(&self) -> &str {
        &self.default_message
    }
}

impl Default for ErrorMapper {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_MESSAGE)
    }
}
