//! Collection paths.

use std::fmt;

use common::{AppError, AppResult};

/// Slash separated path naming a collection, e.g. `meta/products/family`.
///
/// Collections alternate with documents, so a valid path always has an odd
/// number of non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(path: impl AsRef<str>) -> AppResult<Self> {
        let trimmed = path.as_ref().trim_matches('/');
        let segments: Vec<&str> = trimmed.split('/').collect();

        if trimmed.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(AppError::validation(format!(
                "'{}' is not a collection path",
                path.as_ref()
            )));
        }
        if segments.len() % 2 == 0 {
            return Err(AppError::validation(format!(
                "'{}' names a document, not a collection",
                path.as_ref()
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of a document inside this collection
    pub fn document(&self, id: &str) -> String {
        format!("{}/{}", self.0, id)
    }

    /// Last segment, e.g. `family` for `meta/products/family`
    pub fn collection_id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for CollectionPath {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
