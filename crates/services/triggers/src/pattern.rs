//! Document path patterns such as `roles/{docId}`.

use std::collections::HashMap;

use common::{AppError, AppResult};
use store_lib::CollectionPath;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wildcard(String),
}

/// Pattern over document paths; `{name}` segments capture one path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> AppResult<Self> {
        let trimmed = pattern.trim_matches('/');
        let segments = trimmed
            .split('/')
            .map(|s| {
                if s.is_empty() {
                    Err(AppError::validation(format!("empty segment in '{}'", pattern)))
                } else if let Some(name) = s.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
                    Ok(Segment::Wildcard(name.to_string()))
                } else {
                    Ok(Segment::Literal(s.to_string()))
                }
            })
            .collect::<AppResult<Vec<_>>>()?;

        if segments.len() % 2 != 0 {
            return Err(AppError::validation(format!(
                "'{}' must name documents, not collections",
                pattern
            )));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Captured parameters when the document `collection/id` matches
    pub fn matches(&self, collection: &CollectionPath, id: &str) -> Option<HashMap<String, String>> {
        let document = collection.document(id);
        let parts: Vec<&str> = document.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Wildcard(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}
