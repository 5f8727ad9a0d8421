//! Stored documents, writes and change events.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use common::{AppError, AppResult};
use domain::{FIELD_CREATED_AT, FIELD_UPDATED_AT};

use crate::path::CollectionPath;

/// Top-level fields of a document
pub type Fields = Map<String, Value>;

/// A document read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: String,
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(path: impl Into<String>, id: impl Into<String>, fields: Fields) -> Self {
        Self {
            path: path.into(),
            id: id.into(),
            fields,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(FIELD_CREATED_AT)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(FIELD_UPDATED_AT)
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    /// Decode into a typed record. The document id fills a missing `id` field.
    pub fn decode<T: DeserializeOwned>(&self) -> AppResult<T> {
        let mut fields = self.fields.clone();
        fields
            .entry("id".to_string())
            .or_insert_with(|| Value::String(self.id.clone()));

        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            AppError::Decode(format!("{}/{}: {}", self.path, self.id, e))
        })
    }
}

/// Serialise a payload into document fields, dropping server-assigned stamps.
pub fn to_fields<P: serde::Serialize + ?Sized>(payload: &P) -> AppResult<Fields> {
    match serde_json::to_value(payload)? {
        Value::Object(mut fields) => {
            fields.remove(FIELD_CREATED_AT);
            fields.remove(FIELD_UPDATED_AT);
            Ok(fields)
        }
        other => Err(AppError::validation(format!(
            "document payload must be an object, got {}",
            other
        ))),
    }
}

/// Render a server timestamp. Fixed-width so string order is time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// One mutation inside an atomic commit
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create or overwrite; stamps both timestamps
    Set {
        path: CollectionPath,
        id: String,
        fields: Fields,
    },
    /// Merge into an existing document; stamps `updatedAt`
    Merge {
        path: CollectionPath,
        id: String,
        fields: Fields,
    },
    Delete { path: CollectionPath, id: String },
}

impl Write {
    pub fn path(&self) -> &CollectionPath {
        match self {
            Write::Set { path, .. } | Write::Merge { path, .. } | Write::Delete { path, .. } => {
                path
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Write::Set { id, .. } | Write::Merge { id, .. } | Write::Delete { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

/// Change published after a committed write
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEvent {
    pub kind: EventKind,
    pub path: CollectionPath,
    pub id: String,
    pub before: Option<Fields>,
    pub after: Option<Fields>,
}

impl DocumentEvent {
    /// Snapshot as written, the state before deletion for deletes
    pub fn snapshot(&self) -> Option<&Fields> {
        self.after.as_ref().or(self.before.as_ref())
    }
}

/// Apply `write` to the current state of its document.
///
/// Returns the new state (`None` for deletions) and the event to publish,
/// or a fault when a merge targets a missing document.
pub(crate) fn apply_write(
    write: &Write,
    current: Option<&Fields>,
    stamp: &str,
) -> Result<(Option<Fields>, Option<DocumentEvent>), common::ProviderFault> {
    match write {
        Write::Set { path, id, fields } => {
            let mut next = fields.clone();
            next.insert(FIELD_CREATED_AT.to_string(), Value::String(stamp.to_string()));
            next.insert(FIELD_UPDATED_AT.to_string(), Value::String(stamp.to_string()));
            let kind = if current.is_some() {
                EventKind::Updated
            } else {
                EventKind::Created
            };
            let event = DocumentEvent {
                kind,
                path: path.clone(),
                id: id.clone(),
                before: current.cloned(),
                after: Some(next.clone()),
            };
            Ok((Some(next), Some(event)))
        }
        Write::Merge { path, id, fields } => {
            let Some(existing) = current else {
                return Err(common::ProviderFault::coded(
                    "not-found",
                    format!("No document to update: {}", path.document(id)),
                ));
            };
            let mut next = existing.clone();
            for (key, value) in fields {
                next.insert(key.clone(), value.clone());
            }
            next.insert(FIELD_UPDATED_AT.to_string(), Value::String(stamp.to_string()));
            let event = DocumentEvent {
                kind: EventKind::Updated,
                path: path.clone(),
                id: id.clone(),
                before: Some(existing.clone()),
                after: Some(next.clone()),
            };
            Ok((Some(next), Some(event)))
        }
        Write::Delete { path, id } => {
            let event = current.map(|existing| DocumentEvent {
                kind: EventKind::Deleted,
                path: path.clone(),
                id: id.clone(),
                before: Some(existing.clone()),
                after: None,
            });
            Ok((None, event))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Named {
        id: String,
        name: String,
    }

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => Fields::new(),
        }
    }

    #[test]
    fn test_decode_fills_missing_id() {
        let doc = Document::new("roles", "r1", fields(json!({ "name": "x" })));
        let named: Named = doc.decode().unwrap();
        assert_eq!(named.id, "r1");
        assert_eq!(named.name, "x");
    }

    #[test]
    fn test_decode_failure_is_error() {
        let doc = Document::new("roles", "r1", fields(json!({ "name": 5 })));
        assert!(matches!(doc.decode::<Named>(), Err(AppError::Decode(_))));
    }

    #[test]
    fn test_to_fields_drops_server_stamps() {
        let payload = json!({ "name": "x", "createdAt": "then", "updatedAt": "then" });
        let fields = to_fields(&payload).unwrap();
        assert_eq!(fields.len(), 1);
        assert!(to_fields(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_merge_requires_existing_document() {
        let write = Write::Merge {
            path: CollectionPath::new("roles").unwrap(),
            id: "r1".to_string(),
            fields: fields(json!({ "disabled": true })),
        };
        assert!(apply_write(&write, None, "t").is_err());

        let existing = fields(json!({ "email": "a@x.com", "disabled": false, "createdAt": "t0" }));
        let (next, event) = apply_write(&write, Some(&existing), "t1").unwrap();
        let next = next.unwrap();
        assert_eq!(next["disabled"], json!(true));
        assert_eq!(next["email"], json!("a@x.com"));
        assert_eq!(next["createdAt"], json!("t0"));
        assert_eq!(next["updatedAt"], json!("t1"));
        assert_eq!(event.unwrap().kind, EventKind::Updated);
    }

    #[test]
    fn test_timestamps_sort_as_strings() {
        let earlier = Utc::now();
        let later = earlier + chrono::Duration::microseconds(1);
        assert!(format_timestamp(earlier) < format_timestamp(later));
    }
}
