//! Capabilities shared by stored records.

/// Record addressable by its document identifier.
pub trait Identified {
    fn id(&self) -> &str;
}

/// Record carrying a dense, zero-based ordering key.
pub trait Indexed {
    fn index(&self) -> usize;

    fn set_index(&mut self, index: usize);
}

/// Generate a fresh document identifier.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
