//! Document database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::ProviderFault;

use crate::document::{Document, Fields};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub path: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub doc_id: String,
    /// JSON object holding every field, server stamps included
    #[sea_orm(column_type = "Text")]
    pub fields: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn parse_fields(&self) -> Result<Fields, ProviderFault> {
        serde_json::from_str(&self.fields).map_err(|e| {
            ProviderFault::coded(
                "data-loss",
                format!("{}/{} holds unreadable fields: {}", self.path, self.doc_id, e),
            )
        })
    }

    pub fn into_document(self) -> Result<Document, ProviderFault> {
        let fields = self.parse_fields()?;
        Ok(Document::new(self.path, self.doc_id, fields))
    }
}
