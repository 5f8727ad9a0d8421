//! Migration: Create the documents table backing every collection.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Documents::Path).string().not_null())
                    .col(ColumnDef::new(Documents::DocId).string().not_null())
                    .col(ColumnDef::new(Documents::Fields).text().not_null())
                    .col(ColumnDef::new(Documents::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Documents::UpdatedAt).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(Documents::Path)
                            .col(Documents::DocId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_documents_path")
                    .table(Documents::Table)
                    .col(Documents::Path)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Documents::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Documents {
    Table,
    Path,
    DocId,
    Fields,
    CreatedAt,
    UpdatedAt,
}
