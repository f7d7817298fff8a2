//! Migration to create the clients table.
//!
//! Document and email are optional but unique within a workspace.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Clients::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Clients::WorkspaceId).uuid().not_null())
                    .col(ColumnDef::new(Clients::Name).text().not_null())
                    .col(ColumnDef::new(Clients::Document).text().null())
                    .col(ColumnDef::new(Clients::Email).text().null())
                    .col(ColumnDef::new(Clients::Phone).text().null())
                    .col(
                        ColumnDef::new(Clients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clients_workspace_id")
                            .from(Clients::Table, Clients::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // NULLs never collide, so optional fields stay optional
        manager
            .create_index(
                Index::create()
                    .name("idx_clients_workspace_document")
                    .table(Clients::Table)
                    .col(Clients::WorkspaceId)
                    .col(Clients::Document)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_clients_workspace_email")
                    .table(Clients::Table)
                    .col(Clients::WorkspaceId)
                    .col(Clients::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_clients_workspace_name")
                    .table(Clients::Table)
                    .col(Clients::WorkspaceId)
                    .col(Clients::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_clients_workspace_document",
            "idx_clients_workspace_email",
            "idx_clients_workspace_name",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        manager
            .drop_table(Table::drop().table(Clients::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Clients {
    Table,
    Id,
    WorkspaceId,
    Name,
    Document,
    Email,
    Phone,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Workspaces {
    Table,
    Id,
}
