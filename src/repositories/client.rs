//! # Client Repository
//!
//! Workspace-scoped client listing with search, and creation guarded by
//! per-workspace uniqueness of document and email.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::{PageRequest, contains_ignore_case};
use crate::error::RepositoryError;
use crate::models::{
    Client, Order,
    client::{self, Model as ClientModel},
    order,
};

/// Data for a new client; empty optional strings are already `None`
#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub name: String,
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A client row with the number of orders placed for it
#[derive(Debug, Clone, PartialEq)]
pub struct ClientWithOrderCount {
    pub client: ClientModel,
    pub orders_count: i64,
}

pub struct ClientRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ClientRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// List clients ordered by name, optionally filtered by a search term
    /// matched against name, email and document.
    ///
    /// Returns the page rows and the total number of matches.
    pub async fn list(
        &self,
        workspace_id: Uuid,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<ClientWithOrderCount>, u64), RepositoryError> {
        let mut query = Client::find().filter(client::Column::WorkspaceId.eq(workspace_id));

        if let Some(term) = search {
            query = query.filter(
                Condition::any()
                    .add(contains_ignore_case(client::Column::Name, term))
                    .add(contains_ignore_case(client::Column::Email, term))
                    .add(contains_ignore_case(client::Column::Document, term)),
            );
        }

        let rows = query
            .clone()
            .order_by_asc(client::Column::Name)
            .order_by_asc(client::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.db);
        let total = query.count(self.db);
        let (clients, total) = tokio::try_join!(rows, total)?;

        let ids: Vec<Uuid> = clients.iter().map(|c| c.id).collect();
        let counts = self.order_counts(&ids).await?;

        let clients = clients
            .into_iter()
            .map(|client| ClientWithOrderCount {
                orders_count: counts.get(&client.id).copied().unwrap_or(0),
                client,
            })
            .collect();

        Ok((clients, total))
    }

    /// Create a client after checking document and email are free in the workspace.
    pub async fn create(
        &self,
        workspace_id: Uuid,
        new_client: NewClient,
    ) -> Result<ClientModel, RepositoryError> {
        if let Some(document) = new_client.document.as_deref() {
            if self
                .exists(workspace_id, client::Column::Document, document)
                .await?
            {
                return Err(RepositoryError::conflict(
                    "A client with this document already exists",
                ));
            }
        }

        if let Some(email) = new_client.email.as_deref() {
            if self
                .exists(workspace_id, client::Column::Email, email)
                .await?
            {
                return Err(RepositoryError::conflict(
                    "A client with this email already exists",
                ));
            }
        }

        let client = client::ActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(workspace_id),
            name: Set(new_client.name),
            document: Set(new_client.document),
            email: Set(new_client.email),
            phone: Set(new_client.phone),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db)
        .await?;

        Ok(client)
    }

    async fn exists(
        &self,
        workspace_id: Uuid,
        column: client::Column,
        value: &str,
    ) -> Result<bool, RepositoryError> {
        let count = Client::find()
            .filter(client::Column::WorkspaceId.eq(workspace_id))
            .filter(column.eq(value))
            .count(self.db)
            .await?;
        Ok(count > 0)
    }

    async fn order_counts(&self, client_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>, RepositoryError> {
        if client_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = Order::find()
            .select_only()
            .column(order::Column::ClientId)
            .column_as(order::Column::Id.count(), "orders_count")
            .filter(order::Column::ClientId.is_in(client_ids.iter().copied()))
            .group_by(order::Column::ClientId)
            .into_tuple()
            .all(self.db)
            .await?;

        Ok(rows.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use crate::repositories::test_support::{create_workspace, setup_db};

    fn named(name: &str) -> NewClient {
        NewClient {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn list_orders_by_name_and_paginates() {
        let db = setup_db().await;
        let ws = create_workspace(&db, "Loja").await;
        let repo = ClientRepository::new(&db);

        for name in ["Carla", "Ana", "Bruno"] {
            repo.create(ws, named(name)).await.unwrap();
        }

        let (first, total) = repo
            .list(ws, None, PageRequest { page: 1, limit: 2 })
            .await
            .unwrap();
        assert_eq!(total, 3);
        let names: Vec<_> = first.iter().map(|c| c.client.name.as_str()).collect();
        assert_eq!(names, ["Ana", "Bruno"]);

        let (second, _) = repo
            .list(ws, None, PageRequest { page: 2, limit: 2 })
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].client.name, "Carla");
    }

    #[tokio::test]
    async fn search_matches_name_email_and_document_ignoring_case() {
        let db = setup_db().await;
        let ws = create_workspace(&db, "Loja").await;
        let repo = ClientRepository::new(&db);

        repo.create(
            ws,
            NewClient {
                name: "Maria Silva".to_string(),
                email: Some("maria@exemplo.com".to_string()),
                document: Some("123.456.789-00".to_string()),
                phone: None,
            },
        )
        .await
        .unwrap();
        repo.create(ws, named("João Pereira")).await.unwrap();

        for term in ["SILVA", "maria@", "456.789"] {
            let (rows, total) = repo
                .list(ws, Some(term), PageRequest::default())
                .await
                .unwrap();
            assert_eq!(total, 1, "term {term}");
            assert_eq!(rows[0].client.name, "Maria Silva");
        }
    }

    #[tokio::test]
    async fn duplicate_document_or_email_in_workspace_conflicts() {
        let db = setup_db().await;
        let ws = create_workspace(&db, "Loja").await;
        let other_ws = create_workspace(&db, "Outra").await;
        let repo = ClientRepository::new(&db);

        let client = NewClient {
            name: "Maria".to_string(),
            document: Some("111".to_string()),
            email: Some("maria@exemplo.com".to_string()),
            phone: None,
        };
        repo.create(ws, client.clone()).await.unwrap();

        let err = repo.create(ws, client.clone()).await.unwrap_err();
        assert!(
            matches!(err, RepositoryError::Conflict(ref msg) if msg.contains("document")),
            "{err:?}"
        );

        let err = repo
            .create(
                ws,
                NewClient {
                    document: Some("222".to_string()),
                    ..client.clone()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(ref msg) if msg.contains("email")));

        repo.create(other_ws, client).await.unwrap();
    }

    #[tokio::test]
    async fn list_reports_orders_count_and_isolates_workspaces() {
        let db = setup_db().await;
        let ws = create_workspace(&db, "Loja").await;
        let other_ws = create_workspace(&db, "Outra").await;
        let repo = ClientRepository::new(&db);

        let client = repo.create(ws, named("Ana")).await.unwrap();
        repo.create(other_ws, named("Intrusa")).await.unwrap();

        for _ in 0..2 {
            order::ActiveModel {
                id: Set(Uuid::new_v4()),
                workspace_id: Set(ws),
                client_id: Set(client.id),
                status: Set(OrderStatus::Budget),
                total_amount: Set(0.0),
                notes: Set(None),
                created_at: Set(Utc::now().into()),
            }
            .insert(&db)
            .await
            .unwrap();
        }

        let (rows, total) = repo.list(ws, None, PageRequest::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].orders_count, 2);
    }
}
