//! # Transaction Repository
//!
//! Financial ledger entries, listed by due date.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::PageRequest;
use crate::error::RepositoryError;
use crate::models::{
    Client, Order, Transaction, TransactionStatus, TransactionType, client, order,
    transaction::{self, Model as TransactionModel},
};

/// Filters for [`TransactionRepository::list`]
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    /// Inclusive lower bound on the due date
    pub due_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the due date
    pub due_to: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the due date
    pub due_before: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub category: Option<String>,
    pub due_date: DateTime<Utc>,
    pub order_id: Option<Uuid>,
}

/// The order a transaction came from, with its client's name
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedOrder {
    pub id: Uuid,
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub transaction: TransactionModel,
    pub order: Option<LinkedOrder>,
}

pub struct TransactionRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TransactionRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// List transactions ordered by due date, soonest first.
    pub async fn list(
        &self,
        workspace_id: Uuid,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<TransactionRow>, u64), RepositoryError> {
        let mut query =
            Transaction::find().filter(transaction::Column::WorkspaceId.eq(workspace_id));

        if let Some(kind) = filter.kind {
            query = query.filter(transaction::Column::Kind.eq(kind));
        }
        if let Some(status) = filter.status {
            query = query.filter(transaction::Column::Status.eq(status));
        }
        if let Some(from) = filter.due_from {
            query = query.filter(transaction::Column::DueDate.gte(from.fixed_offset()));
        }
        if let Some(to) = filter.due_to {
            query = query.filter(transaction::Column::DueDate.lte(to.fixed_offset()));
        }
        if let Some(before) = filter.due_before {
            query = query.filter(transaction::Column::DueDate.lt(before.fixed_offset()));
        }

        let rows = query
            .clone()
            .order_by_asc(transaction::Column::DueDate)
            .order_by_asc(transaction::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .find_also_related(Order)
            .all(self.db);
        let total = query.count(self.db);
        let (rows, total) = tokio::try_join!(rows, total)?;

        let client_ids: Vec<Uuid> = rows
            .iter()
            .filter_map(|(_, order)| order.as_ref().map(|o| o.client_id))
            .collect();
        let client_names = self.client_names(&client_ids).await?;

        let rows = rows
            .into_iter()
            .map(|(transaction, order)| TransactionRow {
                transaction,
                order: order.map(|order| LinkedOrder {
                    id: order.id,
                    client_name: client_names.get(&order.client_id).cloned(),
                }),
            })
            .collect();

        Ok((rows, total))
    }

    /// Record a transaction. A linked order must belong to the workspace;
    /// entries created as `PAID` are stamped with the payment time.
    pub async fn create(
        &self,
        workspace_id: Uuid,
        new_transaction: NewTransaction,
    ) -> Result<TransactionModel, RepositoryError> {
        if !new_transaction.amount.is_finite() || new_transaction.amount <= 0.0 {
            return Err(RepositoryError::validation_error(
                "Amount must be greater than zero",
            ));
        }

        if let Some(order_id) = new_transaction.order_id {
            let order = Order::find_by_id(order_id)
                .filter(order::Column::WorkspaceId.eq(workspace_id))
                .one(self.db)
                .await?;
            if order.is_none() {
                return Err(RepositoryError::not_found("Order not found"));
            }
        }

        let now = Utc::now();
        let paid_at = (new_transaction.status == TransactionStatus::Paid).then(|| now.fixed_offset());

        let transaction = transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(workspace_id),
            order_id: Set(new_transaction.order_id),
            description: Set(new_transaction.description),
            amount: Set(new_transaction.amount),
            kind: Set(new_transaction.kind),
            status: Set(new_transaction.status),
            category: Set(new_transaction.category),
            due_date: Set(new_transaction.due_date.into()),
            paid_at: Set(paid_at),
            created_at: Set(now.into()),
        }
        .insert(self.db)
        .await?;

        Ok(transaction)
    }

    async fn client_names(&self, client_ids: &[Uuid]) -> Result<HashMap<Uuid, String>, RepositoryError> {
        if client_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, String)> = Client::find()
            .select_only()
            .column(client::Column::Id)
            .column(client::Column::Name)
            .filter(client::Column::Id.is_in(client_ids.iter().copied()))
            .into_tuple()
            .all(self.db)
            .await?;

        Ok(rows.into_iter().collect())
    }
}
