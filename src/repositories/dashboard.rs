//! # Dashboard Repository
//!
//! Workspace aggregates for the landing dashboard. All queries are
//! independent and run concurrently.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use super::product::low_stock_condition;
use crate::error::RepositoryError;
use crate::models::{
    Client, Order, OrderStatus, Product, Transaction, TransactionStatus, TransactionType, client,
    order::{self, Model as OrderModel},
    product, transaction,
};

const RECENT_ORDERS: u64 = 5;

/// Aggregated figures for one workspace
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_clients: u64,
    pub total_products: u64,
    pub low_stock_products: u64,
    /// Sum of `SOLD` orders created this calendar month (UTC)
    pub current_month_revenue: f64,
    pub current_month_orders: i64,
    /// Pending `INCOME` transactions
    pub pending_receivables: f64,
    /// Pending `EXPENSE` transactions
    pub pending_payables: f64,
    pub recent_orders: Vec<(OrderModel, Option<client::Model>)>,
}

impl DashboardSummary {
    pub fn cash_flow(&self) -> f64 {
        self.pending_receivables - self.pending_payables
    }
}

/// `[first day of the month, first day of the next month)` in UTC.
pub fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let (year, month) = (now.year(), now.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    let end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    (start, end)
}

pub struct DashboardRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DashboardRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn summary(
        &self,
        workspace_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<DashboardSummary, RepositoryError> {
        let (month_start, month_end) = month_bounds(now);

        let total_clients = Client::find()
            .filter(client::Column::WorkspaceId.eq(workspace_id))
            .count(self.db);

        let total_products = Product::find()
            .filter(product::Column::WorkspaceId.eq(workspace_id))
            .count(self.db);

        let low_stock_products = Product::find()
            .filter(product::Column::WorkspaceId.eq(workspace_id))
            .filter(low_stock_condition())
            .count(self.db);

        let month_sales = Order::find()
            .select_only()
            .column_as(order::Column::TotalAmount.sum(), "revenue")
            .column_as(order::Column::Id.count(), "orders")
            .filter(order::Column::WorkspaceId.eq(workspace_id))
            .filter(order::Column::Status.eq(OrderStatus::Sold))
            .filter(order::Column::CreatedAt.gte(month_start.fixed_offset()))
            .filter(order::Column::CreatedAt.lt(month_end.fixed_offset()))
            .into_tuple::<(Option<f64>, i64)>()
            .one(self.db);

        let receivables = self.pending_total(workspace_id, TransactionType::Income);
        let payables = self.pending_total(workspace_id, TransactionType::Expense);

        let recent_orders = Order::find()
            .filter(order::Column::WorkspaceId.eq(workspace_id))
            .order_by_desc(order::Column::CreatedAt)
            .limit(RECENT_ORDERS)
            .find_also_related(Client)
            .all(self.db);

        let (
            total_clients,
            total_products,
            low_stock_products,
            month_sales,
            pending_receivables,
            pending_payables,
            recent_orders,
        ) = tokio::try_join!(
            async { total_clients.await.map_err(RepositoryError::from) },
            async { total_products.await.map_err(RepositoryError::from) },
            async { low_stock_products.await.map_err(RepositoryError::from) },
            async { month_sales.await.map_err(RepositoryError::from) },
            receivables,
            payables,
            async { recent_orders.await.map_err(RepositoryError::from) },
        )?;

        let (revenue, orders) = month_sales.unwrap_or((None, 0));

        Ok(DashboardSummary {
            total_clients,
            total_products,
            low_stock_products,
            current_month_revenue: revenue.unwrap_or(0.0),
            current_month_orders: orders,
            pending_receivables,
            pending_payables,
            recent_orders,
        })
    }

    async fn pending_total(
        &self,
        workspace_id: Uuid,
        kind: TransactionType,
    ) -> Result<f64, RepositoryError> {
        let total = Transaction::find()
            .select_only()
            .column_as(transaction::Column::Amount.sum(), "total")
            .filter(transaction::Column::WorkspaceId.eq(workspace_id))
            .filter(transaction::Column::Kind.eq(kind))
            .filter(transaction::Column::Status.eq(TransactionStatus::Pending))
            .into_tuple::<Option<f64>>()
            .one(self.db)
            .await?;

        Ok(total.flatten().unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{order, transaction};
    use crate::repositories::test_support::{create_workspace, setup_db};
    use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

    #[test]
    fn month_bounds_cover_whole_month() {
        let now = Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 59).unwrap();
        let (start, end) = month_bounds(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());

        let december = Utc.with_ymd_and_hms(2024, 12, 15, 8, 0, 0).unwrap();
        assert_eq!(
            month_bounds(december).1,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
    }

    async fn insert_client(db: &DatabaseConnection, ws: Uuid, name: &str) -> Uuid {
        client::ActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(ws),
            name: Set(name.to_string()),
            document: Set(None),
            email: Set(None),
            phone: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    async fn insert_order(
        db: &DatabaseConnection,
        ws: Uuid,
        client_id: Uuid,
        status: OrderStatus,
        total: f64,
        created_at: DateTime<Utc>,
    ) {
        order::ActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(ws),
            client_id: Set(client_id),
            status: Set(status),
            total_amount: Set(total),
            notes: Set(None),
            created_at: Set(created_at.into()),
        }
        .insert(db)
        .await
        .unwrap();
    }

    async fn insert_transaction(
        db: &DatabaseConnection,
        ws: Uuid,
        kind: TransactionType,
        status: TransactionStatus,
        amount: f64,
    ) {
        transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(ws),
            order_id: Set(None),
            description: Set("entry".to_string()),
            amount: Set(amount),
            kind: Set(kind),
            status: Set(status),
            category: Set(None),
            due_date: Set(Utc::now().into()),
            paid_at: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn empty_workspace_reports_zeroes() {
        let db = setup_db().await;
        let ws = create_workspace(&db, "Loja").await;

        let summary = DashboardRepository::new(&db)
            .summary(ws, Utc::now())
            .await
            .unwrap();

        assert_eq!(summary.total_clients, 0);
        assert_eq!(summary.current_month_revenue, 0.0);
        assert_eq!(summary.current_month_orders, 0);
        assert_eq!(summary.cash_flow(), 0.0);
        assert!(summary.recent_orders.is_empty());
    }

    #[tokio::test]
    async fn aggregates_current_month_sales_and_pending_cash_flow() {
        let db = setup_db().await;
        let ws = create_workspace(&db, "Loja").await;
        let other_ws = create_workspace(&db, "Outra").await;
        let now = Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0).unwrap();

        let ana = insert_client(&db, ws, "Ana").await;
        let intrusa = insert_client(&db, other_ws, "Intrusa").await;

        let may = Utc.with_ymd_and_hms(2025, 5, 2, 9, 0, 0).unwrap();
        let april = Utc.with_ymd_and_hms(2025, 4, 30, 23, 0, 0).unwrap();
        insert_order(&db, ws, ana, OrderStatus::Sold, 300.0, may).await;
        insert_order(&db, ws, ana, OrderStatus::Sold, 200.0, may).await;
        insert_order(&db, ws, ana, OrderStatus::Budget, 999.0, may).await;
        insert_order(&db, ws, ana, OrderStatus::Sold, 50.0, april).await;
        insert_order(&db, other_ws, intrusa, OrderStatus::Sold, 1000.0, may).await;

        insert_transaction(&db, ws, TransactionType::Income, TransactionStatus::Pending, 700.0).await;
        insert_transaction(&db, ws, TransactionType::Income, TransactionStatus::Paid, 80.0).await;
        insert_transaction(&db, ws, TransactionType::Expense, TransactionStatus::Pending, 250.0).await;

        let summary = DashboardRepository::new(&db).summary(ws, now).await.unwrap();

        assert_eq!(summary.total_clients, 1);
        assert_eq!(summary.current_month_revenue, 500.0);
        assert_eq!(summary.current_month_orders, 2);
        assert_eq!(summary.pending_receivables, 700.0);
        assert_eq!(summary.pending_payables, 250.0);
        assert_eq!(summary.cash_flow(), 450.0);
        assert_eq!(summary.recent_orders.len(), 4);
        assert!(summary
            .recent_orders
            .iter()
            .all(|(_, client)| client.as_ref().map(|c| c.name.as_str()) == Some("Ana")));
    }
}
