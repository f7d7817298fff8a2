//! # Transactions API Handlers
//!
//! Receivables and payables. Date filters accept RFC 3339 timestamps or
//! bare `YYYY-MM-DD` days; a bare `endDate` includes that whole day.

use axum::{
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use chrono::Duration;
use metrics::counter;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::WorkspaceContext;
use crate::error::{ApiError, bad_request};
use crate::handlers::types::{DateParam, PageQuery, Pagination, non_blank, parse_enum, parse_uuid};
use crate::models::{TransactionStatus, TransactionType, transaction};
use crate::repositories::{
    TransactionRepository,
    transaction::{NewTransaction, TransactionFilter, TransactionRow},
};
use crate::server::AppState;

/// Query parameters for listing transactions
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListTransactionsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// INCOME or EXPENSE
    #[serde(rename = "type")]
    #[param(rename = "type")]
    pub kind: Option<String>,
    /// PENDING, PAID or OVERDUE
    pub status: Option<String>,
    /// Earliest due date (inclusive)
    pub start_date: Option<String>,
    /// Latest due date (inclusive)
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[schema(example = "Venda balcão")]
    pub description: Option<String>,
    #[schema(example = 150.0)]
    pub amount: Option<f64>,
    /// INCOME or EXPENSE
    #[serde(rename = "type")]
    #[schema(example = "INCOME")]
    pub kind: Option<String>,
    /// RFC 3339 or YYYY-MM-DD
    #[schema(example = "2025-06-30")]
    pub due_date: Option<String>,
    pub category: Option<String>,
    pub order_id: Option<String>,
    /// PENDING (default), PAID or OVERDUE
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderClientRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionOrderRef {
    pub id: String,
    pub client: OrderClientRef,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: String,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub category: Option<String>,
    pub due_date: String,
    pub paid_at: Option<String>,
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<TransactionOrderRef>,
    pub created_at: String,
}

impl From<transaction::Model> for TransactionDto {
    fn from(transaction: transaction::Model) -> Self {
        Self {
            id: transaction.id.to_string(),
            description: transaction.description,
            amount: transaction.amount,
            kind: transaction.kind,
            status: transaction.status,
            category: transaction.category,
            due_date: transaction.due_date.to_rfc3339(),
            paid_at: transaction.paid_at.map(|at| at.to_rfc3339()),
            order_id: transaction.order_id.map(|id| id.to_string()),
            order: None,
            created_at: transaction.created_at.to_rfc3339(),
        }
    }
}

impl From<TransactionRow> for TransactionDto {
    fn from(row: TransactionRow) -> Self {
        Self {
            order: row.order.map(|order| TransactionOrderRef {
                id: order.id.to_string(),
                client: OrderClientRef {
                    name: order.client_name,
                },
            }),
            ..Self::from(row.transaction)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionDto>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub transaction: TransactionDto,
}

fn date_filter(query: &ListTransactionsQuery) -> Result<TransactionFilter, ApiError> {
    let mut filter = TransactionFilter {
        kind: parse_enum("type", query.kind.as_deref())?,
        status: parse_enum("status", query.status.as_deref())?,
        ..Default::default()
    };

    if let Some(start) = query.start_date.as_deref().filter(|s| !s.trim().is_empty()) {
        filter.due_from = Some(DateParam::parse("startDate", start)?.start());
    }

    if let Some(end) = query.end_date.as_deref().filter(|s| !s.trim().is_empty()) {
        match DateParam::parse("endDate", end)? {
            DateParam::Instant(instant) => filter.due_to = Some(instant),
            day @ DateParam::Day(_) => filter.due_before = Some(day.start() + Duration::days(1)),
        }
    }

    Ok(filter)
}

/// List transactions by due date
#[utoipa::path(
    get,
    path = "/api/transactions",
    params(ListTransactionsQuery),
    responses(
        (status = 200, description = "Transactions listed", body = TransactionsResponse),
        (status = 400, description = "Invalid filter or pagination", body = ApiError),
        (status = 401, description = "Missing or invalid session token", body = ApiError)
    ),
    tag = "transactions"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
    query: Result<Query<ListTransactionsQuery>, QueryRejection>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let Query(query) = query?;
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .to_page_request()?;
    let filter = date_filter(&query)?;

    let repo = TransactionRepository::new(&state.db);
    let (rows, total) = repo.list(ctx.workspace_id, filter, page).await?;

    Ok(Json(TransactionsResponse {
        transactions: rows.into_iter().map(TransactionDto::from).collect(),
        pagination: Pagination::new(page, total),
    }))
}

/// Record an income or expense
#[utoipa::path(
    post,
    path = "/api/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction created", body = TransactionResponse),
        (status = 400, description = "Missing fields, non-positive amount or invalid type", body = ApiError),
        (status = 404, description = "Order not found in this workspace", body = ApiError)
    ),
    tag = "transactions"
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let Json(request) = payload?;

    let (Some(description), Some(amount), Some(kind), Some(due_date)) = (
        non_blank(request.description),
        request.amount,
        non_blank(request.kind),
        non_blank(request.due_date),
    ) else {
        return Err(bad_request(
            "Description, amount, type and due date are required",
        ));
    };

    let kind: TransactionType = kind
        .parse()
        .map_err(|_| bad_request("Type must be INCOME or EXPENSE"))?;
    let status = parse_enum("status", request.status.as_deref())?.unwrap_or(TransactionStatus::Pending);
    let due_date = DateParam::parse("dueDate", &due_date)?.start();
    let order_id = parse_uuid("orderId", request.order_id.as_deref())?;

    let repo = TransactionRepository::new(&state.db);
    let transaction = repo
        .create(
            ctx.workspace_id,
            NewTransaction {
                description,
                amount,
                kind,
                status,
                category: non_blank(request.category),
                due_date,
                order_id,
            },
        )
        .await?;

    counter!("mare_records_created_total", "entity" => "transaction").increment(1);
    tracing::info!(
        transaction_id = %transaction.id,
        workspace_id = %ctx.workspace_id,
        kind = %transaction.kind,
        "Created transaction"
    );

    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse {
            transaction: transaction.into(),
        }),
    ))
}
