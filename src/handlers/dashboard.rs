//! # Dashboard Handler

use axum::{extract::State, response::Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::WorkspaceContext;
use crate::error::ApiError;
use crate::models::OrderStatus;
use crate::repositories::{DashboardRepository, dashboard::DashboardSummary};
use crate::server::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_clients: u64,
    pub total_products: u64,
    pub low_stock_products: u64,
    /// Revenue from SOLD orders created this month (UTC)
    pub current_month_revenue: f64,
    pub current_month_orders: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Financial {
    pub pending_receivables: f64,
    pub pending_payables: f64,
    /// Receivables minus payables
    pub cash_flow: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: String,
    pub client_name: Option<String>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub overview: Overview,
    pub financial: Financial,
    pub recent_orders: Vec<RecentOrder>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub dashboard: Dashboard,
}

impl From<DashboardSummary> for Dashboard {
    fn from(summary: DashboardSummary) -> Self {
        let cash_flow = summary.cash_flow();
        Self {
            overview: Overview {
                total_clients: summary.total_clients,
                total_products: summary.total_products,
                low_stock_products: summary.low_stock_products,
                current_month_revenue: summary.current_month_revenue,
                current_month_orders: summary.current_month_orders,
            },
            financial: Financial {
                pending_receivables: summary.pending_receivables,
                pending_payables: summary.pending_payables,
                cash_flow,
            },
            recent_orders: summary
                .recent_orders
                .into_iter()
                .map(|(order, client)| RecentOrder {
                    id: order.id.to_string(),
                    client_name: client.map(|c| c.name),
                    total_amount: order.total_amount,
                    status: order.status,
                    created_at: order.created_at.to_rfc3339(),
                })
                .collect(),
        }
    }
}

/// Workspace overview, cash position and latest orders
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Dashboard aggregates", body = DashboardResponse),
        (status = 401, description = "Missing or invalid session token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
) -> Result<Json<DashboardResponse>, ApiError> {
    let summary = DashboardRepository::new(&state.db)
        .summary(ctx.workspace_id, Utc::now())
        .await?;

    Ok(Json(DashboardResponse {
        dashboard: summary.into(),
    }))
}
