//! # Orders API Handlers
//!
//! Quotes and sales. Creating a `SOLD` order takes its items out of stock.

use axum::{
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::WorkspaceContext;
use crate::error::{ApiError, bad_request};
use crate::handlers::types::{PageQuery, Pagination, non_blank, parse_enum, parse_uuid};
use crate::models::{OrderStatus, client, order, order_item};
use crate::repositories::{
    OrderRepository,
    order::{NewOrder, NewOrderItem, OrderFilter, OrderSummary},
};
use crate::server::AppState;

/// Query parameters for listing orders
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListOrdersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// BUDGET, SOLD or CANCELED
    pub status: Option<String>,
    /// Only orders of this client (UUID)
    pub client_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Option<String>,
    #[schema(example = 2)]
    pub quantity: Option<i32>,
    /// Defaults to the product's price
    pub unit_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub client_id: Option<String>,
    /// BUDGET (default) or SOLD
    #[schema(example = "BUDGET")]
    pub status: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClientRef {
    pub id: String,
    pub name: String,
}

impl From<client::Model> for ClientRef {
    fn from(client: client::Model) -> Self {
        Self {
            id: client.id.to_string(),
            name: client.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub id: String,
    pub product_id: String,
    pub quantity: i32,
    pub unit_price: f64,
}

impl From<order_item::Model> for OrderItemDto {
    fn from(item: order_item::Model) -> Self {
        Self {
            id: item.id.to_string(),
            product_id: item.product_id.to_string(),
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientRef>,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub notes: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItemDto>>,
}

impl From<order::Model> for OrderDto {
    fn from(order: order::Model) -> Self {
        Self {
            id: order.id.to_string(),
            client_id: order.client_id.to_string(),
            client: None,
            status: order.status,
            total_amount: order.total_amount,
            notes: order.notes,
            created_at: order.created_at.to_rfc3339(),
            items_count: None,
            items: None,
        }
    }
}

impl From<OrderSummary> for OrderDto {
    fn from(summary: OrderSummary) -> Self {
        Self {
            client: summary.client.map(ClientRef::from),
            items_count: Some(summary.items_count),
            ..Self::from(summary.order)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrdersResponse {
    pub orders: Vec<OrderDto>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub order: OrderDto,
}

/// List orders, newest first
#[utoipa::path(
    get,
    path = "/api/orders",
    params(ListOrdersQuery),
    responses(
        (status = 200, description = "Orders listed", body = OrdersResponse),
        (status = 400, description = "Invalid status, client id or pagination", body = ApiError),
        (status = 401, description = "Missing or invalid session token", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Json<OrdersResponse>, ApiError> {
    let Query(query) = query?;
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .to_page_request()?;
    let filter = OrderFilter {
        status: parse_enum("status", query.status.as_deref())?,
        client_id: parse_uuid("clientId", query.client_id.as_deref())?,
    };

    let repo = OrderRepository::new(&state.db);
    let (orders, total) = repo.list(ctx.workspace_id, filter, page).await?;

    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(OrderDto::from).collect(),
        pagination: Pagination::new(page, total),
    }))
}

/// Create an order with its items
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Invalid items, status or prices", body = ApiError),
        (status = 404, description = "Client or product not found in this workspace", body = ApiError),
        (status = 409, description = "Insufficient stock for a sale", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(request) = payload?;

    let Some(client_id) = parse_uuid("clientId", request.client_id.as_deref())? else {
        return Err(bad_request("clientId is required"));
    };
    let status = parse_enum("status", request.status.as_deref())?.unwrap_or(OrderStatus::Budget);

    let mut items = Vec::with_capacity(request.items.len());
    for item in request.items {
        let (Some(product_id), Some(quantity)) =
            (parse_uuid("productId", item.product_id.as_deref())?, item.quantity)
        else {
            return Err(bad_request("Each item needs a productId and a quantity"));
        };
        items.push(NewOrderItem {
            product_id,
            quantity,
            unit_price: item.unit_price,
        });
    }

    let repo = OrderRepository::new(&state.db);
    let (order, items) = repo
        .create(
            ctx.workspace_id,
            NewOrder {
                client_id,
                status,
                notes: non_blank(request.notes),
                items,
            },
        )
        .await?;

    counter!("mare_records_created_total", "entity" => "order").increment(1);

    let mut dto = OrderDto::from(order);
    dto.items_count = Some(items.len() as i64);
    dto.items = Some(items.into_iter().map(OrderItemDto::from).collect());

    Ok((StatusCode::CREATED, Json(OrderResponse { order: dto })))
}
