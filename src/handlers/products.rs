//! # Products API Handlers

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
use crate::handlers::types::{PageQuery, Pagination, non_blank};
use crate::models::product;
use crate::repositories::{ProductRepository, product::NewProduct};
use crate::server::AppState;

/// Query parameters for listing products
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListProductsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Case-insensitive match on name or SKU
    pub search: Option<String>,
    /// Only goods at or below their minimum stock
    pub low_stock: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[schema(example = "Teclado mecânico")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(example = 349.9)]
    pub price: Option<f64>,
    #[schema(example = 210.0)]
    pub cost_price: Option<f64>,
    #[schema(example = 12)]
    pub quantity: Option<i32>,
    #[schema(example = "TEC-001")]
    pub sku: Option<String>,
    pub is_service: Option<bool>,
    #[schema(example = 5)]
    pub min_stock: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: f64,
    pub cost_price: Option<f64>,
    pub quantity: i32,
    pub min_stock: i32,
    pub is_service: bool,
    /// True for goods at or below their minimum stock
    pub low_stock: bool,
    pub created_at: String,
}

impl From<product::Model> for ProductDto {
    fn from(product: product::Model) -> Self {
        Self {
            low_stock: product.is_low_stock(),
            id: product.id.to_string(),
            name: product.name,
            description: product.description,
            sku: product.sku,
            price: product.price,
            cost_price: product.cost_price,
            quantity: product.quantity,
            min_stock: product.min_stock,
            is_service: product.is_service,
            created_at: product.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductsResponse {
    pub products: Vec<ProductDto>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub product: ProductDto,
}

/// List the workspace's products
#[utoipa::path(
    get,
    path = "/api/products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Products listed", body = ProductsResponse),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 401, description = "Missing or invalid session token", body = ApiError)
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
    query: Result<Query<ListProductsQuery>, QueryRejection>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let Query(query) = query?;
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .to_page_request()?;
    let search = non_blank(query.search);

    let repo = ProductRepository::new(&state.db);
    let (products, total) = repo
        .list(
            ctx.workspace_id,
            search.as_deref(),
            query.low_stock.unwrap_or(false),
            page,
        )
        .await?;

    Ok(Json(ProductsResponse {
        products: products.into_iter().map(ProductDto::from).collect(),
        pagination: Pagination::new(page, total),
    }))
}

/// Create a product or service
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Missing name/price or negative values", body = ApiError),
        (status = 409, description = "SKU already used in this workspace", body = ApiError)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let Json(request) = payload?;

    let (Some(name), Some(price)) = (non_blank(request.name), request.price) else {
        return Err(bad_request("Name and price are required"));
    };

    let repo = ProductRepository::new(&state.db);
    let product = repo
        .create(
            ctx.workspace_id,
            NewProduct {
                name,
                description: non_blank(request.description),
                sku: non_blank(request.sku),
                price,
                cost_price: request.cost_price,
                quantity: request.quantity,
                min_stock: request.min_stock,
                is_service: request.is_service.unwrap_or(false),
            },
        )
        .await?;

    counter!("mare_records_created_total", "entity" => "product").increment(1);
    tracing::info!(product_id = %product.id, workspace_id = %ctx.workspace_id, "Created product");

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            product: product.into(),
        }),
    ))
}
