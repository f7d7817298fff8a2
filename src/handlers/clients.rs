//! # Clients API Handlers

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
use crate::models::client;
use crate::repositories::{
    ClientRepository,
    client::{ClientWithOrderCount, NewClient},
};
use crate::server::AppState;

/// Query parameters for listing clients
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListClientsQuery {
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
    /// Page size (default: 20, max: 100)
    pub limit: Option<i64>,
    /// Case-insensitive match on name, email or document
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateClientRequest {
    #[schema(example = "Maria Silva")]
    pub name: Option<String>,
    /// CPF/CNPJ
    #[schema(example = "123.456.789-00")]
    pub document: Option<String>,
    #[schema(example = "maria@exemplo.com")]
    pub email: Option<String>,
    #[schema(example = "(11) 99999-0000")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientDto {
    pub id: String,
    pub name: String,
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// ISO 8601
    pub created_at: String,
    /// Number of orders for this client (list responses only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orders_count: Option<i64>,
}

impl From<client::Model> for ClientDto {
    fn from(client: client::Model) -> Self {
        Self {
            id: client.id.to_string(),
            name: client.name,
            document: client.document,
            email: client.email,
            phone: client.phone,
            created_at: client.created_at.to_rfc3339(),
            orders_count: None,
        }
    }
}

impl From<ClientWithOrderCount> for ClientDto {
    fn from(row: ClientWithOrderCount) -> Self {
        Self {
            orders_count: Some(row.orders_count),
            ..Self::from(row.client)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientsResponse {
    pub clients: Vec<ClientDto>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientResponse {
    pub client: ClientDto,
}

/// List the workspace's clients
#[utoipa::path(
    get,
    path = "/api/clients",
    params(ListClientsQuery),
    responses(
        (status = 200, description = "Clients listed", body = ClientsResponse),
        (status = 400, description = "Invalid pagination", body = ApiError),
        (status = 401, description = "Missing or invalid session token", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn list_clients(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
    query: Result<Query<ListClientsQuery>, QueryRejection>,
) -> Result<Json<ClientsResponse>, ApiError> {
    let Query(query) = query?;
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .to_page_request()?;
    let search = non_blank(query.search);

    let repo = ClientRepository::new(&state.db);
    let (clients, total) = repo
        .list(ctx.workspace_id, search.as_deref(), page)
        .await?;

    Ok(Json(ClientsResponse {
        clients: clients.into_iter().map(ClientDto::from).collect(),
        pagination: Pagination::new(page, total),
    }))
}

/// Create a client
#[utoipa::path(
    post,
    path = "/api/clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = ClientResponse),
        (status = 400, description = "Name is required", body = ApiError),
        (status = 409, description = "Document or email already used in this workspace", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn create_client(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
    payload: Result<Json<CreateClientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ClientResponse>), ApiError> {
    let Json(request) = payload?;

    let Some(name) = non_blank(request.name) else {
        return Err(bad_request("Name is required"));
    };

    let repo = ClientRepository::new(&state.db);
    let client = repo
        .create(
            ctx.workspace_id,
            NewClient {
                name,
                document: non_blank(request.document),
                email: non_blank(request.email).map(|e| e.to_lowercase()),
                phone: non_blank(request.phone),
            },
        )
        .await?;

    counter!("mare_records_created_total", "entity" => "client").increment(1);
    tracing::info!(client_id = %client.id, workspace_id = %ctx.workspace_id, "Created client");

    Ok((
        StatusCode::CREATED,
        Json(ClientResponse {
            client: client.into(),
        }),
    ))
}
