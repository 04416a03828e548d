// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::inventory::{MovementType, NewStockItem, StockFilter, StockItemView, StockMovement},
};

// ---
// Payload: CreateStockItem
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStockItemPayload {
    #[validate(length(min = 2, message = "Nome obrigatório"))]
    pub name: String,

    #[validate(length(min = 2, message = "Categoria obrigatória"))]
    pub category: String,

    #[validate(range(min = 0, message = "A quantidade não pode ser negativa"))]
    pub quantity: i32,

    #[validate(length(min = 1, message = "Unidade obrigatória"))]
    pub unit: String,

    #[validate(range(min = 0, message = "Nível mínimo deve ser positivo"))]
    pub min_level: i32,
}

impl From<CreateStockItemPayload> for NewStockItem {
    fn from(payload: CreateStockItemPayload) -> Self {
        NewStockItem {
            name: payload.name.trim().to_string(),
            category: payload.category.trim().to_string(),
            quantity: payload.quantity,
            unit: payload.unit.trim().to_string(),
            min_level: payload.min_level,
        }
    }
}

// ---
// Payload: CreateMovement (entrada de stock)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovementPayload {
    pub item_id: Uuid,

    // Opcional: se vier, tem de ser ENTRADA
    #[serde(rename = "type")]
    pub movement_type: Option<MovementType>,

    #[validate(range(min = 1, message = "A quantidade deve ser maior que 0"))]
    pub quantity: i32,

    pub date: Option<DateTime<Utc>>,

    pub reason: Option<String>,
}

// --- STOCK ---

#[utoipa::path(
    get,
    path = "/api/stock",
    tag = "Inventory",
    params(StockFilter),
    responses((status = 200, description = "Itens ordenados por nome", body = Vec<StockItemView>)),
    security(("api_jwt" = []))
)]
pub async fn get_all_items(
    State(app_state): State<AppState>,
    Query(filter): Query<StockFilter>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state.inventory_service.list_items(&filter).await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/stock/categories",
    tag = "Inventory",
    responses((status = 200, description = "Categorias distintas", body = Vec<String>)),
    security(("api_jwt" = []))
)]
pub async fn get_categories(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.inventory_service.list_categories().await?;
    Ok(Json(categories))
}

#[utoipa::path(
    get,
    path = "/api/stock/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "O item", body = StockItemView),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_item(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state.inventory_service.get_item(id).await?;
    Ok(Json(item))
}

#[utoipa::path(
    post,
    path = "/api/stock",
    tag = "Inventory",
    request_body = CreateStockItemPayload,
    responses(
        (status = 201, description = "Item criado", body = StockItemView),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Json(payload), _): WithRejection<Json<CreateStockItemPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let new_item = app_state
        .inventory_service
        .create_item(payload.into(), &user)
        .await?;

    Ok((StatusCode::CREATED, Json(new_item)))
}

// --- MOVIMENTOS ---

#[utoipa::path(
    get,
    path = "/api/movements",
    tag = "Movements",
    responses((status = 200, description = "Histórico, mais recentes primeiro", body = Vec<StockMovement>)),
    security(("api_jwt" = []))
)]
pub async fn get_movements(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let movements = app_state.inventory_service.list_movements().await?;
    Ok(Json(movements))
}

#[utoipa::path(
    get,
    path = "/api/movements/item/{id}",
    tag = "Movements",
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Histórico do item", body = Vec<StockMovement>),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_item_movements(
    State(app_state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let movements = app_state.inventory_service.item_movements(item_id).await?;
    Ok(Json(movements))
}

#[utoipa::path(
    post,
    path = "/api/movements",
    tag = "Movements",
    request_body = CreateMovementPayload,
    responses(
        (status = 201, description = "Entrada registada", body = StockMovement),
        (status = 400, description = "Quantidade inválida ou tipo SAIDA"),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_stock(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Json(payload), _): WithRejection<Json<CreateMovementPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let movement = app_state
        .inventory_service
        .add_stock(
            payload.item_id,
            payload.quantity,
            payload.movement_type,
            payload.date,
            payload.reason,
            &user,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(movement)))
}
