// src/handlers/requisitions.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, rbac::RequireAdmin},
    models::requisitions::{DraftLine, Requisition, Sector},
};

// `Serialize` entra porque a regra `length` da lista guarda os itens como parâmetro do erro
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionItemPayload {
    pub item_id: Uuid,

    #[validate(range(min = 1, message = "Qtd minima 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequisitionPayload {
    #[validate(required(message = "Selecione um setor"))]
    pub sector_id: Option<Uuid>,

    #[serde(rename = "nomeRequisitante", default)]
    #[validate(length(min = 3, message = "Nome do requisitante é obrigatório e deve ter 3+ caracteres"))]
    pub requester_name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Adicione pelo menos um item"), nested)]
    pub items: Vec<RequisitionItemPayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSectorPayload {
    #[validate(length(min = 2, message = "O nome do setor deve ter pelo menos 2 caracteres"))]
    pub name: String,
}

// --- REQUISIÇÕES ---

#[utoipa::path(
    post,
    path = "/api/requisitions",
    tag = "Requisitions",
    request_body = CreateRequisitionPayload,
    responses(
        (status = 201, description = "Requisição concluída e stock descontado", body = Requisition),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Setor ou item não encontrado"),
        (status = 409, description = "Stock insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_requisition(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Json(payload), _): WithRejection<Json<CreateRequisitionPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let sector_id = payload
        .sector_id
        .ok_or_else(|| anyhow::anyhow!("sectorId ausente após validação"))?;

    let lines: Vec<DraftLine> = payload
        .items
        .iter()
        .map(|i| DraftLine { item_id: i.item_id, quantity: i.quantity })
        .collect();

    let requisition = app_state
        .requisition_service
        .submit_requisition(sector_id, &payload.requester_name, &lines, &user)
        .await?;

    Ok((StatusCode::CREATED, Json(requisition)))
}

#[utoipa::path(
    get,
    path = "/api/requisitions",
    tag = "Requisitions",
    responses((status = 200, description = "Requisições, mais recentes primeiro", body = Vec<Requisition>)),
    security(("api_jwt" = []))
)]
pub async fn get_all_requisitions(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let requisitions = app_state.requisition_service.list_requisitions().await?;
    Ok(Json(requisitions))
}

#[utoipa::path(
    get,
    path = "/api/requisitions/{id}",
    tag = "Requisitions",
    params(("id" = Uuid, Path, description = "ID da requisição")),
    responses(
        (status = 200, description = "A requisição", body = Requisition),
        (status = 404, description = "Requisição não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_requisition(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let requisition = app_state.requisition_service.get_requisition(id).await?;
    Ok(Json(requisition))
}

// --- SETORES ---

#[utoipa::path(
    get,
    path = "/api/sectors",
    tag = "Sectors",
    responses((status = 200, description = "Setores ordenados por nome", body = Vec<Sector>)),
    security(("api_jwt" = []))
)]
pub async fn get_sectors(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let sectors = app_state.requisition_service.list_sectors().await?;
    Ok(Json(sectors))
}

#[utoipa::path(
    post,
    path = "/api/sectors",
    tag = "Sectors",
    request_body = CreateSectorPayload,
    responses(
        (status = 201, description = "Setor criado", body = Sector),
        (status = 409, description = "Setor já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sector(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    WithRejection(Json(payload), _): WithRejection<Json<CreateSectorPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let sector = app_state.requisition_service.create_sector(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(sector)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(body: serde_json::Value) -> CreateRequisitionPayload {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn nested_lines_are_validated() {
        let item_id = Uuid::new_v4();

        let ok = payload(json!({
            "sectorId": Uuid::new_v4(),
            "nomeRequisitante": "Chefe Ana",
            "items": [{ "itemId": item_id, "quantity": 2 }]
        }));
        assert!(ok.validate().is_ok());

        let zero = payload(json!({
            "sectorId": Uuid::new_v4(),
            "nomeRequisitante": "Chefe Ana",
            "items": [{ "itemId": item_id, "quantity": 0 }]
        }));
        let errors = zero.validate().unwrap_err();
        assert!(errors.errors().contains_key("items"));
    }

    #[test]
    fn empty_list_and_short_name_are_rejected() {
        let empty = payload(json!({ "sectorId": Uuid::new_v4(), "nomeRequisitante": "Jo" }));
        let errors = empty.validate().unwrap_err();

        let fields = errors.field_errors();
        assert!(fields.contains_key("items"));
        // lista vazia e nome curto
        assert_eq!(fields.len(), 2);
    }
}
