// src/models/requisitions.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "requisition_status")]
pub enum RequisitionStatus {
    #[sqlx(rename = "PENDENTE")]
    #[serde(rename = "PENDENTE")]
    Pending,
    #[sqlx(rename = "APROVADO")]
    #[serde(rename = "APROVADO")]
    Approved,
    #[sqlx(rename = "REJEITADO")]
    #[serde(rename = "REJEITADO")]
    Rejected,
    #[sqlx(rename = "CONCLUIDO")]
    #[serde(rename = "CONCLUIDO")]
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionLine {
    pub item_id: Uuid,
    pub item_name: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Requisition {
    pub id: Uuid,
    pub sector_id: Uuid,
    pub sector_name: Option<String>,
    #[serde(rename = "nomeRequisitante")]
    pub requester_name: String,
    pub date: DateTime<Utc>,
    pub status: RequisitionStatus,
    pub items: Vec<RequisitionLine>,
    pub created_by_user_id: Option<Uuid>,
    pub created_by_name: Option<String>,
}

/// Requisição validada e com as linhas consolidadas (um item por linha).
#[derive(Debug, Clone)]
pub struct RequisitionDraft {
    pub sector_id: Uuid,
    pub requester_name: String,
    pub created_by_user_id: Uuid,
    pub lines: Vec<DraftLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftLine {
    pub item_id: Uuid,
    pub quantity: i32,
}
