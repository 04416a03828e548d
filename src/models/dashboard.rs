// src/models/dashboard.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::models::{inventory::StockItem, requisitions::Requisition};

// Os cards do topo do dashboard
#[derive(Debug, Clone, Default, Serialize, FromRow, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_items: i64,
    pub low_stock_items: i64, // quantity <= minLevel
    pub pending_requisitions: i64,
    pub completed_requisitions: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Weekly,
    Monthly,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    pub period: ReportPeriod,
}

// Dados do relatório semanal/mensal (o PDF é montado no cliente)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodReport {
    pub period: ReportPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub stats: DashboardStats,
    pub requisition_count: usize,
    pub requisitions: Vec<Requisition>,
    pub critical_items: Vec<StockItem>,
}
