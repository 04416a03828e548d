// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::dashboard::{DashboardStats, PeriodReport, ReportQuery},
};

#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "Dashboard",
    responses((status = 200, description = "Cards do dashboard", body = DashboardStats)),
    security(("api_jwt" = []))
)]
pub async fn get_stats(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.dashboard_service.get_stats().await?;
    Ok(Json(stats))
}

// GET /reports?period=weekly|monthly
#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Dashboard",
    params(ReportQuery),
    responses((status = 200, description = "Dados do relatório do período", body = PeriodReport)),
    security(("api_jwt" = []))
)]
pub async fn get_report(
    State(app_state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.dashboard_service.get_report(query.period).await?;
    Ok(Json(report))
}
