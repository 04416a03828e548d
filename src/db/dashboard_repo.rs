// src/db/dashboard_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError, db::repository::DashboardRepository,
    models::dashboard::DashboardStats,
};

#[derive(Clone)]
pub struct PgDashboardRepository {
    pool: PgPool,
}

impl PgDashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DashboardRepository for PgDashboardRepository {
    // Um único SELECT: os quatro números saem do mesmo snapshot
    async fn stats(&self) -> Result<DashboardStats, AppError> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM stock_items) AS total_items,
                (SELECT COUNT(*) FROM stock_items WHERE quantity <= min_level) AS low_stock_items,
                (SELECT COUNT(*) FROM requisitions WHERE status = 'PENDENTE') AS pending_requisitions,
                (SELECT COUNT(*) FROM requisitions WHERE status = 'CONCLUIDO') AS completed_requisitions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
