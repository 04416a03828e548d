// src/db/sector_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    db::repository::SectorRepository,
    models::requisitions::Sector,
};

#[derive(Clone)]
pub struct PgSectorRepository {
    pool: PgPool,
}

impl PgSectorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SectorRepository for PgSectorRepository {
    async fn list_sectors(&self) -> Result<Vec<Sector>, AppError> {
        let sectors = sqlx::query_as::<_, Sector>("SELECT id, name FROM sectors ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(sectors)
    }

    async fn find_sector(&self, id: Uuid) -> Result<Option<Sector>, AppError> {
        let sector = sqlx::query_as::<_, Sector>("SELECT id, name FROM sectors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sector)
    }

    async fn create_sector(&self, name: &str) -> Result<Sector, AppError> {
        sqlx::query_as::<_, Sector>("INSERT INTO sectors (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, || AppError::SectorAlreadyExists(name.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_default_sectors_are_seeded(pool: PgPool) {
        let repo = PgSectorRepository::new(pool);

        let names: Vec<String> = repo.list_sectors().await.unwrap().into_iter().map(|s| s.name).collect();

        assert_eq!(names, ["Bar", "Cozinha", "Limpeza", "Recepção", "Restaurante"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_sector_is_conflict(pool: PgPool) {
        let repo = PgSectorRepository::new(pool);
        repo.create_sector("Lavandaria").await.unwrap();

        let err = repo.create_sector("Lavandaria").await.unwrap_err();

        assert!(matches!(&err, AppError::SectorAlreadyExists(name) if name == "Lavandaria"));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
