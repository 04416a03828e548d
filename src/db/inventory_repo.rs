// src/db/inventory_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::repository::{MovementRepository, StockRepository},
    models::inventory::{
        MovementType, NewStockEntry, NewStockItem, StockFilter, StockItem, StockMovement,
    },
};

// Movimento já "hidratado" com o nome do item e do usuário
const MOVEMENT_SELECT: &str = r#"
    SELECT m.id, m.item_id, i.name AS item_name, m.movement_type, m.quantity, m.date,
           m.user_id, u.name AS user_name, m.reason, m.requisition_id
    FROM stock_movements m
    JOIN stock_items i ON i.id = m.item_id
    LEFT JOIN users u ON u.id = m.user_id
"#;

#[derive(Clone)]
pub struct PgInventoryRepository {
    pool: PgPool,
}

impl PgInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ---
// Funções de "Escrita" (Transacionais)
// ---
// Estas usam o padrão genérico 'Executor' para rodar dentro de uma transação.

/// Linha nova do livro-razão; `date` vazio usa `NOW()` do banco.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NewMovement<'a> {
    pub item_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub date: Option<chrono::DateTime<chrono::Utc>>,
    pub user_id: Option<Uuid>,
    pub reason: Option<&'a str>,
    pub requisition_id: Option<Uuid>,
}

/// Registra uma movimentação no livro-razão (auditoria) e devolve o id.
pub(crate) async fn insert_movement<'e, E>(executor: E, movement: NewMovement<'_>) -> Result<Uuid, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO stock_movements (item_id, movement_type, quantity, date, user_id, reason, requisition_id)
        VALUES ($1, $2, $3, COALESCE($4, NOW()), $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(movement.item_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(movement.date)
    .bind(movement.user_id)
    .bind(movement.reason)
    .bind(movement.requisition_id)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

async fn fetch_movement<'e, E>(executor: E, id: Uuid) -> Result<StockMovement, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("{MOVEMENT_SELECT} WHERE m.id = $1");
    let movement = sqlx::query_as::<_, StockMovement>(&sql)
        .bind(id)
        .fetch_one(executor)
        .await?;
    Ok(movement)
}

#[async_trait]
impl StockRepository for PgInventoryRepository {
    async fn list_items(&self, filter: &StockFilter) -> Result<Vec<StockItem>, AppError> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let category = filter.category.as_deref().filter(|c| !c.is_empty());

        let items = sqlx::query_as::<_, StockItem>(
            r#"
            SELECT * FROM stock_items
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR category = $2)
            ORDER BY name ASC
            "#,
        )
        .bind(search)
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn list_categories(&self) -> Result<Vec<String>, AppError> {
        let categories: Vec<String> = sqlx::query_scalar("SELECT DISTINCT category FROM stock_items ORDER BY category ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<StockItem>, AppError> {
        let item = sqlx::query_as::<_, StockItem>("SELECT * FROM stock_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn create_item(&self, new_item: NewStockItem, created_by: Uuid) -> Result<StockItem, AppError> {
        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<_, StockItem>(
            r#"
            INSERT INTO stock_items (name, category, quantity, unit, min_level)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&new_item.name)
        .bind(&new_item.category)
        .bind(new_item.quantity)
        .bind(&new_item.unit)
        .bind(new_item.min_level)
        .fetch_one(&mut *tx)
        .await?;

        // Stock inicial também fica no histórico
        if item.quantity > 0 {
            insert_movement(
                &mut *tx,
                NewMovement {
                    item_id: item.id,
                    movement_type: MovementType::In,
                    quantity: item.quantity,
                    date: None,
                    user_id: Some(created_by),
                    reason: Some("Stock inicial"),
                    requisition_id: None,
                },
            )
            .await?;
        }

        tx.commit().await?;
        Ok(item)
    }
}

#[async_trait]
impl MovementRepository for PgInventoryRepository {
    async fn list_movements(&self) -> Result<Vec<StockMovement>, AppError> {
        let sql = format!("{MOVEMENT_SELECT} ORDER BY m.date DESC, m.created_at DESC");
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }

    async fn list_item_movements(&self, item_id: Uuid) -> Result<Vec<StockMovement>, AppError> {
        let sql = format!("{MOVEMENT_SELECT} WHERE m.item_id = $1 ORDER BY m.date DESC, m.created_at DESC");
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }

    async fn record_entry(&self, entry: NewStockEntry) -> Result<StockMovement, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Soma ao saldo (o próprio UPDATE confirma que o item existe)
        let updated: Option<Uuid> = sqlx::query_scalar(
            "UPDATE stock_items SET quantity = quantity + $2, updated_at = NOW() WHERE id = $1 RETURNING id",
        )
        .bind(entry.item_id)
        .bind(entry.quantity)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Err(AppError::ItemNotFound(entry.item_id));
        }

        // 2. Grava Histórico
        let movement_id = insert_movement(
            &mut *tx,
            NewMovement {
                item_id: entry.item_id,
                movement_type: MovementType::In,
                quantity: entry.quantity,
                date: Some(entry.date),
                user_id: Some(entry.user_id),
                reason: Some(&entry.reason),
                requisition_id: None,
            },
        )
        .await?;

        let movement = fetch_movement(&mut *tx, movement_id).await?;

        tx.commit().await?;
        Ok(movement)
    }
}
