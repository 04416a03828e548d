// src/db/requisition_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{inventory_repo::{insert_movement, NewMovement}, repository::RequisitionRepository},
    models::{
        inventory::{MovementType, StockItem},
        requisitions::{Requisition, RequisitionDraft, RequisitionLine, RequisitionStatus, Sector},
    },
};

const REQUISITION_SELECT: &str = r#"
    SELECT r.id, r.sector_id, s.name AS sector_name, r.requester_name, r.date, r.status,
           r.created_by_user_id, u.name AS created_by_name
    FROM requisitions r
    JOIN sectors s ON s.id = r.sector_id
    LEFT JOIN users u ON u.id = r.created_by_user_id
"#;

#[derive(Debug, FromRow)]
struct RequisitionRow {
    id: Uuid,
    sector_id: Uuid,
    sector_name: Option<String>,
    requester_name: String,
    date: DateTime<Utc>,
    status: RequisitionStatus,
    created_by_user_id: Option<Uuid>,
    created_by_name: Option<String>,
}

#[derive(Debug, FromRow)]
struct LineRow {
    requisition_id: Uuid,
    item_id: Uuid,
    item_name: Option<String>,
    quantity: i32,
}

#[derive(Clone)]
pub struct PgRequisitionRepository {
    pool: PgPool,
}

impl PgRequisitionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Junta as linhas (com o nome do item) a cada cabeçalho, preservando a ordem.
async fn attach_lines<'e, E>(executor: E, rows: Vec<RequisitionRow>) -> Result<Vec<Requisition>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let lines = sqlx::query_as::<_, LineRow>(
        r#"
        SELECT ri.requisition_id, ri.item_id, i.name AS item_name, ri.quantity
        FROM requisition_items ri
        JOIN stock_items i ON i.id = ri.item_id
        WHERE ri.requisition_id = ANY($1)
        ORDER BY i.name ASC
        "#,
    )
    .bind(ids)
    .fetch_all(executor)
    .await?;

    let mut by_requisition: HashMap<Uuid, Vec<RequisitionLine>> = HashMap::new();
    for line in lines {
        by_requisition
            .entry(line.requisition_id)
            .or_default()
            .push(RequisitionLine {
                item_id: line.item_id,
                item_name: line.item_name,
                quantity: line.quantity,
            });
    }

    Ok(rows
        .into_iter()
        .map(|row| Requisition {
            items: by_requisition.remove(&row.id).unwrap_or_default(),
            id: row.id,
            sector_id: row.sector_id,
            sector_name: row.sector_name,
            requester_name: row.requester_name,
            date: row.date,
            status: row.status,
            created_by_user_id: row.created_by_user_id,
            created_by_name: row.created_by_name,
        })
        .collect())
}

#[async_trait]
impl RequisitionRepository for PgRequisitionRepository {
    async fn list_requisitions(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Requisition>, AppError> {
        let sql = format!(
            "{REQUISITION_SELECT} WHERE ($1::timestamptz IS NULL OR r.date >= $1) ORDER BY r.date DESC"
        );
        let rows = sqlx::query_as::<_, RequisitionRow>(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        attach_lines(&self.pool, rows).await
    }

    async fn find_requisition(&self, id: Uuid) -> Result<Option<Requisition>, AppError> {
        let sql = format!("{REQUISITION_SELECT} WHERE r.id = $1");
        let row = sqlx::query_as::<_, RequisitionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(attach_lines(&self.pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn submit_requisition(&self, draft: RequisitionDraft) -> Result<Requisition, AppError> {
        let mut tx = self.pool.begin().await?;

        let sector = sqlx::query_as::<_, Sector>("SELECT id, name FROM sectors WHERE id = $1")
            .bind(draft.sector_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::SectorNotFound(draft.sector_id))?;

        // Ordem fixa por item: duas requisições concorrentes travam as linhas na mesma ordem
        let mut lines = draft.lines.clone();
        lines.sort_by_key(|line| line.item_id);

        // 1. Verifica e desconta numa só instrução. O UPDATE trava a linha até ao commit,
        //    e uma transação concorrente reavalia o `quantity >= $2` depois dele.
        for line in &lines {
            let decremented: Option<Uuid> = sqlx::query_scalar(
                r#"
                UPDATE stock_items
                SET quantity = quantity - $2, updated_at = NOW()
                WHERE id = $1 AND quantity >= $2
                RETURNING id
                "#,
            )
            .bind(line.item_id)
            .bind(line.quantity)
            .fetch_optional(&mut *tx)
            .await?;

            if decremented.is_none() {
                let current = sqlx::query_as::<_, StockItem>("SELECT * FROM stock_items WHERE id = $1")
                    .bind(line.item_id)
                    .fetch_optional(&mut *tx)
                    .await?;

                tracing::warn!(
                    item_id = %line.item_id,
                    requested = line.quantity,
                    "Requisição recusada por falta de stock"
                );

                // Sair daqui descarta a transação: rollback de tudo o que já foi descontado
                return Err(match current {
                    Some(item) => AppError::InsufficientStock {
                        item_id: item.id,
                        item_name: item.name,
                        unit: item.unit,
                        available: item.quantity,
                    },
                    None => AppError::ItemNotFound(line.item_id),
                });
            }
        }

        // 2. Cabeçalho da requisição
        let requisition_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO requisitions (sector_id, requester_name, status, created_by_user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(draft.sector_id)
        .bind(&draft.requester_name)
        .bind(RequisitionStatus::Completed)
        .bind(draft.created_by_user_id)
        .fetch_one(&mut *tx)
        .await?;

        // 3. Linhas + SAIDA no histórico de cada item
        let reason = format!("Requisição - {}", sector.name);
        for line in &lines {
            sqlx::query("INSERT INTO requisition_items (requisition_id, item_id, quantity) VALUES ($1, $2, $3)")
                .bind(requisition_id)
                .bind(line.item_id)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;

            insert_movement(
                &mut *tx,
                NewMovement {
                    item_id: line.item_id,
                    movement_type: MovementType::Out,
                    quantity: line.quantity,
                    date: None,
                    user_id: Some(draft.created_by_user_id),
                    reason: Some(&reason),
                    requisition_id: Some(requisition_id),
                },
            )
            .await?;
        }

        let sql = format!("{REQUISITION_SELECT} WHERE r.id = $1");
        let row = sqlx::query_as::<_, RequisitionRow>(&sql)
            .bind(requisition_id)
            .fetch_one(&mut *tx)
            .await?;
        let requisition = attach_lines(&mut *tx, vec![row])
            .await?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("requisição {} sumiu dentro da transação", requisition_id))?;

        tx.commit().await?;
        Ok(requisition)
    }
}
