// src/db/repository.rs
//
// Contratos de acesso a dados. Cada agregado tem o seu trait; o Postgres e o
// armazenamento em memória implementam todos eles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::User,
        dashboard::DashboardStats,
        inventory::{NewStockEntry, NewStockItem, StockFilter, StockItem, StockMovement},
        requisitions::{Requisition, RequisitionDraft, Sector},
        users::{NewUser, UserChanges},
    },
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    async fn count_users(&self) -> Result<i64, AppError>;

    /// Falha com `EmailAlreadyExists` se o e-mail já estiver em uso.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<User, AppError>;

    /// Movimentos e requisições do usuário ficam com a referência nula.
    async fn delete_user(&self, id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait SectorRepository: Send + Sync {
    async fn list_sectors(&self) -> Result<Vec<Sector>, AppError>;

    async fn find_sector(&self, id: Uuid) -> Result<Option<Sector>, AppError>;

    async fn create_sector(&self, name: &str) -> Result<Sector, AppError>;
}

#[async_trait]
pub trait StockRepository: Send + Sync {
    async fn list_items(&self, filter: &StockFilter) -> Result<Vec<StockItem>, AppError>;

    async fn list_categories(&self) -> Result<Vec<String>, AppError>;

    async fn find_item(&self, id: Uuid) -> Result<Option<StockItem>, AppError>;

    /// Cria o item; quantidade inicial positiva gera também a ENTRADA no histórico.
    async fn create_item(&self, new_item: NewStockItem, created_by: Uuid) -> Result<StockItem, AppError>;
}

#[async_trait]
pub trait MovementRepository: Send + Sync {
    async fn list_movements(&self) -> Result<Vec<StockMovement>, AppError>;

    async fn list_item_movements(&self, item_id: Uuid) -> Result<Vec<StockMovement>, AppError>;

    /// Soma a quantidade ao item e grava a ENTRADA, de forma atômica.
    async fn record_entry(&self, entry: NewStockEntry) -> Result<StockMovement, AppError>;
}

#[async_trait]
pub trait RequisitionRepository: Send + Sync {
    /// Mais recentes primeiro. `since` limita às requisições a partir dessa data.
    async fn list_requisitions(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Requisition>, AppError>;

    async fn find_requisition(&self, id: Uuid) -> Result<Option<Requisition>, AppError>;

    /// Verifica e desconta o stock de todas as linhas numa única operação atômica.
    /// Se alguma linha não tiver saldo, nada é alterado e devolve `InsufficientStock`.
    async fn submit_requisition(&self, draft: RequisitionDraft) -> Result<Requisition, AppError>;
}

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    async fn stats(&self) -> Result<DashboardStats, AppError>;
}
