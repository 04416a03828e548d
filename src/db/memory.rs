// src/db/memory.rs
//
// Armazenamento em memória para desenvolvimento offline e testes.
// Um único Mutex protege todo o estado, então cada operação é atômica.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::repository::{
        DashboardRepository, MovementRepository, RequisitionRepository, SectorRepository,
        StockRepository, UserRepository,
    },
    models::{
        auth::User,
        dashboard::DashboardStats,
        inventory::{
            MovementType, NewStockEntry, NewStockItem, StockFilter, StockItem, StockMovement,
        },
        requisitions::{
            DraftLine, Requisition, RequisitionDraft, RequisitionLine, RequisitionStatus, Sector,
        },
        users::{NewUser, UserChanges},
    },
};

#[derive(Debug, Clone)]
struct StoredMovement {
    id: Uuid,
    item_id: Uuid,
    movement_type: MovementType,
    quantity: i32,
    date: DateTime<Utc>,
    user_id: Option<Uuid>,
    reason: Option<String>,
    requisition_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
struct StoredRequisition {
    id: Uuid,
    sector_id: Uuid,
    requester_name: String,
    date: DateTime<Utc>,
    status: RequisitionStatus,
    created_by_user_id: Option<Uuid>,
    lines: Vec<DraftLine>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    sectors: Vec<Sector>,
    items: Vec<StockItem>,
    movements: Vec<StoredMovement>,
    requisitions: Vec<StoredRequisition>,
}

impl MemoryState {
    fn item(&self, id: Uuid) -> Option<&StockItem> {
        self.items.iter().find(|i| i.id == id)
    }

    fn user_name(&self, id: Option<Uuid>) -> Option<String> {
        let id = id?;
        self.users.iter().find(|u| u.id == id).map(|u| u.name.clone())
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id) != except)
    }

    fn push_movement(
        &mut self,
        item_id: Uuid,
        movement_type: MovementType,
        quantity: i32,
        date: DateTime<Utc>,
        user_id: Option<Uuid>,
        reason: Option<String>,
        requisition_id: Option<Uuid>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.movements.push(StoredMovement {
            id,
            item_id,
            movement_type,
            quantity,
            date,
            user_id,
            reason,
            requisition_id,
        });
        id
    }

    fn hydrate_movement(&self, stored: &StoredMovement) -> StockMovement {
        StockMovement {
            id: stored.id,
            item_id: stored.item_id,
            item_name: self.item(stored.item_id).map(|i| i.name.clone()),
            movement_type: stored.movement_type,
            quantity: stored.quantity,
            date: stored.date,
            user_id: stored.user_id,
            user_name: self.user_name(stored.user_id),
            reason: stored.reason.clone(),
            requisition_id: stored.requisition_id,
        }
    }

    // Mais recentes primeiro; empate na data fica com o último inserido à frente
    fn movements_where(&self, keep: impl Fn(&StoredMovement) -> bool) -> Vec<StockMovement> {
        let mut movements: Vec<StockMovement> = self
            .movements
            .iter()
            .rev()
            .filter(|m| keep(m))
            .map(|m| self.hydrate_movement(m))
            .collect();
        movements.sort_by(|a, b| b.date.cmp(&a.date));
        movements
    }

    fn hydrate_requisition(&self, stored: &StoredRequisition) -> Requisition {
        let mut items: Vec<RequisitionLine> = stored
            .lines
            .iter()
            .map(|line| RequisitionLine {
                item_id: line.item_id,
                item_name: self.item(line.item_id).map(|i| i.name.clone()),
                quantity: line.quantity,
            })
            .collect();
        items.sort_by(|a, b| a.item_name.cmp(&b.item_name));

        Requisition {
            id: stored.id,
            sector_id: stored.sector_id,
            sector_name: self
                .sectors
                .iter()
                .find(|s| s.id == stored.sector_id)
                .map(|s| s.name.clone()),
            requester_name: stored.requester_name.clone(),
            date: stored.date,
            status: stored.status,
            items,
            created_by_user_id: stored.created_by_user_id,
            created_by_name: self.user_name(stored.created_by_user_id),
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loja já com os setores padrão do hotel.
    pub async fn with_default_sectors() -> Result<Self, AppError> {
        let store = Self::new();
        for name in ["Bar", "Cozinha", "Restaurante", "Limpeza", "Recepção"] {
            store.create_sector(name).await?;
        }
        Ok(store)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let state = self.state.lock().await;
        let mut users = state.users.clone();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        let state = self.state.lock().await;
        Ok(state.users.len() as i64)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut state = self.state.lock().await;
        if state.email_taken(&new_user.email, None) {
            return Err(AppError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            role: new_user.role,
            avatar: new_user.avatar,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<User, AppError> {
        let mut state = self.state.lock().await;
        if state.email_taken(&changes.email, Some(id)) {
            return Err(AppError::EmailAlreadyExists);
        }

        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AppError::UserNotFound)?;

        user.name = changes.name;
        user.email = changes.email;
        user.role = changes.role;
        user.avatar = changes.avatar;
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(AppError::UserNotFound);
        }

        // Mesmo efeito do ON DELETE SET NULL
        for movement in state.movements.iter_mut().filter(|m| m.user_id == Some(id)) {
            movement.user_id = None;
        }
        for requisition in state
            .requisitions
            .iter_mut()
            .filter(|r| r.created_by_user_id == Some(id))
        {
            requisition.created_by_user_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl SectorRepository for InMemoryStore {
    async fn list_sectors(&self) -> Result<Vec<Sector>, AppError> {
        let state = self.state.lock().await;
        let mut sectors = state.sectors.clone();
        sectors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sectors)
    }

    async fn find_sector(&self, id: Uuid) -> Result<Option<Sector>, AppError> {
        let state = self.state.lock().await;
        Ok(state.sectors.iter().find(|s| s.id == id).cloned())
    }

    async fn create_sector(&self, name: &str) -> Result<Sector, AppError> {
        let mut state = self.state.lock().await;
        if state.sectors.iter().any(|s| s.name == name) {
            return Err(AppError::SectorAlreadyExists(name.to_string()));
        }
        let sector = Sector { id: Uuid::new_v4(), name: name.to_string() };
        state.sectors.push(sector.clone());
        Ok(sector)
    }
}

#[async_trait]
impl StockRepository for InMemoryStore {
    async fn list_items(&self, filter: &StockFilter) -> Result<Vec<StockItem>, AppError> {
        let state = self.state.lock().await;
        let mut items: Vec<StockItem> = state
            .items
            .iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn list_categories(&self) -> Result<Vec<String>, AppError> {
        let state = self.state.lock().await;
        let mut categories: Vec<String> = state.items.iter().map(|i| i.category.clone()).collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<StockItem>, AppError> {
        let state = self.state.lock().await;
        Ok(state.item(id).cloned())
    }

    async fn create_item(&self, new_item: NewStockItem, created_by: Uuid) -> Result<StockItem, AppError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let item = StockItem {
            id: Uuid::new_v4(),
            name: new_item.name,
            category: new_item.category,
            quantity: new_item.quantity,
            unit: new_item.unit,
            min_level: new_item.min_level,
            created_at: now,
            updated_at: now,
        };
        state.items.push(item.clone());

        if item.quantity > 0 {
            state.push_movement(
                item.id,
                MovementType::In,
                item.quantity,
                now,
                Some(created_by),
                Some("Stock inicial".to_string()),
                None,
            );
        }
        Ok(item)
    }
}

#[async_trait]
impl MovementRepository for InMemoryStore {
    async fn list_movements(&self) -> Result<Vec<StockMovement>, AppError> {
        let state = self.state.lock().await;
        Ok(state.movements_where(|_| true))
    }

    async fn list_item_movements(&self, item_id: Uuid) -> Result<Vec<StockMovement>, AppError> {
        let state = self.state.lock().await;
        Ok(state.movements_where(|m| m.item_id == item_id))
    }

    async fn record_entry(&self, entry: NewStockEntry) -> Result<StockMovement, AppError> {
        let mut state = self.state.lock().await;

        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == entry.item_id)
            .ok_or(AppError::ItemNotFound(entry.item_id))?;
        item.quantity = item
            .quantity
            .checked_add(entry.quantity)
            .ok_or_else(|| anyhow::anyhow!("quantidade do item {} estourou i32", entry.item_id))?;
        item.updated_at = Utc::now();

        let id = state.push_movement(
            entry.item_id,
            MovementType::In,
            entry.quantity,
            entry.date,
            Some(entry.user_id),
            Some(entry.reason),
            None,
        );

        let stored = state
            .movements
            .last()
            .filter(|m| m.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("movimento {} não foi gravado", id))?;
        Ok(state.hydrate_movement(&stored))
    }
}

#[async_trait]
impl RequisitionRepository for InMemoryStore {
    async fn list_requisitions(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Requisition>, AppError> {
        let state = self.state.lock().await;
        let mut requisitions: Vec<Requisition> = state
            .requisitions
            .iter()
            .rev()
            .filter(|r| since.is_none_or(|since| r.date >= since))
            .map(|r| state.hydrate_requisition(r))
            .collect();
        requisitions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(requisitions)
    }

    async fn find_requisition(&self, id: Uuid) -> Result<Option<Requisition>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .requisitions
            .iter()
            .find(|r| r.id == id)
            .map(|r| state.hydrate_requisition(r)))
    }

    async fn submit_requisition(&self, draft: RequisitionDraft) -> Result<Requisition, AppError> {
        let mut state = self.state.lock().await;

        let sector_name = state
            .sectors
            .iter()
            .find(|s| s.id == draft.sector_id)
            .map(|s| s.name.clone())
            .ok_or(AppError::SectorNotFound(draft.sector_id))?;

        // 1. Valida todas as linhas antes de tocar em qualquer saldo.
        //    Linhas repetidas do mesmo item somam contra o mesmo saldo.
        let mut required: HashMap<usize, i32> = HashMap::new();
        for line in &draft.lines {
            let position = state
                .items
                .iter()
                .position(|i| i.id == line.item_id)
                .ok_or(AppError::ItemNotFound(line.item_id))?;
            let item = &state.items[position];
            let total = required.entry(position).or_insert(0);
            *total = total
                .checked_add(line.quantity)
                .ok_or_else(|| anyhow::anyhow!("quantidade pedida para {} estourou i32", item.id))?;
            if item.quantity < *total {
                return Err(AppError::InsufficientStock {
                    item_id: item.id,
                    item_name: item.name.clone(),
                    unit: item.unit.clone(),
                    available: item.quantity,
                });
            }
        }

        // 2. Desconta
        let now = Utc::now();
        for (position, quantity) in required {
            let item = &mut state.items[position];
            item.quantity -= quantity;
            item.updated_at = now;
        }

        // 3. Grava requisição e as SAIDAS
        let requisition_id = Uuid::new_v4();
        let reason = format!("Requisição - {}", sector_name);
        for line in &draft.lines {
            state.push_movement(
                line.item_id,
                MovementType::Out,
                line.quantity,
                now,
                Some(draft.created_by_user_id),
                Some(reason.clone()),
                Some(requisition_id),
            );
        }

        let stored = StoredRequisition {
            id: requisition_id,
            sector_id: draft.sector_id,
            requester_name: draft.requester_name,
            date: now,
            status: RequisitionStatus::Completed,
            created_by_user_id: Some(draft.created_by_user_id),
            lines: draft.lines,
        };
        let requisition = state.hydrate_requisition(&stored);
        state.requisitions.push(stored);
        Ok(requisition)
    }
}

#[async_trait]
impl DashboardRepository for InMemoryStore {
    async fn stats(&self) -> Result<DashboardStats, AppError> {
        let state = self.state.lock().await;
        let count_status = |status: RequisitionStatus| {
            state.requisitions.iter().filter(|r| r.status == status).count() as i64
        };

        Ok(DashboardStats {
            total_items: state.items.len() as i64,
            low_stock_items: state.items.iter().filter(|i| i.quantity <= i.min_level).count() as i64,
            pending_requisitions: count_status(RequisitionStatus::Pending),
            completed_requisitions: count_status(RequisitionStatus::Completed),
        })
    }
}
