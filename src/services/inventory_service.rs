// src/services/inventory_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::{field_error, AppError},
    db::{MovementRepository, StockRepository},
    models::{
        auth::User,
        inventory::{
            MovementType, NewStockEntry, NewStockItem, StockFilter, StockItemView, StockMovement,
        },
    },
};

pub const DEFAULT_ENTRY_REASON: &str = "Entrada Manual de Stock";

#[derive(Clone)]
pub struct InventoryService {
    stock_repo: Arc<dyn StockRepository>,
    movement_repo: Arc<dyn MovementRepository>,
}

impl InventoryService {
    pub fn new(stock_repo: Arc<dyn StockRepository>, movement_repo: Arc<dyn MovementRepository>) -> Self {
        Self { stock_repo, movement_repo }
    }

    // --- STOCK ---

    pub async fn list_items(&self, filter: &StockFilter) -> Result<Vec<StockItemView>, AppError> {
        let items = self.stock_repo.list_items(filter).await?;
        Ok(items.into_iter().map(StockItemView::from).collect())
    }

    pub async fn list_categories(&self) -> Result<Vec<String>, AppError> {
        self.stock_repo.list_categories().await
    }

    pub async fn get_item(&self, id: Uuid) -> Result<StockItemView, AppError> {
        self.stock_repo
            .find_item(id)
            .await?
            .map(StockItemView::from)
            .ok_or(AppError::ItemNotFound(id))
    }

    pub async fn create_item(&self, new_item: NewStockItem, user: &User) -> Result<StockItemView, AppError> {
        if new_item.quantity < 0 {
            return Err(field_error("quantity", "range", "A quantidade inicial não pode ser negativa"));
        }
        if new_item.min_level < 0 {
            return Err(field_error("minLevel", "range", "Nível mínimo deve ser positivo"));
        }

        let item = self.stock_repo.create_item(new_item, user.id).await?;
        tracing::info!(item_id = %item.id, name = %item.name, quantity = item.quantity, "Item de stock criado");
        Ok(item.into())
    }

    // --- MOVIMENTOS ---

    pub async fn list_movements(&self) -> Result<Vec<StockMovement>, AppError> {
        self.movement_repo.list_movements().await
    }

    pub async fn item_movements(&self, item_id: Uuid) -> Result<Vec<StockMovement>, AppError> {
        if self.stock_repo.find_item(item_id).await?.is_none() {
            return Err(AppError::ItemNotFound(item_id));
        }
        self.movement_repo.list_item_movements(item_id).await
    }

    /// Entrada de stock: soma `quantity` ao item e grava a ENTRADA no histórico.
    pub async fn add_stock(
        &self,
        item_id: Uuid,
        quantity: i32,
        movement_type: Option<MovementType>,
        date: Option<DateTime<Utc>>,
        reason: Option<String>,
        user: &User,
    ) -> Result<StockMovement, AppError> {
        if movement_type == Some(MovementType::Out) {
            return Err(AppError::OutboundMovementNotAllowed);
        }
        if quantity <= 0 {
            return Err(field_error("quantity", "range", "A quantidade deve ser maior que 0"));
        }

        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ENTRY_REASON.to_string());

        let movement = self
            .movement_repo
            .record_entry(NewStockEntry {
                item_id,
                quantity,
                date: date.unwrap_or_else(Utc::now),
                user_id: user.id,
                reason,
            })
            .await?;

        tracing::info!(item_id = %item_id, quantity, user_id = %user.id, "Entrada de stock registada");
        Ok(movement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{InMemoryStore, UserRepository},
        models::{auth::UserRole, inventory::StockLevel, users::NewUser},
    };

    async fn setup() -> (InventoryService, User) {
        let store = Arc::new(InMemoryStore::new());
        let user = store
            .create_user(NewUser {
                name: "Operador".into(),
                email: "op@messe.com".into(),
                role: UserRole::Operator,
                avatar: None,
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        (InventoryService::new(store.clone(), store), user)
    }

    fn rice(quantity: i32) -> NewStockItem {
        NewStockItem {
            name: "Arroz".into(),
            category: "Grãos".into(),
            quantity,
            unit: "kg".into(),
            min_level: 5,
        }
    }

    #[tokio::test]
    async fn stock_entry_increases_quantity_by_exactly_q() {
        let (service, user) = setup().await;
        let item = service.create_item(rice(10), &user).await.unwrap().item;

        let movement = service
            .add_stock(item.id, 7, None, None, None, &user)
            .await
            .unwrap();

        assert_eq!(movement.movement_type, MovementType::In);
        assert_eq!(movement.quantity, 7);
        assert_eq!(movement.reason.as_deref(), Some(DEFAULT_ENTRY_REASON));
        assert_eq!(movement.user_name.as_deref(), Some("Operador"));
        assert_eq!(service.get_item(item.id).await.unwrap().item.quantity, 17);
    }

    #[tokio::test]
    async fn entry_with_zero_quantity_or_outbound_type_changes_nothing() {
        let (service, user) = setup().await;
        let item = service.create_item(rice(10), &user).await.unwrap().item;

        let err = service.add_stock(item.id, 0, None, None, None, &user).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service
            .add_stock(item.id, 3, Some(MovementType::Out), None, None, &user)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OutboundMovementNotAllowed));

        assert_eq!(service.get_item(item.id).await.unwrap().item.quantity, 10);
    }

    #[tokio::test]
    async fn entry_for_unknown_item_is_not_found() {
        let (service, user) = setup().await;
        let missing = Uuid::new_v4();

        let err = service.add_stock(missing, 3, None, None, None, &user).await.unwrap_err();

        assert!(matches!(err, AppError::ItemNotFound(id) if id == missing));
        assert!(service.list_movements().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn initial_stock_is_recorded_in_item_history() {
        let (service, user) = setup().await;
        let created = service.create_item(rice(10), &user).await.unwrap();
        let empty = service
            .create_item(NewStockItem { name: "Feijão".into(), ..rice(0) }, &user)
            .await
            .unwrap();

        assert_eq!(created.status, StockLevel::Low);
        let history = service.item_movements(created.item.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reason.as_deref(), Some("Stock inicial"));
        assert!(service.item_movements(empty.item.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn negative_initial_values_are_rejected() {
        let (service, user) = setup().await;

        let err = service.create_item(rice(-1), &user).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(service.list_items(&StockFilter::default()).await.unwrap().is_empty());
    }
}
