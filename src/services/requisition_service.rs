// src/services/requisition_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::{field_error, AppError},
    db::{RequisitionRepository, SectorRepository},
    models::{
        auth::User,
        requisitions::{DraftLine, Requisition, RequisitionDraft, Sector},
    },
};

#[derive(Clone)]
pub struct RequisitionService {
    requisition_repo: Arc<dyn RequisitionRepository>,
    sector_repo: Arc<dyn SectorRepository>,
}

impl RequisitionService {
    pub fn new(
        requisition_repo: Arc<dyn RequisitionRepository>,
        sector_repo: Arc<dyn SectorRepository>,
    ) -> Self {
        Self { requisition_repo, sector_repo }
    }

    // --- SETORES ---

    pub async fn list_sectors(&self) -> Result<Vec<Sector>, AppError> {
        self.sector_repo.list_sectors().await
    }

    pub async fn create_sector(&self, name: &str) -> Result<Sector, AppError> {
        let sector = self.sector_repo.create_sector(name.trim()).await?;
        tracing::info!(sector_id = %sector.id, name = %sector.name, "Setor criado");
        Ok(sector)
    }

    // --- REQUISIÇÕES ---

    pub async fn list_requisitions(&self) -> Result<Vec<Requisition>, AppError> {
        self.requisition_repo.list_requisitions(None).await
    }

    pub async fn get_requisition(&self, id: Uuid) -> Result<Requisition, AppError> {
        self.requisition_repo
            .find_requisition(id)
            .await?
            .ok_or(AppError::RequisitionNotFound(id))
    }

    /// Submete a requisição: ou todas as linhas têm saldo e o stock é descontado,
    /// ou nada muda.
    pub async fn submit_requisition(
        &self,
        sector_id: Uuid,
        requester_name: &str,
        lines: &[DraftLine],
        user: &User,
    ) -> Result<Requisition, AppError> {
        let requester_name = requester_name.trim();
        if requester_name.chars().count() < 3 {
            return Err(field_error(
                "nomeRequisitante",
                "length",
                "Nome do requisitante é obrigatório e deve ter 3+ caracteres",
            ));
        }

        let lines = merge_lines(lines)?;

        if self.sector_repo.find_sector(sector_id).await?.is_none() {
            return Err(AppError::SectorNotFound(sector_id));
        }

        let requisition = self
            .requisition_repo
            .submit_requisition(RequisitionDraft {
                sector_id,
                requester_name: requester_name.to_string(),
                created_by_user_id: user.id,
                lines,
            })
            .await?;

        tracing::info!(
            requisition_id = %requisition.id,
            sector = requisition.sector_name.as_deref().unwrap_or("-"),
            lines = requisition.items.len(),
            user_id = %user.id,
            "Requisição concluída, stock descontado"
        );
        Ok(requisition)
    }
}

/// Consolida linhas repetidas do mesmo item (soma as quantidades), mantendo a
/// ordem da primeira ocorrência. Duas linhas de 6 contra um saldo de 10 têm de falhar.
fn merge_lines(lines: &[DraftLine]) -> Result<Vec<DraftLine>, AppError> {
    if lines.is_empty() {
        return Err(field_error("items", "length", "Adicione pelo menos um item"));
    }

    let mut merged: Vec<DraftLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity < 1 {
            return Err(field_error("items", "range", "Qtd minima 1"));
        }
        match merged.iter_mut().find(|m| m.item_id == line.item_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or_else(|| field_error("items", "range", "Quantidade demasiado grande"))?;
            }
            None => merged.push(*line),
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{InMemoryStore, MovementRepository, SectorRepository, StockRepository, UserRepository},
        models::{
            auth::UserRole,
            inventory::{MovementType, NewStockItem, StockItem, StockLevel},
            users::NewUser,
        },
    };

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: RequisitionService,
        user: User,
        sector: Sector,
    }

    impl Fixture {
        async fn new() -> Self {
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
            let sector = store.create_sector("Cozinha").await.unwrap();
            let service = RequisitionService::new(store.clone(), store.clone());
            Self { store, service, user, sector }
        }

        async fn item(&self, name: &str, quantity: i32, min_level: i32) -> StockItem {
            self.store
                .create_item(
                    NewStockItem {
                        name: name.into(),
                        category: "Mercearia".into(),
                        quantity,
                        unit: "kg".into(),
                        min_level,
                    },
                    self.user.id,
                )
                .await
                .unwrap()
        }

        async fn quantity_of(&self, id: Uuid) -> i32 {
            self.store.find_item(id).await.unwrap().unwrap().quantity
        }

        async fn submit(&self, lines: &[DraftLine]) -> Result<Requisition, AppError> {
            self.service
                .submit_requisition(self.sector.id, "Chefe de Cozinha", lines, &self.user)
                .await
        }
    }

    fn line(item: &StockItem, quantity: i32) -> DraftLine {
        DraftLine { item_id: item.id, quantity }
    }

    #[tokio::test]
    async fn rice_example_rejects_twelve_then_accepts_eight() {
        let fx = Fixture::new().await;
        let rice = fx.item("Arroz", 10, 5).await;

        let err = fx.submit(&[line(&rice, 12)]).await.unwrap_err();
        match err {
            AppError::InsufficientStock { item_id, available, .. } => {
                assert_eq!(item_id, rice.id);
                assert_eq!(available, 10);
            }
            other => panic!("esperava InsufficientStock, veio {other:?}"),
        }
        assert_eq!(fx.quantity_of(rice.id).await, 10);
        assert!(fx.service.list_requisitions().await.unwrap().is_empty());

        let requisition = fx.submit(&[line(&rice, 8)]).await.unwrap();
        assert_eq!(requisition.items.len(), 1);
        assert_eq!(requisition.sector_name.as_deref(), Some("Cozinha"));

        let after = fx.store.find_item(rice.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 2);
        assert_eq!(after.stock_level(), StockLevel::Critical);
    }

    #[tokio::test]
    async fn one_failing_line_leaves_every_item_untouched() {
        let fx = Fixture::new().await;
        let rice = fx.item("Arroz", 10, 5).await;
        let oil = fx.item("Óleo", 3, 1).await;

        let err = fx.submit(&[line(&rice, 4), line(&oil, 5)]).await.unwrap_err();

        assert!(matches!(err, AppError::InsufficientStock { item_id, .. } if item_id == oil.id));
        assert_eq!(fx.quantity_of(rice.id).await, 10);
        assert_eq!(fx.quantity_of(oil.id).await, 3);
        assert!(fx.service.list_requisitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_decrements_only_referenced_items_and_logs_outbound_movements() {
        let fx = Fixture::new().await;
        let rice = fx.item("Arroz", 10, 5).await;
        let oil = fx.item("Óleo", 3, 1).await;
        let salt = fx.item("Sal", 20, 2).await;

        let requisition = fx.submit(&[line(&rice, 4), line(&oil, 3)]).await.unwrap();

        assert_eq!(fx.quantity_of(rice.id).await, 6);
        assert_eq!(fx.quantity_of(oil.id).await, 0);
        assert_eq!(fx.quantity_of(salt.id).await, 20);

        let outbound: Vec<_> = fx
            .store
            .list_movements()
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.movement_type == MovementType::Out)
            .collect();
        assert_eq!(outbound.len(), 2);
        assert!(outbound.iter().all(|m| m.requisition_id == Some(requisition.id)));
        assert_eq!(fx.service.get_requisition(requisition.id).await.unwrap().id, requisition.id);
    }

    #[tokio::test]
    async fn repeated_lines_for_same_item_are_checked_together() {
        let fx = Fixture::new().await;
        let rice = fx.item("Arroz", 10, 5).await;

        let err = fx.submit(&[line(&rice, 6), line(&rice, 6)]).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));
        assert_eq!(fx.quantity_of(rice.id).await, 10);

        let requisition = fx.submit(&[line(&rice, 3), line(&rice, 4)]).await.unwrap();
        assert_eq!(requisition.items.len(), 1);
        assert_eq!(requisition.items[0].quantity, 7);
        assert_eq!(fx.quantity_of(rice.id).await, 3);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_before_touching_stock() {
        let fx = Fixture::new().await;
        let rice = fx.item("Arroz", 10, 5).await;

        let err = fx.submit(&[]).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = fx
            .service
            .submit_requisition(fx.sector.id, "  ", &[line(&rice, 1)], &fx.user)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = fx.submit(&[line(&rice, 0)]).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = fx
            .service
            .submit_requisition(Uuid::new_v4(), "Chefe de Cozinha", &[line(&rice, 1)], &fx.user)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SectorNotFound(_)));

        assert_eq!(fx.quantity_of(rice.id).await, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requisitions_cannot_over_deduct() {
        let fx = Fixture::new().await;
        let rice = fx.item("Arroz", 10, 5).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = fx.service.clone();
            let user = fx.user.clone();
            let sector_id = fx.sector.id;
            let lines = vec![line(&rice, 4)];
            handles.push(tokio::spawn(async move {
                service
                    .submit_requisition(sector_id, "Chefe de Cozinha", &lines, &user)
                    .await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(AppError::InsufficientStock { .. }) => {}
                Err(other) => panic!("erro inesperado: {other:?}"),
            }
        }

        // 10 kg só chegam para duas requisições de 4
        assert_eq!(succeeded, 2);
        assert_eq!(fx.quantity_of(rice.id).await, 2);
        assert_eq!(fx.service.list_requisitions().await.unwrap().len(), 2);
    }

    #[test]
    fn merge_keeps_first_seen_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let merged = merge_lines(&[
            DraftLine { item_id: b, quantity: 1 },
            DraftLine { item_id: a, quantity: 2 },
            DraftLine { item_id: b, quantity: 3 },
        ])
        .unwrap();

        assert_eq!(
            merged,
            vec![DraftLine { item_id: b, quantity: 4 }, DraftLine { item_id: a, quantity: 2 }]
        );
    }
}
