// src/services/dashboard_service.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, Months, Utc};

use crate::{
    common::error::AppError,
    db::{DashboardRepository, RequisitionRepository, StockRepository},
    models::{
        dashboard::{DashboardStats, PeriodReport, ReportPeriod},
        inventory::{StockFilter, StockItem},
    },
};

#[derive(Clone)]
pub struct DashboardService {
    repo: Arc<dyn DashboardRepository>,
    requisition_repo: Arc<dyn RequisitionRepository>,
    stock_repo: Arc<dyn StockRepository>,
}

impl DashboardService {
    pub fn new(
        repo: Arc<dyn DashboardRepository>,
        requisition_repo: Arc<dyn RequisitionRepository>,
        stock_repo: Arc<dyn StockRepository>,
    ) -> Self {
        Self { repo, requisition_repo, stock_repo }
    }

    pub async fn get_stats(&self) -> Result<DashboardStats, AppError> {
        self.repo.stats().await
    }

    pub async fn get_report(&self, period: ReportPeriod) -> Result<PeriodReport, AppError> {
        self.report_at(period, Utc::now()).await
    }

    async fn report_at(&self, period: ReportPeriod, now: DateTime<Utc>) -> Result<PeriodReport, AppError> {
        let start_date = period_start(period, now);

        let requisitions: Vec<_> = self
            .requisition_repo
            .list_requisitions(Some(start_date))
            .await?
            .into_iter()
            .filter(|r| r.date <= now)
            .collect();

        let stats = self.repo.stats().await?;

        // Alerta de reposição: só o que está em nível crítico
        let critical_items: Vec<StockItem> = self
            .stock_repo
            .list_items(&StockFilter::default())
            .await?
            .into_iter()
            .filter(StockItem::is_critical)
            .collect();

        Ok(PeriodReport {
            period,
            start_date,
            end_date: now,
            generated_at: Utc::now(),
            stats,
            requisition_count: requisitions.len(),
            requisitions,
            critical_items,
        })
    }
}

/// Semanal: 7 dias para trás. Mensal: o mesmo dia do mês anterior.
fn period_start(period: ReportPeriod, now: DateTime<Utc>) -> DateTime<Utc> {
    match period {
        ReportPeriod::Weekly => now - Duration::days(7),
        ReportPeriod::Monthly => now
            .checked_sub_months(Months::new(1))
            .unwrap_or_else(|| now - Duration::days(30)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{InMemoryStore, SectorRepository, UserRepository},
        models::{
            auth::UserRole,
            inventory::NewStockItem,
            requisitions::{DraftLine, RequisitionDraft},
            users::NewUser,
        },
    };
    use chrono::TimeZone;

    #[test]
    fn period_bounds_follow_calendar() {
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap();

        assert_eq!(
            period_start(ReportPeriod::Weekly, now),
            Utc.with_ymd_and_hms(2025, 3, 24, 12, 0, 0).unwrap()
        );
        // 31 de fevereiro não existe: chrono encosta no último dia do mês
        assert_eq!(
            period_start(ReportPeriod::Monthly, now),
            Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn stats_and_report_reflect_store() {
        let store = Arc::new(InMemoryStore::new());
        let service = DashboardService::new(store.clone(), store.clone(), store.clone());
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
        let sector = store.create_sector("Bar").await.unwrap();

        let new_item = |name: &str, quantity, min_level| NewStockItem {
            name: name.into(),
            category: "Bebidas".into(),
            quantity,
            unit: "un".into(),
            min_level,
        };
        let water = store.create_item(new_item("Água", 30, 10), user.id).await.unwrap();
        store.create_item(new_item("Gelo", 2, 5), user.id).await.unwrap();

        store
            .submit_requisition(RequisitionDraft {
                sector_id: sector.id,
                requester_name: "Barman".into(),
                created_by_user_id: user.id,
                lines: vec![DraftLine { item_id: water.id, quantity: 25 }],
            })
            .await
            .unwrap();

        let stats = service.get_stats().await.unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                total_items: 2,
                low_stock_items: 2,
                pending_requisitions: 0,
                completed_requisitions: 1,
            }
        );

        let report = service.get_report(ReportPeriod::Weekly).await.unwrap();
        assert_eq!(report.requisition_count, 1);
        assert_eq!(report.critical_items.len(), 2);
        assert_eq!(report.stats, stats);
    }
}
