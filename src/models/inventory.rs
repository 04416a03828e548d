// src/models/inventory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// --- 1. Itens de Stock ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub unit: String,
    pub min_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Situação do item face ao nível mínimo. Serve só para colorir a UI,
/// nunca bloqueia uma saída.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, ToSchema)]
pub enum StockLevel {
    #[serde(rename = "Crítico")]
    Critical,
    #[serde(rename = "Baixo")]
    Low,
    #[serde(rename = "Normal")]
    Normal,
}

impl StockLevel {
    pub fn classify(quantity: i32, min_level: i32) -> Self {
        if quantity <= min_level {
            StockLevel::Critical
        } else if quantity <= min_level.saturating_mul(2) {
            StockLevel::Low
        } else {
            StockLevel::Normal
        }
    }
}

impl StockItem {
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::classify(self.quantity, self.min_level)
    }

    pub fn is_critical(&self) -> bool {
        self.stock_level() == StockLevel::Critical
    }
}

// O que a API devolve: o item + a sua situação
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockItemView {
    #[serde(flatten)]
    pub item: StockItem,
    pub status: StockLevel,
}

impl From<StockItem> for StockItemView {
    fn from(item: StockItem) -> Self {
        let status = item.stock_level();
        Self { item, status }
    }
}

/// Filtros opcionais da listagem de stock.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl StockFilter {
    pub fn matches(&self, item: &StockItem) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                item.name.to_lowercase().contains(&term.to_lowercase())
            }
            _ => true,
        };
        let matches_category = match self.category.as_deref() {
            Some(category) if !category.is_empty() => item.category == category,
            _ => true,
        };
        matches_search && matches_category
    }
}

#[derive(Debug, Clone)]
pub struct NewStockItem {
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub unit: String,
    pub min_level: i32,
}

// --- 2. Movimentações de Stock ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "movement_type")]
pub enum MovementType {
    #[sqlx(rename = "ENTRADA")]
    #[serde(rename = "ENTRADA", alias = "IN")]
    In,
    #[sqlx(rename = "SAIDA")]
    #[serde(rename = "SAIDA", alias = "OUT")]
    Out,
}

// --- STOCK MOVEMENT (Histórico) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: Option<String>,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i32,
    pub date: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub reason: Option<String>,
    pub requisition_id: Option<Uuid>,
}

/// Entrada de stock já validada, pronta para o repositório.
#[derive(Debug, Clone)]
pub struct NewStockEntry {
    pub item_id: Uuid,
    pub quantity: i32,
    pub date: DateTime<Utc>,
    pub user_id: Uuid,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, category: &str, quantity: i32, min_level: i32) -> StockItem {
        StockItem {
            id: Uuid::new_v4(),
            name: name.into(),
            category: category.into(),
            quantity,
            unit: "kg".into(),
            min_level,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn classifies_stock_levels_against_min_level() {
        assert_eq!(StockLevel::classify(2, 5), StockLevel::Critical);
        assert_eq!(StockLevel::classify(5, 5), StockLevel::Critical);
        assert_eq!(StockLevel::classify(10, 5), StockLevel::Low);
        assert_eq!(StockLevel::classify(11, 5), StockLevel::Normal);
        assert_eq!(StockLevel::classify(0, 0), StockLevel::Critical);
    }

    #[test]
    fn view_serializes_flat_with_status() {
        let view = StockItemView::from(item("Arroz", "Grãos", 2, 5));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["name"], "Arroz");
        assert_eq!(json["minLevel"], 5);
        assert_eq!(json["status"], "Crítico");
    }

    #[test]
    fn filter_matches_name_case_insensitively_and_exact_category() {
        let arroz = item("Arroz Agulha", "Grãos", 10, 5);
        let filter = StockFilter { search: Some("arroz".into()), category: None };
        assert!(filter.matches(&arroz));

        let filter = StockFilter { search: None, category: Some("Bebidas".into()) };
        assert!(!filter.matches(&arroz));

        assert!(StockFilter::default().matches(&arroz));
    }

    #[test]
    fn movement_type_accepts_in_and_out_aliases() {
        let parsed: MovementType = serde_json::from_str("\"IN\"").unwrap();
        assert_eq!(parsed, MovementType::In);
        let parsed: MovementType = serde_json::from_str("\"SAIDA\"").unwrap();
        assert_eq!(parsed, MovementType::Out);
        assert_eq!(serde_json::to_string(&MovementType::In).unwrap(), "\"ENTRADA\"");
    }
}
