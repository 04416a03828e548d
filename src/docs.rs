// src/docs.rs

use axum::Json;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::health,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- Inventory ---
        handlers::inventory::get_all_items,
        handlers::inventory::get_categories,
        handlers::inventory::get_item,
        handlers::inventory::create_item,

        // --- Movements ---
        handlers::inventory::get_movements,
        handlers::inventory::get_item_movements,
        handlers::inventory::add_stock,

        // --- Requisitions / Sectors ---
        handlers::requisitions::create_requisition,
        handlers::requisitions::get_all_requisitions,
        handlers::requisitions::get_requisition,
        handlers::requisitions::get_sectors,
        handlers::requisitions::create_sector,

        // --- Dashboard ---
        handlers::dashboard::get_stats,
        handlers::dashboard::get_report,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::LoginResponse,
            models::users::CreateUserPayload,
            models::users::UpdateUserPayload,

            // --- Inventory ---
            models::inventory::StockItem,
            models::inventory::StockLevel,
            models::inventory::StockItemView,
            models::inventory::MovementType,
            models::inventory::StockMovement,
            handlers::inventory::CreateStockItemPayload,
            handlers::inventory::CreateMovementPayload,

            // --- Requisitions ---
            models::requisitions::Sector,
            models::requisitions::RequisitionStatus,
            models::requisitions::RequisitionLine,
            models::requisitions::Requisition,
            handlers::requisitions::CreateRequisitionPayload,
            handlers::requisitions::RequisitionItemPayload,
            handlers::requisitions::CreateSectorPayload,

            // --- Dashboard ---
            models::dashboard::DashboardStats,
            models::dashboard::ReportPeriod,
            models::dashboard::PeriodReport,
        )
    ),
    tags(
        (name = "Auth", description = "Login e sessão"),
        (name = "Users", description = "Gestão de usuários (ADMIN)"),
        (name = "Inventory", description = "Catálogo de stock"),
        (name = "Movements", description = "Entradas e histórico de movimentos"),
        (name = "Requisitions", description = "Requisições dos setores"),
        (name = "Sectors", description = "Setores do hotel"),
        (name = "Dashboard", description = "Indicadores e relatórios")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

// GET /api/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_and_the_bearer_scheme() {
        let doc = ApiDoc::openapi();

        for path in ["/api/login", "/api/stock/{id}", "/api/requisitions", "/api/users/{id}", "/api/reports"] {
            assert!(doc.paths.paths.contains_key(path), "faltou {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
