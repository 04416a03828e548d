// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::AppState, docs, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/health", get(handlers::auth::health))
        .route("/login", post(handlers::auth::login))
        .route("/openapi.json", get(docs::openapi_json));

    // Tudo o resto exige Bearer; cargo ADMIN é checado pelos extratores
    let protected_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/stock",
            get(handlers::inventory::get_all_items).post(handlers::inventory::create_item),
        )
        .route("/stock/categories", get(handlers::inventory::get_categories))
        .route("/stock/{id}", get(handlers::inventory::get_item))
        .route(
            "/movements",
            get(handlers::inventory::get_movements).post(handlers::inventory::add_stock),
        )
        .route("/movements/item/{id}", get(handlers::inventory::get_item_movements))
        .route(
            "/requisitions",
            get(handlers::requisitions::get_all_requisitions)
                .post(handlers::requisitions::create_requisition),
        )
        .route("/requisitions/{id}", get(handlers::requisitions::get_requisition))
        .route(
            "/sectors",
            get(handlers::requisitions::get_sectors).post(handlers::requisitions::create_sector),
        )
        .route("/stats", get(handlers::dashboard::get_stats))
        .route("/reports", get(handlers::dashboard::get_report))
        .route(
            "/users",
            get(handlers::users::list_users)
                .post(handlers::users::create_user)
                .put(handlers::users::update_user),
        )
        .route("/users/{id}", delete(handlers::users::delete_user))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
