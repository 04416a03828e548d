pub mod auth;
pub mod dashboard_service;
pub mod inventory_service;
pub mod requisition_service;
pub mod user_service;
