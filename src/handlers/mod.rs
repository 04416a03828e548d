pub mod auth;
pub mod dashboard;
pub mod inventory;
pub mod requisitions;
pub mod users;
