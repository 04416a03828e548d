// src/models/users.rs

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::UserRole;

// Formulário de criação de usuário (apenas ADMIN)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserPayload {
    #[validate(length(min = 3, message = "O nome deve ter pelo menos 3 caracteres"))]
    pub name: String,
    #[validate(email(message = "Email inválido"))]
    pub email: String,
    pub role: UserRole,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    pub avatar: Option<String>,
}

// PUT /users leva o usuário completo, com o `id` no corpo
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserPayload {
    pub id: Uuid,
    #[validate(length(min = 3, message = "O nome deve ter pelo menos 3 caracteres"))]
    pub name: String,
    #[validate(email(message = "Email inválido"))]
    pub email: String,
    pub role: UserRole,
    // Só troca a senha se vier preenchida
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,
    pub avatar: Option<String>,
}

/// Usuário pronto para inserir (senha já em hash).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub password_hash: Option<String>,
}
