// src/services/user_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::BootstrapAdmin,
    db::UserRepository,
    models::{
        auth::{User, UserRole},
        users::{CreateUserPayload, NewUser, UpdateUserPayload, UserChanges},
    },
    services::auth::AuthService,
};

#[derive(Clone)]
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    auth_service: AuthService,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, auth_service: AuthService) -> Self {
        Self { user_repo, auth_service }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list_users().await
    }

    pub async fn create_user(&self, payload: CreateUserPayload) -> Result<User, AppError> {
        let password_hash = self.auth_service.hash_password(&payload.password).await?;

        let user = self
            .user_repo
            .create_user(NewUser {
                name: payload.name.trim().to_string(),
                email: normalize_email(&payload.email),
                role: payload.role,
                avatar: payload.avatar,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = ?user.role, "Usuário criado");
        Ok(user)
    }

    pub async fn update_user(&self, payload: UpdateUserPayload) -> Result<User, AppError> {
        let password_hash = match payload.password.as_deref() {
            Some(password) => Some(self.auth_service.hash_password(password).await?),
            None => None,
        };

        self.user_repo
            .update_user(
                payload.id,
                UserChanges {
                    name: payload.name.trim().to_string(),
                    email: normalize_email(&payload.email),
                    role: payload.role,
                    avatar: payload.avatar,
                    password_hash,
                },
            )
            .await
    }

    /// Regra de negócio: ninguém apaga a própria conta.
    pub async fn delete_user(&self, acting_user: &User, target_id: Uuid) -> Result<(), AppError> {
        if acting_user.id == target_id {
            tracing::warn!(user_id = %acting_user.id, "Tentativa de auto-exclusão bloqueada");
            return Err(AppError::SelfDeletion);
        }

        self.user_repo.delete_user(target_id).await?;
        tracing::info!(user_id = %target_id, deleted_by = %acting_user.id, "Usuário removido");
        Ok(())
    }

    /// Cria o primeiro ADMIN quando a tabela de usuários está vazia.
    pub async fn ensure_bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<Option<User>, AppError> {
        if self.user_repo.count_users().await? > 0 {
            return Ok(None);
        }

        let user = self
            .create_user(CreateUserPayload {
                name: admin.name.clone(),
                email: admin.email.clone(),
                role: UserRole::Admin,
                password: admin.password.clone(),
                avatar: None,
            })
            .await?;

        tracing::info!(email = %user.email, "✅ Administrador inicial criado");
        Ok(Some(user))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AuthSettings, db::InMemoryStore};

    fn service() -> UserService {
        let store = Arc::new(InMemoryStore::new());
        let auth = AuthService::new(
            store.clone(),
            AuthSettings {
                jwt_secret: "segredo-de-teste".into(),
                token_ttl_hours: 1,
                bcrypt_cost: 4,
            },
        );
        UserService::new(store, auth)
    }

    fn payload(name: &str, email: &str, role: UserRole) -> CreateUserPayload {
        CreateUserPayload {
            name: name.into(),
            email: email.into(),
            role,
            password: "segredo123".into(),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn admin_cannot_delete_own_account() {
        let service = service();
        let admin = service
            .create_user(payload("Chefe", "chefe@messe.com", UserRole::Admin))
            .await
            .unwrap();

        let err = service.delete_user(&admin, admin.id).await.unwrap_err();

        assert!(matches!(err, AppError::SelfDeletion));
        assert_eq!(service.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn admin_deletes_another_user() {
        let service = service();
        let admin = service
            .create_user(payload("Chefe", "chefe@messe.com", UserRole::Admin))
            .await
            .unwrap();
        let operator = service
            .create_user(payload("Operador", "op@messe.com", UserRole::Operator))
            .await
            .unwrap();

        service.delete_user(&admin, operator.id).await.unwrap();

        let remaining = service.list_users().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, admin.id);

        let err = service.delete_user(&admin, operator.id).await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let service = service();
        service
            .create_user(payload("Primeiro", "dup@messe.com", UserRole::Operator))
            .await
            .unwrap();

        let err = service
            .create_user(payload("Segundo", "  DUP@messe.com ", UserRole::Operator))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::EmailAlreadyExists));
    }

    #[tokio::test]
    async fn update_keeps_password_hash_when_no_new_password() {
        let service = service();
        let user = service
            .create_user(payload("Operador", "op@messe.com", UserRole::Operator))
            .await
            .unwrap();

        let updated = service
            .update_user(UpdateUserPayload {
                id: user.id,
                name: "Operador Sénior".into(),
                email: "op@messe.com".into(),
                role: UserRole::Admin,
                password: None,
                avatar: Some("https://cdn.messe.com/op.png".into()),
            })
            .await
            .unwrap();

        assert_eq!(updated.name, "Operador Sénior");
        assert_eq!(updated.role, UserRole::Admin);
        assert_eq!(updated.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn bootstrap_admin_only_runs_on_empty_table() {
        let service = service();
        let admin = BootstrapAdmin {
            name: "Administrador".into(),
            email: "admin@messe.com".into(),
            password: "segredo123".into(),
        };

        let created = service.ensure_bootstrap_admin(&admin).await.unwrap();
        assert_eq!(created.map(|u| u.role), Some(UserRole::Admin));

        let again = service.ensure_bootstrap_admin(&admin).await.unwrap();
        assert!(again.is_none());
    }
}
