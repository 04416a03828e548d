// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AuthSettings,
    db::UserRepository,
    models::auth::{Claims, LoginResponse, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserRepository>, settings: AuthSettings) -> Self {
        Self { user_repo, settings }
    }

    /// Gera o hash bcrypt numa thread de bloqueio.
    pub async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let cost = self.settings.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = match self.user_repo.find_by_email(email).await? {
            Some(user) => user,
            None => {
                tracing::warn!(email, "Login recusado: e-mail desconhecido");
                return Err(AppError::InvalidCredentials);
            }
        };

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::warn!(user_id = %user.id, "Login recusado: senha incorreta");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(user.id)?;
        tracing::info!(user_id = %user.id, "Login efetuado");
        Ok(LoginResponse { user, token })
    }

    /// Decodifica o token e recarrega o usuário (apagados ou com cargo alterado refletem já).
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.settings.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.settings.token_ttl_hours);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.settings.jwt_secret.as_bytes()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::InMemoryStore,
        models::{auth::UserRole, users::NewUser},
    };

    fn settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: "segredo-de-teste".into(),
            token_ttl_hours: 1,
            bcrypt_cost: 4,
        }
    }

    async fn service_with_user(password: &str) -> (AuthService, User) {
        let store = Arc::new(InMemoryStore::new());
        let service = AuthService::new(store.clone(), settings());
        let password_hash = service.hash_password(password).await.unwrap();
        let user = store
            .create_user(NewUser {
                name: "Ana Operadora".into(),
                email: "ana@messe.com".into(),
                role: UserRole::Operator,
                avatar: None,
                password_hash,
            })
            .await
            .unwrap();
        (service, user)
    }

    #[tokio::test]
    async fn login_returns_user_and_token_that_validates_back() {
        let (service, user) = service_with_user("segredo123").await;

        let response = service.login_user("ana@messe.com", "segredo123").await.unwrap();
        assert_eq!(response.user.id, user.id);

        let validated = service.validate_token(&response.token).await.unwrap();
        assert_eq!(validated.id, user.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_invalid_credentials() {
        let (service, _) = service_with_user("segredo123").await;

        let err = service.login_user("ana@messe.com", "errada").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let err = service.login_user("ninguem@messe.com", "segredo123").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn tampered_or_foreign_tokens_are_rejected() {
        let (service, _) = service_with_user("segredo123").await;
        let token = service.login_user("ana@messe.com", "segredo123").await.unwrap().token;

        let other = AuthService::new(
            Arc::new(InMemoryStore::new()),
            AuthSettings { jwt_secret: "outro".into(), ..settings() },
        );
        assert!(matches!(other.validate_token(&token).await, Err(AppError::InvalidToken)));
        assert!(matches!(service.validate_token("lixo").await, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn token_of_deleted_user_stops_working() {
        let store = Arc::new(InMemoryStore::new());
        let service = AuthService::new(store.clone(), settings());
        let password_hash = service.hash_password("segredo123").await.unwrap();
        let user = store
            .create_user(NewUser {
                name: "Temporário".into(),
                email: "temp@messe.com".into(),
                role: UserRole::Operator,
                avatar: None,
                password_hash,
            })
            .await
            .unwrap();
        let token = service.login_user("temp@messe.com", "segredo123").await.unwrap().token;

        store.delete_user(user.id).await.unwrap();

        assert!(matches!(service.validate_token(&token).await, Err(AppError::InvalidToken)));
    }
}
