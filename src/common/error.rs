// src/common/error.rs

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Corpo que nem chegou a virar payload (JSON malformado, tipo errado, enum desconhecido)
    #[error("Corpo da requisição inválido: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Setor já existe: {0}")]
    SectorAlreadyExists(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Tentativa de auto-exclusão")]
    SelfDeletion,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Item de stock não encontrado: {0}")]
    ItemNotFound(Uuid),

    #[error("Setor não encontrado: {0}")]
    SectorNotFound(Uuid),

    #[error("Requisição não encontrada: {0}")]
    RequisitionNotFound(Uuid),

    // Saídas só acontecem via requisição
    #[error("Movimento de saída não permitido")]
    OutboundMovementNotAllowed,

    #[error("Stock insuficiente para {item_name}: disponível {available}")]
    InsufficientStock {
        item_id: Uuid,
        item_name: String,
        unit: String,
        available: i32,
    },

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::OutboundMovementNotAllowed => {
                StatusCode::BAD_REQUEST
            }
            AppError::InvalidBody(JsonRejection::MissingJsonContentType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::SelfDeletion => StatusCode::FORBIDDEN,
            AppError::UserNotFound
            | AppError::ItemNotFound(_)
            | AppError::SectorNotFound(_)
            | AppError::RequisitionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::SectorAlreadyExists(_)
            | AppError::InsufficientStock { .. } => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::InsufficientStock { item_id, item_name, unit, available } => {
                let body = Json(json!({
                    "error": format!(
                        "Quantidade insuficiente para \"{}\". Disponível: {} {}.",
                        item_name, available, unit
                    ),
                    "details": {
                        "itemId": item_id,
                        "itemName": item_name,
                        "available": available,
                    },
                }));
                return (status, body).into_response();
            }
            AppError::InvalidBody(rejection) => {
                let body = Json(json!({
                    "error": "O corpo da requisição é inválido.",
                    "details": { "body": [rejection.body_text()] },
                }));
                return (status, body).into_response();
            }
            AppError::EmailAlreadyExists => "Este e-mail já está em uso.".to_string(),
            AppError::SectorAlreadyExists(name) => format!("O setor '{}' já existe.", name),
            AppError::InvalidCredentials => "Credenciais inválidas".to_string(),
            AppError::InvalidToken => "Token de autenticação inválido ou ausente.".to_string(),
            AppError::Forbidden => "Você não tem permissão para realizar esta ação.".to_string(),
            AppError::SelfDeletion => "Você não pode excluir a si mesmo.".to_string(),
            AppError::UserNotFound => "Usuário não encontrado.".to_string(),
            AppError::ItemNotFound(_) => "Item de stock não encontrado.".to_string(),
            AppError::SectorNotFound(_) => "Setor não encontrado.".to_string(),
            AppError::RequisitionNotFound(_) => "Requisição não encontrada.".to_string(),
            AppError::OutboundMovementNotAllowed => {
                "Saídas de stock só podem ser feitas através de requisições.".to_string()
            }

            // Todos os outros erros (DatabaseError, InternalServerError...) viram 500.
            // O `tracing` loga a mensagem detalhada; o cliente recebe uma genérica.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                "Ocorreu um erro inesperado.".to_string()
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

/// Erro de validação de um único campo, no mesmo formato do `validator`.
pub(crate) fn field_error(field: &'static str, code: &'static str, message: &'static str) -> AppError {
    let mut err = validator::ValidationError::new(code);
    err.message = Some(message.into());
    let mut errors = validator::ValidationErrors::new();
    errors.add(field, err);
    AppError::ValidationError(errors)
}

/// Converte a violação de chave única em um erro de domínio; o resto vira `DatabaseError`.
pub(crate) fn map_unique_violation(e: sqlx::Error, on_unique: impl FnOnce() -> AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn maps_domain_errors_to_status_codes() {
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::SelfDeletion.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::ItemNotFound(Uuid::nil()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::EmailAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::OutboundMovementNotAllowed.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn insufficient_stock_body_names_item_and_available_amount() {
        let item_id = Uuid::new_v4();
        let response = AppError::InsufficientStock {
            item_id,
            item_name: "Arroz".into(),
            unit: "kg".into(),
            available: 10,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "Quantidade insuficiente para \"Arroz\". Disponível: 10 kg."
        );
        assert_eq!(body["details"]["available"], 10);
        assert_eq!(body["details"]["itemId"], item_id.to_string());
    }

    #[tokio::test]
    async fn json_rejections_answer_with_the_error_body() {
        use axum::{body::Body, extract::FromRequest, http::Request};

        let request = Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from("{nao e json"))
            .unwrap();
        let rejection = Json::<serde_json::Value>::from_request(request, &())
            .await
            .unwrap_err();

        let response = AppError::from(rejection).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "O corpo da requisição é inválido.");
        assert!(body["details"]["body"][0].is_string());
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response = AppError::InternalServerError(anyhow::anyhow!("senha do banco")).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Ocorreu um erro inesperado.");
    }
}
