// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::fiscal::XmlError;

// Tipo de erro único da aplicação. Handlers, services e repositórios devolvem
// `Result<_, AppError>` e o axum converte em resposta via `IntoResponse`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Xml(#[from] XmlError),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} não encontrado(a)")]
    NotFound(&'static str),

    #[error("Arquivo excede o tamanho máximo permitido")]
    PayloadTooLarge,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("{0}")]
    UniqueConstraintViolation(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Falha na integração com o ERP: {0}")]
    Erp(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro ao gerar PDF: {0}")]
    Pdf(String),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) | AppError::Xml(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::EmailAlreadyExists | AppError::UniqueConstraintViolation(_) => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Mensagem que pode ser exposta ao cliente. Erros 5xx nunca vazam detalhes
    /// internos (SQL, caminhos de arquivo, respostas do ERP).
    pub fn client_message(&self) -> String {
        match self {
            AppError::InvalidCredentials => "E-mail ou senha inválidos.".to_string(),
            AppError::InvalidToken => "Token de autenticação inválido ou ausente.".to_string(),
            AppError::EmailAlreadyExists => "Este e-mail já está em uso.".to_string(),
            AppError::ValidationError(_) => "Um ou mais campos são inválidos.".to_string(),
            e if e.status().is_server_error() => "Ocorreu um erro inesperado.".to_string(),
            e => e.to_string(),
        }
    }
}

/// Converte violação de chave única em 409 com mensagem amigável.
pub fn map_unique_violation(e: sqlx::Error, message: impl Into<String>) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(message.into());
        }
    }
    AppError::DatabaseError(e)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": self.client_message(),
                "details": details,
            }));
            return (status, body).into_response();
        }

        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let body = Json(json!({ "error": self.client_message() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_do_not_leak_details() {
        let err = AppError::Erp("connection refused to 10.0.0.3:8080".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Ocorreu um erro inesperado.");

        let err = AppError::Pdf("font file ./fonts/Roboto-Regular.ttf missing".into());
        assert!(!err.client_message().contains("fonts"));
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = AppError::NotFound("Empresa");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.client_message(), "Empresa não encontrado(a)");

        let err = AppError::Xml(XmlError::UnrecognizedStructure);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.client_message().contains("não reconhecida"));
    }

    #[test]
    fn row_not_found_is_not_a_unique_violation() {
        let err = map_unique_violation(sqlx::Error::RowNotFound, "duplicado");
        assert!(matches!(err, AppError::DatabaseError(_)));
    }
}
