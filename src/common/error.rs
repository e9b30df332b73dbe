// src/common/error.rs

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Entidade que não foi encontrada. Usado em `AppError::NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Utilizador,
    Professor,
    Aluno,
    Curso,
    Disciplina,
    Projeto,
    Sprint,
    Equipa,
    Membro,
    Premio,
    AssociacaoProfessorCurso,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Resource::Utilizador => "Utilizador não encontrado",
            Resource::Professor => "Professor não encontrado",
            Resource::Aluno => "Aluno não encontrado",
            Resource::Curso => "Curso não encontrado",
            Resource::Disciplina => "Disciplina não encontrada",
            Resource::Projeto => "Projeto não encontrado",
            Resource::Sprint => "Sprint não encontrado",
            Resource::Equipa => "Equipa não encontrada",
            Resource::Membro => "Membro não encontrado",
            Resource::Premio => "Prémio não encontrado",
            Resource::AssociacaoProfessorCurso => "Associação professor-curso não encontrada.",
        };
        f.write_str(msg)
    }
}

/// Classe de falha, independente da mensagem. É isto que decide o status HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Unauthorized,
    Forbidden,
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    Validation(String),

    // --- Credential Gate ---
    #[error("Email já registado")]
    DuplicateEmail,

    #[error("Password é obrigatória")]
    MissingPassword,

    #[error("Email não encontrado")]
    UnknownEmail,

    #[error("Senha incorreta")]
    BadCredential,

    #[error("Token expirado")]
    TokenExpired,

    #[error("Token inválido")]
    TokenInvalid,

    #[error("Autenticação necessária")]
    Unauthenticated,

    // --- Registries ---
    #[error("{0}")]
    NotFound(Resource),

    #[error("Admin não encontrado com ID: {0}")]
    AdminNotFound(i64),

    #[error("É necessário especificar um admin")]
    AdminRequired,

    #[error("{0}")]
    DuplicateCode(String),

    #[error("Nome já existe")]
    DuplicateName,

    #[error("Utilizador já pertence à equipa")]
    AlreadyMember,

    #[error("O professor já está associado a um curso.")]
    ProfessorAlreadyAssigned,

    #[error("{0}")]
    Forbidden(String),

    #[error("O total de pontos do aluno sairia do intervalo permitido")]
    PointsOutOfRange,

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
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError(_)
            | AppError::Validation(_)
            | AppError::MissingPassword
            | AppError::AdminRequired
            | AppError::PointsOutOfRange => ErrorKind::Validation,

            AppError::DuplicateEmail
            | AppError::DuplicateCode(_)
            | AppError::DuplicateName
            | AppError::AlreadyMember
            | AppError::ProfessorAlreadyAssigned => ErrorKind::Conflict,

            AppError::UnknownEmail
            | AppError::BadCredential
            | AppError::TokenExpired
            | AppError::TokenInvalid
            | AppError::Unauthenticated => ErrorKind::Unauthorized,

            AppError::NotFound(_) | AppError::AdminNotFound(_) => ErrorKind::NotFound,

            AppError::Forbidden(_) => ErrorKind::Forbidden,

            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            // O registo com email repetido sempre respondeu 400, não 409.
            ErrorKind::Conflict if matches!(self, AppError::DuplicateEmail) => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                })
            }

            // Erros internos: a mensagem detalhada só vai para o log.
            ref e if e.kind() == ErrorKind::Internal => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                json!({ "error": "Ocorreu um erro inesperado." })
            }

            e => json!({ "error": e.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_is_a_conflict_answered_with_400() {
        let err = AppError::DuplicateEmail;
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Email já registado");
    }

    #[test]
    fn kinds_map_to_fixed_status_classes() {
        assert_eq!(AppError::NotFound(Resource::Curso).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::DuplicateName.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::AdminRequired.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::PointsOutOfRange.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Forbidden("Utilizador não é um professor.".into()).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn not_found_message_names_the_entity() {
        assert_eq!(AppError::NotFound(Resource::Equipa).to_string(), "Equipa não encontrada");
        assert_eq!(AppError::AdminNotFound(7).to_string(), "Admin não encontrado com ID: 7");
    }
}
