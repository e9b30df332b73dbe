// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Papel de sistema de um utilizador. Imutável depois da criação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "papel_sistema", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Professor,
    Aluno,
}

/// Dados específicos de cada papel. Só o aluno acumula pontos.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    Admin,
    Professor { department: Option<String> },
    Student { total_points: i32 },
}

/// Um utilizador (admin, professor ou aluno) tal como vem do Store.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub profile: Profile,
}

impl Principal {
    pub fn total_points(&self) -> Option<i32> {
        match self.profile {
            Profile::Student { total_points } => Some(total_points),
            _ => None,
        }
    }
}

/// Linha "achatada" do SELECT com LEFT JOIN nas tabelas de especialização.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PrincipalRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub total_points: Option<i32>,
    pub department: Option<String>,
}

impl From<PrincipalRow> for Principal {
    fn from(row: PrincipalRow) -> Self {
        let profile = match row.role {
            Role::Admin => Profile::Admin,
            Role::Professor => Profile::Professor { department: row.department },
            Role::Aluno => Profile::Student { total_points: row.total_points.unwrap_or(0) },
        };

        Principal {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role,
            created_at: row.created_at,
            profile,
        }
    }
}

/// Dados para inserir um utilizador (a hash já vem calculada).
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub department: Option<String>,
}

/// O que a API devolve de um utilizador. Nunca inclui a hash da password.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "papelSistema")]
    pub role: Role,
    #[serde(rename = "criadoEm")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "totalPontos", skip_serializing_if = "Option::is_none", default)]
    pub total_points: Option<i32>,
    #[serde(rename = "departamento", skip_serializing_if = "Option::is_none", default)]
    pub department: Option<String>,
}

impl From<&Principal> for UserResponse {
    fn from(p: &Principal) -> Self {
        let department = match &p.profile {
            Profile::Professor { department } => department.clone(),
            _ => None,
        };

        UserResponse {
            id: p.id,
            name: p.name.clone(),
            email: p.email.clone(),
            role: p.role,
            created_at: p.created_at,
            total_points: p.total_points(),
            department,
        }
    }
}

// Dados para registro de um novo utilizador
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[serde(rename = "nome", default)]
    #[schema(example = "Joao Silva")]
    pub name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "joao@test.com")]
    pub email: String,

    // A ausência é tratada pelo serviço (MissingPassword), não aqui.
    #[serde(default)]
    pub password: Option<String>,

    #[serde(rename = "papelSistema", default)]
    pub role: Option<Role>,

    #[serde(rename = "departamento", default)]
    pub department: Option<String>,
}

// Dados para login. Sem validação de formato: um email que não existe,
// bem formado ou não, é sempre `UnknownEmail`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginUserPayload {
    pub email: String,
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub email: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "papelSistema")]
    pub role: Role,
}

impl AuthResponse {
    pub fn new(token: String, principal: &Principal) -> Self {
        Self {
            token,
            email: principal.email.clone(),
            name: principal.name.clone(),
            role: principal.role,
        }
    }
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (email do utilizador)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued At
    pub jti: Uuid,   // Cada token emitido é distinto, mesmo no mesmo segundo
}
