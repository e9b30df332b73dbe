// src/models/team.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Papel Scrum de um membro. Guardado tal como vem; não há limite de PO/SM por equipa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "papel_scrum", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScrumRole {
    Dev,
    Po,
    Sm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Team {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "idProjeto")]
    pub project_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Membership {
    pub id: i64,
    #[serde(rename = "idEquipa")]
    pub team_id: i64,
    #[serde(rename = "idUtilizador")]
    pub user_id: i64,
    #[serde(rename = "papelScrum")]
    pub scrum_role: ScrumRole,
    #[serde(rename = "dataEntrada")]
    pub joined_at: DateTime<Utc>,
}

/// Membro de uma equipa já com os dados do utilizador.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MemberDetails {
    pub id: i64,
    #[serde(rename = "idUtilizador")]
    pub user_id: i64,
    #[serde(rename = "nomeUtilizador")]
    pub user_name: String,
    #[serde(rename = "emailUtilizador")]
    pub user_email: String,
    #[serde(rename = "papelScrum")]
    pub scrum_role: ScrumRole,
    #[serde(rename = "dataEntrada")]
    pub joined_at: DateTime<Utc>,
}

/// O que fazer com a ligação ao projeto numa atualização de equipa.
///
/// `idProjeto` omitido mantém, `null` explícito limpa, um valor religa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectLink {
    #[default]
    Keep,
    Clear,
    Set(i64),
}

impl From<Option<Option<i64>>> for ProjectLink {
    fn from(value: Option<Option<i64>>) -> Self {
        match value {
            None => ProjectLink::Keep,
            Some(None) => ProjectLink::Clear,
            Some(Some(id)) => ProjectLink::Set(id),
        }
    }
}

/// Uma linha da pauta de um curso (exportação CSV).
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct RosterEntry {
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub team_name: String,
    pub project_name: String,
    pub total_points: Option<i32>,
}
