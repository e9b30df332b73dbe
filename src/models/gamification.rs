// src/models/gamification.rs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_premio", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrizeKind {
    Manual,
    Automatico,
}

impl FromStr for PrizeKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANUAL" => Ok(PrizeKind::Manual),
            "AUTOMATICO" => Ok(PrizeKind::Automatico),
            other => Err(AppError::Validation(format!("Tipo de prémio inválido: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Prize {
    pub id: i64,
    #[serde(rename = "disciplinaId")]
    pub discipline_id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "valorPontos")]
    pub points: i32,
    #[serde(rename = "tipo")]
    pub kind: PrizeKind,
}

#[derive(Debug, Clone)]
pub struct PrizeFields {
    pub name: String,
    pub description: Option<String>,
    pub points: i32,
    pub kind: PrizeKind,
}

/// Registo de uma atribuição. A criação é o momento do prémio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Achievement {
    pub id: i64,
    #[serde(rename = "premioId")]
    pub prize_id: i64,
    #[serde(rename = "alunoId")]
    pub student_id: i64,
    #[serde(rename = "dataAtribuicao")]
    pub awarded_at: DateTime<Utc>,
}

/// Conquista com os dados do prémio, para a listagem do aluno.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AchievementDetails {
    pub id: i64,
    #[serde(rename = "premioId")]
    pub prize_id: i64,
    #[serde(rename = "nomePremio")]
    pub prize_name: String,
    #[serde(rename = "valorPontos")]
    pub points: i32,
    #[serde(rename = "tipo")]
    pub kind: PrizeKind,
    #[serde(rename = "dataAtribuicao")]
    pub awarded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prize_kind_parses_only_known_tags() {
        assert_eq!("MANUAL".parse::<PrizeKind>().unwrap(), PrizeKind::Manual);
        assert_eq!("AUTOMATICO".parse::<PrizeKind>().unwrap(), PrizeKind::Automatico);
        assert!(matches!("manual".parse::<PrizeKind>(), Err(AppError::Validation(_))));
    }
}
