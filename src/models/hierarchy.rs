// src/models/hierarchy.rs
//
// Curso -> Disciplina / Projeto -> Sprint

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: i64,
    #[serde(rename = "nome")]
    #[schema(example = "Engenharia Informática")]
    pub name: String,
    #[serde(rename = "codigo")]
    #[schema(example = "LEI")]
    pub code: String,
    // Referência fraca: apagar o admin deixa o curso sem admin.
    #[serde(rename = "adminId")]
    pub admin_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Discipline {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "cursoId")]
    pub course_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "dataInicio")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "dataFim")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "cursoId")]
    pub course_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Sprint {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "objetivos")]
    pub objectives: Option<String>,
    #[serde(rename = "dataInicio")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "dataFim")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "projetoId")]
    pub project_id: i64,
}

/// Campos editáveis de um projeto (criação e atualização usam os mesmos).
#[derive(Debug, Clone)]
pub struct ProjectFields {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct SprintFields {
    pub name: String,
    pub objectives: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
