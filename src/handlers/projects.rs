// src/handlers/projects.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::hierarchy::{Project, ProjectFields, Sprint, SprintFields},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProjectPayload {
    #[serde(rename = "nome")]
    #[validate(length(min = 1, message = "O nome do projeto é obrigatório."))]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "dataInicio", default)]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "dataFim", default)]
    pub end_date: Option<NaiveDate>,
}

impl From<ProjectPayload> for ProjectFields {
    fn from(p: ProjectPayload) -> Self {
        ProjectFields {
            name: p.name,
            description: p.description,
            start_date: p.start_date,
            end_date: p.end_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SprintPayload {
    #[serde(rename = "nome")]
    #[validate(length(min = 1, message = "O nome do sprint é obrigatório."))]
    pub name: String,
    #[serde(rename = "objetivos", default)]
    pub objectives: Option<String>,
    #[serde(rename = "dataInicio", default)]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "dataFim", default)]
    pub end_date: Option<NaiveDate>,
}

impl From<SprintPayload> for SprintFields {
    fn from(p: SprintPayload) -> Self {
        SprintFields {
            name: p.name,
            objectives: p.objectives,
            start_date: p.start_date,
            end_date: p.end_date,
        }
    }
}

// =============================================================================
//  PROJETOS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/cursos/{id}/projetos",
    tag = "Projetos",
    params(("id" = i64, Path, description = "ID do curso")),
    request_body = ProjectPayload,
    responses((status = 201, body = Project), (status = 404, description = "Curso não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn create_project(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(course_id): Path<i64>,
    Json(payload): Json<ProjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let project = app_state
        .hierarchy_service
        .create_project(course_id, &payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[utoipa::path(
    post,
    path = "/api/disciplinas/{id}/projetos",
    tag = "Projetos",
    params(("id" = i64, Path, description = "ID da disciplina")),
    request_body = ProjectPayload,
    responses((status = 201, body = Project), (status = 404, description = "Disciplina não encontrada")),
    security(("api_jwt" = []))
)]
pub async fn create_discipline_project(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(discipline_id): Path<i64>,
    Json(payload): Json<ProjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let project = app_state
        .hierarchy_service
        .create_project_for_discipline(discipline_id, &payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[utoipa::path(
    get,
    path = "/api/cursos/{id}/projetos",
    tag = "Projetos",
    params(("id" = i64, Path, description = "ID do curso")),
    responses((status = 200, body = Vec<Project>)),
    security(("api_jwt" = []))
)]
pub async fn list_course_projects(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(course_id): Path<i64>,
) -> Result<Json<Vec<Project>>, AppError> {
    Ok(Json(app_state.hierarchy_service.list_projects(course_id).await?))
}

// Leitura pública
#[utoipa::path(
    get,
    path = "/api/disciplinas/{id}/projetos",
    tag = "Projetos",
    params(("id" = i64, Path, description = "ID da disciplina")),
    responses((status = 200, body = Vec<Project>), (status = 404, description = "Disciplina não encontrada"))
)]
pub async fn list_discipline_projects(
    State(app_state): State<AppState>,
    Path(discipline_id): Path<i64>,
) -> Result<Json<Vec<Project>>, AppError> {
    Ok(Json(
        app_state
            .hierarchy_service
            .list_discipline_projects(discipline_id)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/projetos/{id}",
    tag = "Projetos",
    params(("id" = i64, Path, description = "ID do projeto")),
    responses((status = 200, body = Project), (status = 404, description = "Projeto não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn get_project(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Project>, AppError> {
    Ok(Json(app_state.hierarchy_service.get_project(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/projetos/{id}",
    tag = "Projetos",
    params(("id" = i64, Path, description = "ID do projeto")),
    request_body = ProjectPayload,
    responses((status = 200, body = Project), (status = 404, description = "Projeto não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn update_project(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProjectPayload>,
) -> Result<Json<Project>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let project = app_state
        .hierarchy_service
        .update_project(id, &payload.into())
        .await?;
    Ok(Json(project))
}

#[utoipa::path(
    delete,
    path = "/api/projetos/{id}",
    tag = "Projetos",
    params(("id" = i64, Path, description = "ID do projeto")),
    responses((status = 204), (status = 404, description = "Projeto não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn delete_project(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.hierarchy_service.delete_project(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  SPRINTS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/projetos/{id}/sprints",
    tag = "Sprints",
    params(("id" = i64, Path, description = "ID do projeto")),
    request_body = SprintPayload,
    responses((status = 201, body = Sprint), (status = 404, description = "Projeto não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn create_sprint(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(project_id): Path<i64>,
    Json(payload): Json<SprintPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let sprint = app_state
        .hierarchy_service
        .create_sprint(project_id, &payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(sprint)))
}

#[utoipa::path(
    get,
    path = "/api/projetos/{id}/sprints",
    tag = "Sprints",
    params(("id" = i64, Path, description = "ID do projeto")),
    responses((status = 200, body = Vec<Sprint>)),
    security(("api_jwt" = []))
)]
pub async fn list_sprints(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<Sprint>>, AppError> {
    Ok(Json(app_state.hierarchy_service.list_sprints(project_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/sprints/{id}",
    tag = "Sprints",
    params(("id" = i64, Path, description = "ID do sprint")),
    responses((status = 204), (status = 404, description = "Sprint não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn delete_sprint(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.hierarchy_service.delete_sprint(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
