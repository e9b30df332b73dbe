// src/handlers/courses.rs
//
// Cursos e as disciplinas de cada curso. As vistas de disciplina em
// /api/disciplinas/{id} são de leitura pública.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::hierarchy::{Course, Discipline},
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CoursePayload {
    #[serde(rename = "nome")]
    #[validate(length(min = 1, message = "O nome do curso é obrigatório."))]
    pub name: String,

    #[serde(rename = "codigo")]
    #[validate(length(min = 1, max = 20, message = "O código deve ter entre 1 e 20 caracteres."))]
    #[schema(example = "LEI")]
    pub code: String,

    // Obrigatório na criação; na atualização, ausente mantém o admin
    #[serde(rename = "adminId", default)]
    pub admin_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DisciplinePayload {
    #[serde(rename = "nome")]
    #[validate(length(min = 1, message = "O nome da disciplina é obrigatório."))]
    pub name: String,

    #[serde(rename = "codigo")]
    #[validate(length(min = 1, message = "O código da disciplina é obrigatório."))]
    pub code: String,
}

// =============================================================================
//  CURSOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/cursos",
    tag = "Cursos",
    responses((status = 200, body = Vec<Course>)),
    security(("api_jwt" = []))
)]
pub async fn list_courses(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(app_state.hierarchy_service.list_courses().await?))
}

#[utoipa::path(
    get,
    path = "/api/cursos/{id}",
    tag = "Cursos",
    params(("id" = i64, Path, description = "ID do curso")),
    responses((status = 200, body = Course), (status = 404, description = "Curso não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn get_course(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(app_state.hierarchy_service.get_course(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/cursos",
    tag = "Cursos",
    request_body = CoursePayload,
    responses(
        (status = 200, body = Course),
        (status = 400, description = "Admin em falta"),
        (status = 404, description = "Admin não encontrado"),
        (status = 409, description = "Código já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_course(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CoursePayload>,
) -> Result<Json<Course>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let course = app_state
        .hierarchy_service
        .create_course(&payload.name, &payload.code, payload.admin_id)
        .await?;
    Ok(Json(course))
}

#[utoipa::path(
    put,
    path = "/api/cursos/{id}",
    tag = "Cursos",
    params(("id" = i64, Path, description = "ID do curso")),
    request_body = CoursePayload,
    responses(
        (status = 200, body = Course),
        (status = 404, description = "Curso ou admin não encontrado"),
        (status = 409, description = "Código já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_course(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<CoursePayload>,
) -> Result<Json<Course>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let course = app_state
        .hierarchy_service
        .update_course(id, &payload.name, &payload.code, payload.admin_id)
        .await?;
    Ok(Json(course))
}

#[utoipa::path(
    delete,
    path = "/api/cursos/{id}",
    tag = "Cursos",
    params(("id" = i64, Path, description = "ID do curso")),
    responses((status = 204), (status = 404, description = "Curso não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn delete_course(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.hierarchy_service.delete_course(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  DISCIPLINAS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/cursos/{id}/disciplinas",
    tag = "Disciplinas",
    params(("id" = i64, Path, description = "ID do curso")),
    request_body = DisciplinePayload,
    responses(
        (status = 200, body = Discipline),
        (status = 404, description = "Curso não encontrado"),
        (status = 409, description = "Código já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_discipline(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(course_id): Path<i64>,
    Json(payload): Json<DisciplinePayload>,
) -> Result<Json<Discipline>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let discipline = app_state
        .hierarchy_service
        .create_discipline(course_id, &payload.name, &payload.code)
        .await?;
    Ok(Json(discipline))
}

#[utoipa::path(
    get,
    path = "/api/cursos/{id}/disciplinas",
    tag = "Disciplinas",
    params(("id" = i64, Path, description = "ID do curso")),
    responses((status = 200, body = Vec<Discipline>)),
    security(("api_jwt" = []))
)]
pub async fn list_disciplines(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(course_id): Path<i64>,
) -> Result<Json<Vec<Discipline>>, AppError> {
    Ok(Json(app_state.hierarchy_service.list_disciplines(course_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/cursos/{id}/disciplinas/{disciplina_id}",
    tag = "Disciplinas",
    params(
        ("id" = i64, Path, description = "ID do curso"),
        ("disciplina_id" = i64, Path, description = "ID da disciplina")
    ),
    request_body = DisciplinePayload,
    responses(
        (status = 200, body = Discipline),
        (status = 404, description = "Disciplina não pertence ao curso"),
        (status = 409, description = "Código já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_discipline(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path((course_id, discipline_id)): Path<(i64, i64)>,
    Json(payload): Json<DisciplinePayload>,
) -> Result<Json<Discipline>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let discipline = app_state
        .hierarchy_service
        .update_discipline(course_id, discipline_id, &payload.name, &payload.code)
        .await?;
    Ok(Json(discipline))
}

#[utoipa::path(
    delete,
    path = "/api/cursos/{id}/disciplinas/{disciplina_id}",
    tag = "Disciplinas",
    params(
        ("id" = i64, Path, description = "ID do curso"),
        ("disciplina_id" = i64, Path, description = "ID da disciplina")
    ),
    responses((status = 204), (status = 404, description = "Disciplina não pertence ao curso")),
    security(("api_jwt" = []))
)]
pub async fn delete_discipline(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path((course_id, discipline_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    app_state
        .hierarchy_service
        .delete_discipline(course_id, discipline_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Leitura pública: não exige AuthenticatedUser
#[utoipa::path(
    get,
    path = "/api/disciplinas/{id}",
    tag = "Disciplinas",
    params(("id" = i64, Path, description = "ID da disciplina")),
    responses((status = 200, body = Discipline), (status = 404, description = "Disciplina não encontrada"))
)]
pub async fn get_discipline(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Discipline>, AppError> {
    Ok(Json(app_state.hierarchy_service.get_discipline(id).await?))
}
