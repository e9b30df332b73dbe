// src/handlers/professors.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::hierarchy::Course,
};

#[utoipa::path(
    get,
    path = "/api/professores/{id}/cursos",
    tag = "Professores",
    params(("id" = i64, Path, description = "ID do professor")),
    responses((status = 200, body = Vec<Course>)),
    security(("api_jwt" = []))
)]
pub async fn list_courses(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(professor_id): Path<i64>,
) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(app_state.professor_service.list_courses(professor_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/professores/{id}/cursos/{curso_id}",
    tag = "Professores",
    params(
        ("id" = i64, Path, description = "ID do professor"),
        ("curso_id" = i64, Path, description = "ID do curso")
    ),
    responses(
        (status = 201, description = "Professor associado ao curso"),
        (status = 409, description = "Professor já tem curso"),
        (status = 403, description = "Utilizador não é professor"),
        (status = 404, description = "Professor ou curso não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_course(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path((professor_id, course_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    app_state.professor_service.assign(professor_id, course_id).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    delete,
    path = "/api/professores/{id}/cursos/{curso_id}",
    tag = "Professores",
    params(
        ("id" = i64, Path, description = "ID do professor"),
        ("curso_id" = i64, Path, description = "ID do curso")
    ),
    responses((status = 204), (status = 404, description = "Associação não encontrada")),
    security(("api_jwt" = []))
)]
pub async fn unassign_course(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path((professor_id, course_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    app_state.professor_service.unassign(professor_id, course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Descarrega a pauta do curso como anexo CSV.
#[utoipa::path(
    get,
    path = "/api/professores/cursos/{curso_id}/exportar",
    tag = "Professores",
    params(("curso_id" = i64, Path, description = "ID do curso")),
    responses(
        (status = 200, description = "Pauta em CSV", content_type = "text/csv", body = String),
        (status = 404, description = "Curso não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_grades(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let csv = app_state.professor_service.export_grades(course_id).await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"pauta_curso_{}.csv\"", course_id),
        ),
        (
            header::CACHE_CONTROL,
            "must-revalidate, post-check=0, pre-check=0".to_string(),
        ),
    ];
    Ok((headers, csv))
}
