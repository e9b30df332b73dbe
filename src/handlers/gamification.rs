// src/handlers/gamification.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::gamification::{Achievement, AchievementDetails, Prize},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PrizePayload {
    #[serde(rename = "nome")]
    #[validate(length(min = 1, message = "O nome do prémio é obrigatório."))]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "valorPontos")]
    pub points: i32,
    /// MANUAL ou AUTOMATICO
    #[serde(rename = "tipo")]
    #[schema(example = "MANUAL")]
    pub kind: String,
}

#[utoipa::path(
    post,
    path = "/api/disciplinas/{id}/premios",
    tag = "Gamificação",
    params(("id" = i64, Path, description = "ID da disciplina")),
    request_body = PrizePayload,
    responses(
        (status = 201, body = Prize),
        (status = 400, description = "Tipo de prémio inválido"),
        (status = 404, description = "Disciplina não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_prize(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(discipline_id): Path<i64>,
    Json(payload): Json<PrizePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let prize = app_state
        .gamification_service
        .create_prize(
            discipline_id,
            &payload.name,
            payload.description.as_deref(),
            payload.points,
            &payload.kind,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(prize)))
}

#[utoipa::path(
    get,
    path = "/api/disciplinas/{id}/premios",
    tag = "Gamificação",
    params(("id" = i64, Path, description = "ID da disciplina")),
    responses((status = 200, body = Vec<Prize>), (status = 404, description = "Disciplina não encontrada")),
    security(("api_jwt" = []))
)]
pub async fn list_prizes(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(discipline_id): Path<i64>,
) -> Result<Json<Vec<Prize>>, AppError> {
    Ok(Json(app_state.gamification_service.list_prizes(discipline_id).await?))
}

// Conquista e soma de pontos numa só transação
#[utoipa::path(
    post,
    path = "/api/premios/{id}/atribuir/{aluno_id}",
    tag = "Gamificação",
    params(
        ("id" = i64, Path, description = "ID do prémio"),
        ("aluno_id" = i64, Path, description = "ID do aluno")
    ),
    responses(
        (status = 201, body = Achievement),
        (status = 404, description = "Prémio ou aluno não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn award_prize(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path((prize_id, student_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let achievement = app_state
        .gamification_service
        .award(prize_id, student_id)
        .await?;
    Ok((StatusCode::CREATED, Json(achievement)))
}

#[utoipa::path(
    get,
    path = "/api/alunos/{id}/conquistas",
    tag = "Gamificação",
    params(("id" = i64, Path, description = "ID do aluno")),
    responses(
        (status = 200, body = Vec<AchievementDetails>),
        (status = 404, description = "Aluno não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_achievements(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(student_id): Path<i64>,
) -> Result<Json<Vec<AchievementDetails>>, AppError> {
    Ok(Json(
        app_state
            .gamification_service
            .list_achievements(student_id)
            .await?,
    ))
}
