// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{RegisterUserPayload, UserResponse},
};

#[utoipa::path(
    get,
    path = "/api/utilizadores",
    tag = "Users",
    responses((status = 200, body = Vec<UserResponse>)),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = app_state.user_service.list().await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/utilizadores/me",
    tag = "Users",
    responses(
        (status = 200, body = UserResponse),
        (status = 401, description = "Sem token")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>, AppError> {
    let principal = app_state.auth_service.current_principal(&user.email).await?;
    Ok(Json(UserResponse::from(&principal)))
}

/// Criação administrativa: mesmas regras do registo, sem token na resposta.
#[utoipa::path(
    post,
    path = "/api/utilizadores",
    tag = "Users",
    request_body = RegisterUserPayload,
    responses(
        (status = 200, body = UserResponse),
        (status = 400, description = "Email já registado ou password em falta")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let principal = app_state.auth_service.create_principal(&payload).await?;
    Ok(Json(UserResponse::from(&principal)))
}

#[utoipa::path(
    delete,
    path = "/api/utilizadores/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "ID do utilizador")),
    responses(
        (status = 204, description = "Utilizador eliminado"),
        (status = 404, description = "Utilizador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.user_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
