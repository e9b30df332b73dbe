// src/handlers/teams.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::team::{MemberDetails, Membership, ScrumRole, Team},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTeamPayload {
    #[serde(rename = "nome")]
    #[validate(length(min = 1, message = "O nome da equipa é obrigatório."))]
    pub name: String,
    #[serde(rename = "idProjeto", default)]
    pub project_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTeamPayload {
    /// Nome em branco é ignorado.
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    /// Omitido mantém o projeto; `null` desliga a equipa do projeto.
    #[serde(rename = "idProjeto", default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub project_id: Option<Option<i64>>,
}

// Distingue campo ausente (None) de `null` explícito (Some(None))
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMemberPayload {
    #[serde(rename = "idUtilizador")]
    pub user_id: i64,
    #[serde(rename = "papelScrum", default)]
    pub scrum_role: Option<ScrumRole>,
}

// =============================================================================
//  EQUIPAS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/equipas",
    tag = "Equipas",
    responses((status = 200, body = Vec<Team>)),
    security(("api_jwt" = []))
)]
pub async fn list_teams(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<Team>>, AppError> {
    Ok(Json(app_state.team_service.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/equipas/{id}",
    tag = "Equipas",
    params(("id" = i64, Path, description = "ID da equipa")),
    responses((status = 200, body = Team), (status = 404, description = "Equipa não encontrada")),
    security(("api_jwt" = []))
)]
pub async fn get_team(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Team>, AppError> {
    Ok(Json(app_state.team_service.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/equipas",
    tag = "Equipas",
    request_body = CreateTeamPayload,
    responses(
        (status = 201, body = Team),
        (status = 404, description = "Projeto não encontrado"),
        (status = 409, description = "Nome de equipa já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_team(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateTeamPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let team = app_state
        .team_service
        .create(&payload.name, payload.project_id)
        .await?;
    Ok((StatusCode::CREATED, Json(team)))
}

#[utoipa::path(
    put,
    path = "/api/equipas/{id}",
    tag = "Equipas",
    params(("id" = i64, Path, description = "ID da equipa")),
    request_body = UpdateTeamPayload,
    responses(
        (status = 200, body = Team),
        (status = 404, description = "Equipa ou projeto não encontrado"),
        (status = 409, description = "Nome de equipa já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_team(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTeamPayload>,
) -> Result<Json<Team>, AppError> {
    let team = app_state
        .team_service
        .update(id, payload.name.as_deref(), payload.project_id.into())
        .await?;
    Ok(Json(team))
}

#[utoipa::path(
    delete,
    path = "/api/equipas/{id}",
    tag = "Equipas",
    params(("id" = i64, Path, description = "ID da equipa")),
    responses((status = 204), (status = 404, description = "Equipa não encontrada")),
    security(("api_jwt" = []))
)]
pub async fn delete_team(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.team_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  MEMBROS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/equipas/{id}/membros",
    tag = "Equipas",
    params(("id" = i64, Path, description = "ID da equipa")),
    responses((status = 200, body = Vec<MemberDetails>), (status = 404, description = "Equipa não encontrada")),
    security(("api_jwt" = []))
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<MemberDetails>>, AppError> {
    Ok(Json(app_state.team_service.list_members(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/equipas/{id}/membros",
    tag = "Equipas",
    params(("id" = i64, Path, description = "ID da equipa")),
    request_body = AddMemberPayload,
    responses(
        (status = 201, body = Membership),
        (status = 409, description = "Utilizador já é membro"),
        (status = 404, description = "Equipa ou utilizador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_member(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<AddMemberPayload>,
) -> Result<impl IntoResponse, AppError> {
    let membership = app_state
        .team_service
        .add_member(id, payload.user_id, payload.scrum_role)
        .await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

#[utoipa::path(
    delete,
    path = "/api/equipas/{id}/membros/{id_utilizador}",
    tag = "Equipas",
    params(
        ("id" = i64, Path, description = "ID da equipa"),
        ("id_utilizador" = i64, Path, description = "ID do utilizador")
    ),
    responses((status = 204), (status = 404, description = "Membro não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn remove_member(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    app_state.team_service.remove_member(id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_payload_tells_missing_project_from_null() {
        let missing: UpdateTeamPayload = serde_json::from_str(r#"{"nome":"A"}"#).unwrap();
        assert_eq!(missing.project_id, None);

        let cleared: UpdateTeamPayload = serde_json::from_str(r#"{"idProjeto":null}"#).unwrap();
        assert_eq!(cleared.project_id, Some(None));

        let set: UpdateTeamPayload = serde_json::from_str(r#"{"idProjeto":7}"#).unwrap();
        assert_eq!(set.project_id, Some(Some(7)));
    }
}
