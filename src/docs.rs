// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::get_me,
        handlers::users::create_user,
        handlers::users::delete_user,

        // --- Cursos ---
        handlers::courses::list_courses,
        handlers::courses::get_course,
        handlers::courses::create_course,
        handlers::courses::update_course,
        handlers::courses::delete_course,

        // --- Disciplinas ---
        handlers::courses::create_discipline,
        handlers::courses::list_disciplines,
        handlers::courses::update_discipline,
        handlers::courses::delete_discipline,
        handlers::courses::get_discipline,

        // --- Projetos / Sprints ---
        handlers::projects::create_project,
        handlers::projects::create_discipline_project,
        handlers::projects::list_course_projects,
        handlers::projects::list_discipline_projects,
        handlers::projects::get_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::projects::create_sprint,
        handlers::projects::list_sprints,
        handlers::projects::delete_sprint,

        // --- Equipas ---
        handlers::teams::list_teams,
        handlers::teams::get_team,
        handlers::teams::create_team,
        handlers::teams::update_team,
        handlers::teams::delete_team,
        handlers::teams::list_members,
        handlers::teams::add_member,
        handlers::teams::remove_member,

        // --- Professores ---
        handlers::professors::list_courses,
        handlers::professors::assign_course,
        handlers::professors::unassign_course,
        handlers::professors::export_grades,

        // --- Gamificação ---
        handlers::gamification::create_prize,
        handlers::gamification::list_prizes,
        handlers::gamification::award_prize,
        handlers::gamification::list_achievements,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::UserResponse,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Hierarquia ---
            models::hierarchy::Course,
            models::hierarchy::Discipline,
            models::hierarchy::Project,
            models::hierarchy::Sprint,

            // --- Equipas ---
            models::team::ScrumRole,
            models::team::Team,
            models::team::Membership,
            models::team::MemberDetails,

            // --- Gamificação ---
            models::gamification::PrizeKind,
            models::gamification::Prize,
            models::gamification::Achievement,
            models::gamification::AchievementDetails,

            // --- Payloads ---
            handlers::courses::CoursePayload,
            handlers::courses::DisciplinePayload,
            handlers::projects::ProjectPayload,
            handlers::projects::SprintPayload,
            handlers::teams::CreateTeamPayload,
            handlers::teams::UpdateTeamPayload,
            handlers::teams::AddMemberPayload,
            handlers::gamification::PrizePayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registo"),
        (name = "Users", description = "Gestão de Utilizadores"),
        (name = "Cursos", description = "Cursos e respetivo admin"),
        (name = "Disciplinas", description = "Disciplinas de cada curso"),
        (name = "Projetos", description = "Projetos de curso"),
        (name = "Sprints", description = "Sprints de cada projeto"),
        (name = "Equipas", description = "Equipas e membros Scrum"),
        (name = "Professores", description = "Associação a cursos e exportação de pautas"),
        (name = "Gamificação", description = "Prémios, conquistas e pontos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_bearer_scheme_and_public_routes() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
        assert!(doc.paths.paths.contains_key("/api/auth/register"));
        assert!(doc.paths.paths.contains_key("/api/professores/cursos/{curso_id}/exportar"));
    }
}
