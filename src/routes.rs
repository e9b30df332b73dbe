// src/routes.rs

use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_gate};

/// Monta o Router completo: rotas da API, gate de autenticação, CORS e Swagger.
pub fn build_router(app_state: AppState, cors_origins: &[String]) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/me", get(handlers::users::get_me))
        .route("/{id}", delete(handlers::users::delete_user));

    let course_routes = Router::new()
        .route(
            "/",
            get(handlers::courses::list_courses).post(handlers::courses::create_course),
        )
        .route(
            "/{id}",
            get(handlers::courses::get_course)
                .put(handlers::courses::update_course)
                .delete(handlers::courses::delete_course),
        )
        .route(
            "/{id}/disciplinas",
            get(handlers::courses::list_disciplines).post(handlers::courses::create_discipline),
        )
        .route(
            "/{id}/disciplinas/{disciplina_id}",
            put(handlers::courses::update_discipline)
                .delete(handlers::courses::delete_discipline),
        )
        .route(
            "/{id}/projetos",
            get(handlers::projects::list_course_projects).post(handlers::projects::create_project),
        );

    let discipline_routes = Router::new()
        .route("/{id}", get(handlers::courses::get_discipline))
        .route(
            "/{id}/projetos",
            get(handlers::projects::list_discipline_projects)
                .post(handlers::projects::create_discipline_project),
        )
        .route(
            "/{id}/premios",
            get(handlers::gamification::list_prizes).post(handlers::gamification::create_prize),
        );

    let project_routes = Router::new()
        .route(
            "/{id}",
            get(handlers::projects::get_project)
                .put(handlers::projects::update_project)
                .delete(handlers::projects::delete_project),
        )
        .route(
            "/{id}/sprints",
            get(handlers::projects::list_sprints).post(handlers::projects::create_sprint),
        );

    let team_routes = Router::new()
        .route(
            "/",
            get(handlers::teams::list_teams).post(handlers::teams::create_team),
        )
        .route(
            "/{id}",
            get(handlers::teams::get_team)
                .put(handlers::teams::update_team)
                .delete(handlers::teams::delete_team),
        )
        .route(
            "/{id}/membros",
            get(handlers::teams::list_members).post(handlers::teams::add_member),
        )
        .route(
            "/{id}/membros/{id_utilizador}",
            delete(handlers::teams::remove_member),
        );

    let professor_routes = Router::new()
        .route("/{id}/cursos", get(handlers::professors::list_courses))
        .route(
            "/{id}/cursos/{curso_id}",
            post(handlers::professors::assign_course).delete(handlers::professors::unassign_course),
        )
        .route(
            "/cursos/{curso_id}/exportar",
            get(handlers::professors::export_grades),
        );

    let api = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/utilizadores", user_routes)
        .nest("/api/cursos", course_routes)
        .nest("/api/disciplinas", discipline_routes)
        .nest("/api/projetos", project_routes)
        .route("/api/sprints/{id}", delete(handlers::projects::delete_sprint))
        .nest("/api/equipas", team_routes)
        .nest("/api/professores", professor_routes)
        .route(
            "/api/premios/{id}/atribuir/{aluno_id}",
            post(handlers::gamification::award_prize),
        )
        .route(
            "/api/alunos/{id}/conquistas",
            get(handlers::gamification::list_achievements),
        )
        // O gate corre antes de todos os handlers da API
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_gate,
        ))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
}

// Com credenciais, as origens têm de ser explícitas
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origem = %origin, "Origem CORS inválida ignorada");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Settings;

    fn app() -> Router {
        build_router(AppState::for_tests(), &Settings::for_tests().cors_origins)
    }

    async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn register(app: &Router, name: &str, email: &str, role: &str) -> (String, i64) {
        let response = send(
            app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"nome": name, "email": email, "password": "senha123", "papelSistema": role})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let token = body_json(response).await["token"].as_str().unwrap().to_string();

        let me = body_json(send(app, "GET", "/api/utilizadores/me", Some(&token), None).await).await;
        (token, me["id"].as_i64().unwrap())
    }

    #[tokio::test]
    async fn register_then_login_and_the_failure_cases() {
        let app = app();

        let response = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"nome": "Joao", "email": "joao@test.com", "password": "senha123"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(!body["token"].as_str().unwrap().is_empty());
        assert_eq!(body["email"], "joao@test.com");
        assert_eq!(body["nome"], "Joao");
        assert_eq!(body["papelSistema"], "ALUNO");

        let response = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "joao@test.com", "password": "senha123"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["email"], "joao@test.com");

        let response = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "joao@test.com", "password": "errada"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Senha incorreta"));

        let response = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"nome": "Joao", "email": "joao@test.com", "password": "outra"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Email já registado"));
    }

    #[tokio::test]
    async fn login_with_a_malformed_email_is_an_unknown_email() {
        let app = app();

        let response = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "joao", "password": "x"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Email não encontrado"));
    }

    #[tokio::test]
    async fn protected_routes_need_a_token_but_public_reads_do_not() {
        let app = app();

        let response = send(&app, "GET", "/api/cursos", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, "GET", "/api/cursos", Some("lixo"), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Token inválido"));

        // Leitura pública de disciplina: chega ao handler e responde 404
        let response = send(&app, "GET", "/api/disciplinas/999", None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, "GET", "/api/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn preflight_from_a_configured_origin_is_allowed_with_credentials() {
        let app = app();
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/cursos")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,x-qualquer")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "authorization,x-qualquer");
    }

    #[tokio::test]
    async fn awarding_a_prize_adds_points_to_the_student() {
        let app = app();
        let (admin_token, admin_id) = register(&app, "Ana", "ana@test.com", "ADMIN").await;
        let (student_token, student_id) = register(&app, "Rui", "rui@test.com", "ALUNO").await;

        let response = send(
            &app,
            "POST",
            "/api/cursos",
            Some(&admin_token),
            Some(json!({"nome": "Engenharia Informática", "codigo": "LEI", "adminId": admin_id})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let course_id = body_json(response).await["id"].as_i64().unwrap();

        let response = send(
            &app,
            "POST",
            &format!("/api/cursos/{}/disciplinas", course_id),
            Some(&admin_token),
            Some(json!({"nome": "Engenharia de Software", "codigo": "ES"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let discipline_id = body_json(response).await["id"].as_i64().unwrap();

        let response = send(
            &app,
            "POST",
            &format!("/api/disciplinas/{}/premios", discipline_id),
            Some(&admin_token),
            Some(json!({"nome": "Melhor Sprint", "valorPontos": 50, "tipo": "MANUAL"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let prize_id = body_json(response).await["id"].as_i64().unwrap();

        let response = send(
            &app,
            "POST",
            &format!("/api/premios/{}/atribuir/{}", prize_id, student_id),
            Some(&admin_token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let me = body_json(send(&app, "GET", "/api/utilizadores/me", Some(&student_token), None).await).await;
        assert_eq!(me["totalPontos"], 50);

        let response = send(
            &app,
            "GET",
            &format!("/api/alunos/{}/conquistas", student_id),
            Some(&admin_token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let achievements = body_json(response).await;
        assert_eq!(achievements.as_array().unwrap().len(), 1);
        assert_eq!(achievements[0]["nomePremio"], "Melhor Sprint");
    }

    #[tokio::test]
    async fn grades_export_is_served_as_a_csv_attachment() {
        let app = app();
        let (admin_token, admin_id) = register(&app, "Ana", "ana@test.com", "ADMIN").await;

        let response = send(
            &app,
            "POST",
            "/api/cursos",
            Some(&admin_token),
            Some(json!({"nome": "Gestão", "codigo": "GES", "adminId": admin_id})),
        )
        .await;
        let course_id = body_json(response).await["id"].as_i64().unwrap();

        let response = send(
            &app,
            "GET",
            &format!("/api/professores/cursos/{}/exportar", course_id),
            Some(&admin_token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"pauta_curso_{}.csv\"", course_id).as_str()
        );
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        assert_eq!(body_text(response).await, "id,nome,email,equipa,projeto,pontos\n");
    }

    #[tokio::test]
    async fn team_routes_create_and_clear_the_project_link() {
        let app = app();
        let (token, admin_id) = register(&app, "Ana", "ana@test.com", "ADMIN").await;

        let course = body_json(
            send(
                &app,
                "POST",
                "/api/cursos",
                Some(&token),
                Some(json!({"nome": "LEI", "codigo": "LEI", "adminId": admin_id})),
            )
            .await,
        )
        .await;
        let project = body_json(
            send(
                &app,
                "POST",
                &format!("/api/cursos/{}/projetos", course["id"]),
                Some(&token),
                Some(json!({"nome": "Portal", "dataInicio": "2025-02-01"})),
            )
            .await,
        )
        .await;

        let response = send(
            &app,
            "POST",
            "/api/equipas",
            Some(&token),
            Some(json!({"nome": "Alfa", "idProjeto": project["id"]})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let team = body_json(response).await;
        assert_eq!(team["idProjeto"], project["id"]);

        let response = send(
            &app,
            "PUT",
            &format!("/api/equipas/{}", team["id"]),
            Some(&token),
            Some(json!({"idProjeto": null})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let team = body_json(response).await;
        assert_eq!(team["nome"], "Alfa");
        assert!(team["idProjeto"].is_null());
    }
}
