// src/middleware/auth.rs

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{DateTime, Utc};

use crate::{common::error::AppError, config::AppState, services::token::TokenService};

/// Prefixos de caminho que não passam pela validação do token.
#[derive(Debug, Clone)]
pub struct PublicPaths(Arc<Vec<String>>);

impl PublicPaths {
    pub fn new<I, P>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self(Arc::new(prefixes.into_iter().map(Into::into).collect()))
    }

    /// `/api/auth` cobre `/api/auth` e `/api/auth/...`, mas não `/api/authx`.
    pub fn matches(&self, path: &str) -> bool {
        self.0.iter().any(|prefix| match path.strip_prefix(prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        })
    }
}

impl Default for PublicPaths {
    fn default() -> Self {
        Self::new(["/api/auth"])
    }
}

/// Identidade resolvida pelo token, guardada nas extensions do pedido.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub email: String,
}

/// O que o gate faz com um pedido.
#[derive(Debug)]
pub enum GateDecision {
    /// Segue sem identidade (rota pública ou pedido sem token).
    PassThrough,
    Authenticated(AuthenticatedUser),
    Reject(AppError),
}

/// Decisão pura: não toca no pedido nem na rede.
pub fn decide(
    public: &PublicPaths,
    tokens: &TokenService,
    path: &str,
    bearer: Option<&str>,
    now: DateTime<Utc>,
) -> GateDecision {
    if public.matches(path) {
        return GateDecision::PassThrough;
    }

    let Some(token) = bearer else {
        return GateDecision::PassThrough;
    };

    match tokens.validate_at(token, now) {
        Ok(email) => GateDecision::Authenticated(AuthenticatedUser { email }),
        Err(err) => GateDecision::Reject(err),
    }
}

// O middleware em si
pub async fn auth_gate(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request.headers().typed_get::<Authorization<Bearer>>();

    let decision = decide(
        &app_state.public_paths,
        &app_state.tokens,
        request.uri().path(),
        bearer.as_ref().map(|auth| auth.token()),
        Utc::now(),
    );

    match decision {
        GateDecision::PassThrough => {}
        GateDecision::Authenticated(user) => {
            // Uma identidade já presente não é substituída
            if request.extensions().get::<AuthenticatedUser>().is_none() {
                request.extensions_mut().insert(user);
            }
        }
        GateDecision::Reject(err) => {
            tracing::debug!(path = %request.uri().path(), motivo = %err, "Pedido recusado pelo gate");
            return Err(err);
        }
    }

    Ok(next.run(request).await)
}

// Extrator para obter o utilizador autenticado diretamente nos handlers
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use chrono::Duration;
    use tower::ServiceExt;

    use super::*;

    fn tokens() -> TokenService {
        TokenService::new("segredo-de-teste", Duration::hours(1))
    }

    #[test]
    fn public_prefix_matches_whole_segments_only() {
        let public = PublicPaths::default();
        assert!(public.matches("/api/auth"));
        assert!(public.matches("/api/auth/login"));
        assert!(!public.matches("/api/authx"));
        assert!(!public.matches("/api/cursos"));
    }

    #[test]
    fn public_path_skips_validation_even_with_a_bad_token() {
        let decision = decide(
            &PublicPaths::default(),
            &tokens(),
            "/api/auth/login",
            Some("lixo"),
            Utc::now(),
        );
        assert!(matches!(decision, GateDecision::PassThrough));
    }

    #[test]
    fn missing_token_passes_unauthenticated() {
        let decision = decide(&PublicPaths::default(), &tokens(), "/api/cursos", None, Utc::now());
        assert!(matches!(decision, GateDecision::PassThrough));
    }

    #[test]
    fn expired_and_invalid_tokens_are_rejected_distinctly() {
        let tokens = tokens();
        let issued = Utc::now() - Duration::hours(5);
        let old = tokens.issue_at("joao@test.com", issued).unwrap();

        let expired = decide(&PublicPaths::default(), &tokens, "/api/cursos", Some(&old), Utc::now());
        assert!(matches!(expired, GateDecision::Reject(AppError::TokenExpired)));

        let invalid = decide(&PublicPaths::default(), &tokens, "/api/cursos", Some("a.b.c"), Utc::now());
        assert!(matches!(invalid, GateDecision::Reject(AppError::TokenInvalid)));
    }

    #[test]
    fn valid_token_resolves_the_email() {
        let tokens = tokens();
        let token = tokens.issue("joao@test.com").unwrap();
        match decide(&PublicPaths::default(), &tokens, "/api/cursos", Some(&token), Utc::now()) {
            GateDecision::Authenticated(user) => assert_eq!(user.email, "joao@test.com"),
            other => panic!("decisão inesperada: {:?}", other),
        }
    }

    // --- Gate montado num Router, sem sockets ---

    fn router(state: AppState, hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/api/eu",
                get(|user: AuthenticatedUser| async move { user.email }),
            )
            .route(
                "/api/contador",
                get(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        "ok"
                    }
                }),
            )
            .layer(from_fn_with_state(state.clone(), auth_gate))
            .with_state(state)
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn expired_token_stops_the_request_before_the_handler() {
        let state = AppState::for_tests();
        let hits = Arc::new(AtomicUsize::new(0));
        let old = state
            .tokens
            .issue_at("joao@test.com", Utc::now() - Duration::days(30))
            .unwrap();

        let response = router(state, hits.clone())
            .oneshot(
                HttpRequest::get("/api/contador")
                    .header(header::AUTHORIZATION, format!("Bearer {}", old))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("Token expirado"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_token_is_answered_with_token_invalid() {
        let state = AppState::for_tests();
        let response = router(state, Arc::new(AtomicUsize::new(0)))
            .oneshot(
                HttpRequest::get("/api/eu")
                    .header(header::AUTHORIZATION, "Bearer nao.e.valido")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("Token inválido"));
    }

    #[tokio::test]
    async fn valid_token_reaches_the_handler_with_the_identity() {
        let state = AppState::for_tests();
        let token = state.tokens.issue("joao@test.com").unwrap();

        let response = router(state, Arc::new(AtomicUsize::new(0)))
            .oneshot(
                HttpRequest::get("/api/eu")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "joao@test.com");
    }

    #[tokio::test]
    async fn request_without_token_reaches_public_handlers_but_not_protected_ones() {
        let state = AppState::for_tests();
        let hits = Arc::new(AtomicUsize::new(0));
        let app = router(state, hits.clone());

        let open = app
            .clone()
            .oneshot(HttpRequest::get("/api/contador").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(open.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let protected = app
            .oneshot(HttpRequest::get("/api/eu").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(protected.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn identity_already_in_context_is_left_untouched() {
        let state = AppState::for_tests();
        let token = state.tokens.issue("joao@test.com").unwrap();

        // Uma camada exterior já pôs uma identidade no pedido
        let app = router(state, Arc::new(AtomicUsize::new(0))).layer(Extension(AuthenticatedUser {
            email: "maria@test.com".into(),
        }));

        let response = app
            .oneshot(
                HttpRequest::get("/api/eu")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(body_string(response).await, "maria@test.com");
    }
}
