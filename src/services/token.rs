// src/services/token.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::Claims};

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Emite e valida os bearer tokens (HS256).
///
/// A validação é uma função pura de (token, segredo, instante atual): não há
/// sessões nem lista de revogação. O segredo é lido uma vez no arranque.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
    validity: Duration,
}

impl TokenService {
    pub fn new(secret: &str, validity: Duration) -> Self {
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            validity,
        }
    }

    pub fn issue(&self, email: &str) -> Result<String, AppError> {
        self.issue_at(email, Utc::now())
    }

    /// Emite um token como se fosse `at`.
    pub fn issue_at(&self, email: &str, at: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            sub: email.to_string(),
            exp: (at + self.validity).timestamp(),
            iat: at.timestamp(),
            jti: Uuid::new_v4(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)?)
    }

    /// Devolve o email do token.
    pub fn validate(&self, token: &str) -> Result<String, AppError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        // A expiração é comparada abaixo contra `now`, não contra o relógio da lib
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.keys.decoding, &validation)
            .map_err(|_| AppError::TokenInvalid)?;

        if data.claims.exp <= now.timestamp() {
            return Err(AppError::TokenExpired);
        }

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("segredo-de-teste", Duration::hours(24))
    }

    #[test]
    fn issued_token_resolves_to_the_email() {
        let tokens = service();
        let token = tokens.issue("joao@test.com").unwrap();
        assert_eq!(tokens.validate(&token).unwrap(), "joao@test.com");
    }

    #[test]
    fn two_tokens_for_the_same_email_are_distinct() {
        let tokens = service();
        let now = Utc::now();
        let a = tokens.issue_at("joao@test.com", now).unwrap();
        let b = tokens.issue_at("joao@test.com", now).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn token_past_its_expiry_is_rejected_as_expired() {
        let tokens = service();
        let issued = Utc::now() - Duration::hours(48);
        let token = tokens.issue_at("joao@test.com", issued).unwrap();

        assert!(matches!(tokens.validate(&token), Err(AppError::TokenExpired)));
        // Antes da expiração o mesmo token é válido
        assert!(tokens.validate_at(&token, issued + Duration::hours(1)).is_ok());
    }

    #[test]
    fn tampered_signature_is_rejected_as_invalid() {
        let tokens = service();
        let token = tokens.issue("joao@test.com").unwrap();

        let (head, signature) = token.rsplit_once('.').unwrap();
        let first = if signature.starts_with('A') { 'B' } else { 'A' };
        let tampered = format!("{}.{}{}", head, first, &signature[1..]);

        assert!(matches!(tokens.validate(&tampered), Err(AppError::TokenInvalid)));
    }

    #[test]
    fn token_signed_with_another_secret_is_invalid() {
        let other = TokenService::new("outro-segredo", Duration::hours(24));
        let token = other.issue("joao@test.com").unwrap();
        assert!(matches!(service().validate(&token), Err(AppError::TokenInvalid)));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(service().validate("nao.e.um.token"), Err(AppError::TokenInvalid)));
        assert!(matches!(service().validate(""), Err(AppError::TokenInvalid)));
    }
}
