// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};

use crate::{
    common::error::{AppError, Resource},
    db::{Store, UserRepository},
    models::auth::{NewPrincipal, Principal, RegisterUserPayload, Role},
    services::token::TokenService,
};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self { store, tokens, bcrypt_cost }
    }

    /// Regista o utilizador e devolve logo um token para ele.
    pub async fn register(&self, payload: &RegisterUserPayload) -> Result<(String, Principal), AppError> {
        let principal = self.create_principal(payload).await?;
        let token = self.tokens.issue(&principal.email)?;

        tracing::info!(user_id = principal.id, role = ?principal.role, "Utilizador registado");
        Ok((token, principal))
    }

    /// Cria o utilizador (e a linha de aluno/professor) sem emitir token.
    pub async fn create_principal(&self, payload: &RegisterUserPayload) -> Result<Principal, AppError> {
        // 1. Email livre? (o índice único volta a garantir no INSERT)
        {
            let mut tx = self.store.begin().await?;
            if tx.find_user_by_email(&payload.email).await?.is_some() {
                return Err(AppError::DuplicateEmail);
            }
        }

        // 2. Password obrigatória
        let password = payload
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(AppError::MissingPassword)?
            .to_owned();

        // 3. Hashing fora da transação, num thread de bloqueio
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let new_user = NewPrincipal {
            name: payload.name.clone(),
            email: payload.email.clone(),
            password_hash,
            role: payload.role.unwrap_or(Role::Aluno),
            department: payload.department.clone(),
        };

        // 4. Insere utilizador + especialização na mesma transação
        let mut tx = self.store.begin().await?;
        let principal = tx.insert_user(&new_user).await?;
        tx.commit().await?;

        Ok(principal)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, Principal), AppError> {
        let principal = {
            let mut tx = self.store.begin().await?;
            tx.find_user_by_email(email).await?.ok_or(AppError::UnknownEmail)?
        };

        let password_clone = password.to_owned();
        let password_hash_clone = principal.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::debug!(user_id = principal.id, "Login recusado: senha incorreta");
            return Err(AppError::BadCredential);
        }

        let token = self.tokens.issue(&principal.email)?;
        Ok((token, principal))
    }

    /// Valida o token e devolve o email que ele transporta.
    pub fn validate(&self, token: &str) -> Result<String, AppError> {
        self.tokens.validate(token)
    }

    /// O utilizador dono do email de um token já validado.
    pub async fn current_principal(&self, email: &str) -> Result<Principal, AppError> {
        let mut tx = self.store.begin().await?;
        tx.find_user_by_email(email)
            .await?
            .ok_or(AppError::NotFound(Resource::Utilizador))
    }
}
