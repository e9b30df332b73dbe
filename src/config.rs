// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    db::{MemoryStore, PgStore, Store},
    middleware::auth::PublicPaths,
    services::{
        auth::AuthService, gamification_service::GamificationService, hierarchy_service::HierarchyService,
        professor_service::ProfessorService, team_service::TeamService, token::TokenService,
        user_service::UserService,
    },
};

const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub cors_origins: Vec<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let cors_origins = match env::var("CORS_ORIGINS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_owned)
                .collect(),
            Err(_) => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration_hours: env_or("JWT_EXPIRATION_HOURS", 24)?,
            bcrypt_cost: env_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            server_addr: env_or("SERVER_ADDR", "0.0.0.0:8080".to_string())?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 5)?,
            cors_origins,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with("memory://")
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "memory://".to_string(),
            jwt_secret: "segredo-de-teste".to_string(),
            jwt_expiration_hours: 1,
            bcrypt_cost: 4,
            server_addr: "127.0.0.1:0".to_string(),
            db_max_connections: 1,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} tem um valor inválido: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

/// Abre o Store indicado por `DATABASE_URL` e, no Postgres, corre as migrações.
pub async fn connect_store(settings: &Settings) -> anyhow::Result<Arc<dyn Store>> {
    if settings.uses_memory_store() {
        tracing::warn!("A usar o store em memória: os dados perdem-se ao terminar");
        return Ok(Arc::new(MemoryStore::new()));
    }

    // Conecta ao banco de dados, usando '?' para propagar erros
    let pool = PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&settings.database_url)
        .await
        .context("Falha ao conectar ao banco de dados")?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    Ok(Arc::new(PgStore::new(pool)))
}

#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenService,
    pub public_paths: PublicPaths,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub hierarchy_service: HierarchyService,
    pub professor_service: ProfessorService,
    pub team_service: TeamService,
    pub gamification_service: GamificationService,
}

impl AppState {
    // --- Monta o gráfico de dependências ---
    pub fn new(settings: &Settings, store: Arc<dyn Store>) -> Self {
        let tokens = TokenService::new(
            &settings.jwt_secret,
            chrono::Duration::hours(settings.jwt_expiration_hours),
        );

        Self {
            auth_service: AuthService::new(store.clone(), tokens.clone(), settings.bcrypt_cost),
            user_service: UserService::new(store.clone()),
            hierarchy_service: HierarchyService::new(store.clone()),
            professor_service: ProfessorService::new(store.clone()),
            team_service: TeamService::new(store.clone()),
            gamification_service: GamificationService::new(store),
            public_paths: PublicPaths::default(),
            tokens,
        }
    }

    /// Estado completo sobre um `MemoryStore` novo.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::new(&Settings::for_tests(), Arc::new(MemoryStore::new()))
    }
}
