// src/db/pg_store.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};

use crate::{
    common::error::AppError,
    db::{Store, Transaction},
};

/// Store sobre PostgreSQL. Os índices únicos do schema são a guarda final
/// das invariantes; as verificações dos serviços só dão a mensagem certa mais cedo.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }
}

pub struct PgTransaction {
    // Os repositórios executam as queries em `&mut *self.tx`
    pub(crate) tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
