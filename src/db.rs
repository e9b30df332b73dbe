// src/db.rs

use async_trait::async_trait;

use crate::common::error::AppError;

pub mod user_repo;
pub use user_repo::UserRepository;
pub mod hierarchy_repo;
pub use hierarchy_repo::HierarchyRepository;
pub mod team_repo;
pub use team_repo::TeamRepository;
pub mod gamification_repo;
pub use gamification_repo::GamificationRepository;

pub mod pg_store;
pub use pg_store::PgStore;
pub mod memory_store;
pub use memory_store::MemoryStore;

/// Ponto de entrada do armazenamento. Cada operação de um registo abre uma
/// transação, faz todas as leituras e escritas nela e faz commit no fim.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Transaction>, AppError>;
}

/// Uma transação aberta. Largar sem `commit` desfaz tudo (rollback).
#[async_trait]
pub trait Transaction:
    UserRepository + HierarchyRepository + TeamRepository + GamificationRepository + Send
{
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
