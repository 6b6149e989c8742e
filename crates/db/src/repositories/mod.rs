use async_trait::async_trait;
use thiserror::Error;

use stijnbot_core::domain::user::{UserId, UserRecord};

pub mod memory;
pub mod user;

pub use memory::InMemoryUserRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Per-user state store. Records are created on first save and never deleted.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError>;
    async fn save(&self, record: UserRecord) -> Result<UserId, RepositoryError>;
    async fn all(&self) -> Result<Vec<UserRecord>, RepositoryError>;

    /// Stored record, or a fresh in-memory one when the user is unknown.
    async fn find_or_default(&self, id: &UserId) -> Result<UserRecord, RepositoryError> {
        Ok(self.find_by_id(id).await?.unwrap_or_else(|| UserRecord::unknown(id.clone())))
    }
}
