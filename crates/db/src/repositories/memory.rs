use std::collections::HashMap;

use tokio::sync::RwLock;

use stijnbot_core::domain::user::{UserId, UserRecord};

use super::{RepositoryError, UserRepository};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, UserRecord>>,
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(&id.0).cloned())
    }

    async fn save(&self, record: UserRecord) -> Result<UserId, RepositoryError> {
        let mut users = self.users.write().await;
        let id = record.id.clone();
        users.insert(id.0.clone(), record);
        Ok(id)
    }

    async fn all(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        let users = self.users.read().await;
        let mut records: Vec<UserRecord> = users.values().cloned().collect();
        records.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(records)
    }
}
