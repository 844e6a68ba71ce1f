use crate::store::UserStore;
use crate::update::UserUpdate;
use async_trait::async_trait;
use concept_core::{ConceptError, ConceptResult, ObjectId, User};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process user store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<ObjectId, User>>,
}

impl MemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: &User) -> ConceptResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(ConceptError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get(&self, id: ObjectId) -> ConceptResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> ConceptResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn apply(&self, id: ObjectId, update: UserUpdate) -> ConceptResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                update.apply_to(user);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ObjectId) -> ConceptResult<()> {
        self.users.write().await.remove(&id);
        Ok(())
    }

    async fn list(&self) -> ConceptResult<Vec<ObjectId>> {
        Ok(self.users.read().await.keys().copied().collect())
    }
}
