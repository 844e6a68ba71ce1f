use crate::update::UserUpdate;
use concept_core::{ConceptError, ConceptResult, ObjectId, User};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

/// Persistence for user documents.
///
/// Lookups take a validated [`ObjectId`]; mutations go through
/// [`UserUpdate`], so no caller-built query fragment ever reaches a store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with `Conflict` if the email is taken.
    async fn create(&self, user: &User) -> ConceptResult<()>;
    async fn get(&self, id: ObjectId) -> ConceptResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> ConceptResult<Option<User>>;
    /// Apply `update` to the user. Returns `false` if no such user exists.
    async fn apply(&self, id: ObjectId, update: UserUpdate) -> ConceptResult<bool>;
    async fn delete(&self, id: ObjectId) -> ConceptResult<()>;
    async fn list(&self) -> ConceptResult<Vec<ObjectId>>;
}

/// File-based user store (one JSON document per user).
pub struct FileUserStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles and the email uniqueness check.
    write_lock: Mutex<()>,
}

impl FileUserStore {
    pub async fn new(dir: PathBuf) -> ConceptResult<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn user_path(&self, id: ObjectId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn read(&self, id: ObjectId) -> ConceptResult<Option<User>> {
        let path = self.user_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let data = tokio::fs::read_to_string(path).await?;
        let user: User = serde_json::from_str(&data)
            .map_err(|e| ConceptError::Store(format!("Failed to parse user {id}: {e}")))?;
        Ok(Some(user))
    }

    async fn write(&self, user: &User) -> ConceptResult<()> {
        let json = serde_json::to_string_pretty(user)?;
        tokio::fs::write(self.user_path(user.id), json).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for FileUserStore {
    async fn create(&self, user: &User) -> ConceptResult<()> {
        let _guard = self.write_lock.lock().await;
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(ConceptError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        self.write(user).await?;
        debug!(user_id = %user.id, "User document created");
        Ok(())
    }

    async fn get(&self, id: ObjectId) -> ConceptResult<Option<User>> {
        self.read(id).await
    }

    async fn find_by_email(&self, email: &str) -> ConceptResult<Option<User>> {
        for id in self.list().await? {
            if let Some(user) = self.read(id).await? {
                if user.email == email {
                    return Ok(Some(user));
                }
            }
        }
        Ok(None)
    }

    async fn apply(&self, id: ObjectId, update: UserUpdate) -> ConceptResult<bool> {
        let _guard = self.write_lock.lock().await;
        let Some(mut user) = self.read(id).await? else {
            return Ok(false);
        };
        update.apply_to(&mut user);
        self.write(&user).await?;
        Ok(true)
    }

    async fn delete(&self, id: ObjectId) -> ConceptResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.user_path(id);
        if path.exists() {
            tokio::fs::remove_file(path).await?;
        }
        Ok(())
    }

    async fn list(&self) -> ConceptResult<Vec<ObjectId>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if let Some(stem) = name.strip_suffix(".json") {
                    if let Ok(id) = ObjectId::parse_str(stem) {
                        ids.push(id);
                    }
                }
            }
        }
        Ok(ids)
    }
}
