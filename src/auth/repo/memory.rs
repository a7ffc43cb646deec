use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::UserStore;
use crate::auth::errors::StoreError;
use crate::auth::repo_types::{NewUser, User};

/// In-process store for tests and local experiments. The map lock makes the
/// uniqueness check and the insert a single step.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tombstone a user. Returns false if the id is unknown or already deleted.
    pub async fn soft_delete(&self, id: Uuid) -> bool {
        let mut users = self.users.lock().await;
        match users.get_mut(&id) {
            Some(u) if !u.is_deleted() => {
                u.deleted_at = Some(OffsetDateTime::now_utc());
                true
            }
            _ => false,
        }
    }

    /// Number of rows including tombstoned ones.
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| !u.is_deleted() && u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|u| !u.is_deleted() && u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users.get(&id).filter(|u| !u.is_deleted()).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        if email_taken(&users, &user.email, None) {
            return Err(StoreError::UniqueViolation);
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        if email_taken(&users, &user.email, Some(user.id)) {
            return Err(StoreError::UniqueViolation);
        }
        let row = users
            .get_mut(&user.id)
            .filter(|u| !u.is_deleted())
            .ok_or(StoreError::Missing(user.id))?;
        row.email = user.email.clone();
        row.password_hash = user.password_hash.clone();
        row.first_name = user.first_name.clone();
        row.last_name = user.last_name.clone();
        row.updated_at = OffsetDateTime::now_utc();
        Ok(row.clone())
    }
}
