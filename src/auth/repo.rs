use async_trait::async_trait;
use uuid::Uuid;

use super::errors::StoreError;
use super::repo_types::{NewUser, User};

mod memory;
mod mysql;
mod postgres;

pub use memory::MemoryUserStore;
pub use mysql::MySqlUserStore;
pub use postgres::PgUserStore;

/// Persistence for user records. Every lookup skips soft-deleted rows.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a live user by exact (case-sensitive) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Create a user, assigning id and timestamps. A live user with the same
    /// email yields [`StoreError::UniqueViolation`].
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Overwrite email, hash and names of a live user and bump `updated_at`.
    async fn update(&self, user: &User) -> Result<User, StoreError>;
}
