use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::UserStore;
use crate::auth::errors::StoreError;
use crate::auth::repo_types::{NewUser, User};

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, email, "find_by_email failed");
            StoreError::from(e)
        })?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, %id, "find_by_id failed");
            StoreError::from(e)
        })?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        // single statement, so a dropped call never leaves a partial row
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, first_name, last_name,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            let e = StoreError::from(e);
            match &e {
                StoreError::UniqueViolation => warn!(email = %user.email, "insert hit unique email"),
                _ => error!(error = %e, email = %user.email, "insert user failed"),
            }
            e
        })?;
        info!(user_id = %created.id, email = %created.email, "user row created");
        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, first_name = $4, last_name = $5,
                updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, email, password_hash, first_name, last_name,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "update user failed");
            StoreError::from(e)
        })?
        .ok_or(StoreError::Missing(user.id))?;
        info!(user_id = %updated.id, "user row updated");
        Ok(updated)
    }
}
