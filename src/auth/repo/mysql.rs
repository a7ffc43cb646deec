use async_trait::async_trait;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::UserStore;
use crate::auth::errors::StoreError;
use crate::auth::repo_types::{NewUser, User};

/// Row as MySQL returns it: the id lives in a CHAR(36) column.
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    deleted_at: Option<OffsetDateTime>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&r.id).map_err(|e| {
            error!(id = %r.id, error = %e, "user row has a malformed id");
            StoreError::Corrupt(format!("id {:?}: {e}", r.id))
        })?;
        Ok(User {
            id,
            email: r.email,
            password_hash: r.password_hash,
            first_name: r.first_name,
            last_name: r.last_name,
            created_at: r.created_at,
            updated_at: r.updated_at,
            deleted_at: r.deleted_at,
        })
    }
}

fn db_failure(op: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| {
        error!(op, error = %e, "mysql call failed");
        StoreError::from(e)
    }
}

pub struct MySqlUserStore {
    db: MySqlPool,
}

impl MySqlUserStore {
    pub fn new(db: MySqlPool) -> Self {
        Self { db }
    }

    async fn fetch_live_by_id(
        tx: &mut Transaction<'_, MySql>,
        id: Uuid,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, first_name, last_name,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_failure("read back user"))?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserStore for MySqlUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, first_name, last_name,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE email = ? AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, email, "find_by_email failed");
            StoreError::from(e)
        })?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, first_name, last_name,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, %id, "find_by_id failed");
            StoreError::from(e)
        })?;
        row.map(User::try_from).transpose()
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        // No RETURNING in MySQL: insert and read back inside one transaction.
        // Dropping the future before commit rolls the insert back.
        let id = Uuid::new_v4();
        let mut tx = self.db.begin().await.map_err(db_failure("begin"))?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            let e = StoreError::from(e);
            match &e {
                StoreError::UniqueViolation => warn!(email = %user.email, "insert hit unique email"),
                _ => error!(error = %e, email = %user.email, "insert user failed"),
            }
            e
        })?;

        let created = Self::fetch_live_by_id(&mut tx, id)
            .await?
            .ok_or(StoreError::Missing(id))?;
        tx.commit().await.map_err(db_failure("commit"))?;

        info!(user_id = %created.id, email = %created.email, "user row created");
        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let mut tx = self.db.begin().await.map_err(db_failure("begin"))?;

        sqlx::query(
            r#"
            UPDATE users
            SET email = ?, password_hash = ?, first_name = ?, last_name = ?,
                updated_at = CURRENT_TIMESTAMP(3)
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "update user failed");
            StoreError::from(e)
        })?;

        // rows_affected is 0 when nothing changed, so re-read instead
        let updated = Self::fetch_live_by_id(&mut tx, user.id)
            .await?
            .ok_or(StoreError::Missing(user.id))?;
        tx.commit().await.map_err(db_failure("commit"))?;

        info!(user_id = %updated.id, "user row updated");
        Ok(updated)
    }
}
