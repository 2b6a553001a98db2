use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::postgres_transaction::PostgresTransaction;
use super::postgres_versioned_rows::PgVersionedRows;
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::repositories::UserRepository;
use crate::domain::status::EntityStatus;
use crate::domain::user::User;
use crate::domain::validation::require_id;
use crate::domain::versioning::{self, StatusChange};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    uid: Uuid,
    username: String,
    email: String,
    password_hash: String,
    status: EntityStatus,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            uid: r.uid,
            username: r.username,
            email: r.email,
            password: r.password_hash,
            status: r.status,
            version: r.version,
            created_at: Some(r.created_at),
            updated_at: Some(r.updated_at),
        }
    }
}

async fn insert_user<'e, E>(executor: E, user: &User) -> StoreResult<User>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (uid, username, email, password_hash, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, uid, username, email, password_hash, status, version, created_at, updated_at
        "#,
    )
    .bind(user.uid)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password)
    .bind(user.status)
    .fetch_one(executor)
    .await
    .map_err(|e| StoreError::create("user", e))?;

    Ok(row.into())
}

/// PostgreSQL implementation of UserRepository
///
/// Also the transaction coordinator: `begin_tx` opens the transaction every
/// other PostgreSQL repository writes into during onboarding.
pub struct PostgresUserRepository {
    pool: PgPool,
    rows: PgVersionedRows,
}

impl PostgresUserRepository {
    /// Creates a new PostgresUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self {
            rows: PgVersionedRows::new(pool.clone(), "users", "user"),
            pool,
        }
    }
}

#[async_trait]
impl UserRepository<PostgresTransaction> for PostgresUserRepository {
    async fn begin_tx(&self) -> StoreResult<PostgresTransaction> {
        let tx = self.pool.begin().await.map_err(StoreError::transaction)?;
        Ok(PostgresTransaction::new(tx))
    }

    async fn create(&self, user: &User) -> StoreResult<User> {
        user.validate_for_storage()?;
        insert_user(&self.pool, user).await
    }

    async fn create_tx(&self, tx: &mut PostgresTransaction, user: &User) -> StoreResult<User> {
        user.validate_for_storage()?;
        insert_user(tx.conn()?, user).await
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        require_id("user", id)?;
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, uid, username, email, password_hash, status, version, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::query("user", e))?;

        Ok(row.map(User::from))
    }

    async fn update(&self, user: &User) -> StoreResult<User> {
        require_id("user", user.id)?;
        user.validate_profile()?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET username = $3, email = $4, version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING id, uid, username, email, password_hash, status, version, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(user.version)
        .bind(&user.username)
        .bind(&user.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::update("user", e))?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(versioning::settle_missed_swap(&self.rows, user.id, user.version).await),
        }
    }

    async fn disable(&self, id: i64) -> StoreResult<StatusChange> {
        versioning::set_status(&self.rows, id, EntityStatus::Disabled).await
    }

    async fn enable(&self, id: i64) -> StoreResult<StatusChange> {
        versioning::set_status(&self.rows, id, EntityStatus::Enabled).await
    }
}
