use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};

use super::postgres_transaction::PostgresTransaction;
use crate::domain::category::{UserCategoryRelation, UserContactRelation};
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::repositories::{CategoryRelationRepository, ContactRelationRepository};
use crate::domain::validation::{require_id, Validate};

async fn insert_category_relation<'e, E>(
    executor: E,
    relation: &UserCategoryRelation,
) -> StoreResult<UserCategoryRelation>
where
    E: PgExecutor<'e>,
{
    sqlx::query("INSERT INTO user_categories (user_id, category_id) VALUES ($1, $2)")
        .bind(relation.user_id)
        .bind(relation.category_id)
        .execute(executor)
        .await
        .map_err(|e| StoreError::create("user category", e))?;

    Ok(*relation)
}

async fn insert_contact_relation<'e, E>(
    executor: E,
    relation: &UserContactRelation,
) -> StoreResult<UserContactRelation>
where
    E: PgExecutor<'e>,
{
    sqlx::query("INSERT INTO user_contacts (user_id, contact_id) VALUES ($1, $2)")
        .bind(relation.user_id)
        .bind(relation.contact_id)
        .execute(executor)
        .await
        .map_err(|e| StoreError::create("user contact", e))?;

    Ok(*relation)
}

/// PostgreSQL implementation of CategoryRelationRepository
pub struct PostgresCategoryRelationRepository {
    pool: PgPool,
}

impl PostgresCategoryRelationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRelationRepository<PostgresTransaction> for PostgresCategoryRelationRepository {
    async fn create(&self, relation: &UserCategoryRelation) -> StoreResult<UserCategoryRelation> {
        relation.validate()?;
        insert_category_relation(&self.pool, relation).await
    }

    async fn create_tx(
        &self,
        tx: &mut PostgresTransaction,
        relation: &UserCategoryRelation,
    ) -> StoreResult<UserCategoryRelation> {
        relation.validate()?;
        insert_category_relation(tx.conn()?, relation).await
    }

    async fn find_by_user(&self, user_id: i64) -> StoreResult<Vec<UserCategoryRelation>> {
        require_id("user", user_id)?;
        let rows = sqlx::query_as::<_, (i64, i64)>(
            "SELECT user_id, category_id FROM user_categories WHERE user_id = $1 ORDER BY category_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::query("user category", e))?;

        Ok(rows
            .into_iter()
            .map(|(user_id, category_id)| UserCategoryRelation {
                user_id,
                category_id,
            })
            .collect())
    }
}

/// PostgreSQL implementation of ContactRelationRepository
pub struct PostgresContactRelationRepository {
    pool: PgPool,
}

impl PostgresContactRelationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactRelationRepository<PostgresTransaction> for PostgresContactRelationRepository {
    async fn create(&self, relation: &UserContactRelation) -> StoreResult<UserContactRelation> {
        relation.validate()?;
        insert_contact_relation(&self.pool, relation).await
    }

    async fn create_tx(
        &self,
        tx: &mut PostgresTransaction,
        relation: &UserContactRelation,
    ) -> StoreResult<UserContactRelation> {
        relation.validate()?;
        insert_contact_relation(tx.conn()?, relation).await
    }

    async fn find_by_user(&self, user_id: i64) -> StoreResult<Vec<UserContactRelation>> {
        require_id("user", user_id)?;
        let rows = sqlx::query_as::<_, (i64, i64)>(
            "SELECT user_id, contact_id FROM user_contacts WHERE user_id = $1 ORDER BY contact_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::query("user contact", e))?;

        Ok(rows
            .into_iter()
            .map(|(user_id, contact_id)| UserContactRelation {
                user_id,
                contact_id,
            })
            .collect())
    }
}
