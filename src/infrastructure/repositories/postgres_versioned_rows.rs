use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::status::EntityStatus;
use crate::domain::versioning::{VersionStamp, VersionedRows, VersionedStatus};

/// Version-protocol primitives over one PostgreSQL table
///
/// `table` is always one of the crate's own table names, never user input.
pub(crate) struct PgVersionedRows {
    pool: PgPool,
    table: &'static str,
    entity: &'static str,
}

impl PgVersionedRows {
    pub(crate) fn new(pool: PgPool, table: &'static str, entity: &'static str) -> Self {
        Self {
            pool,
            table,
            entity,
        }
    }
}

#[async_trait]
impl VersionedRows for PgVersionedRows {
    fn entity(&self) -> &'static str {
        self.entity
    }

    async fn exists(&self, id: i64) -> StoreResult<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", self.table);
        sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::query(self.entity, e))
    }

    async fn read_status(&self, id: i64) -> StoreResult<Option<VersionedStatus>> {
        let sql = format!(
            "SELECT status, version, updated_at FROM {} WHERE id = $1",
            self.table
        );
        let row = sqlx::query_as::<_, (EntityStatus, i64, DateTime<Utc>)>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::query(self.entity, e))?;

        Ok(row.map(|(status, version, updated_at)| VersionedStatus {
            status,
            stamp: VersionStamp {
                version,
                updated_at,
            },
        }))
    }

    async fn swap_status(
        &self,
        id: i64,
        expected: i64,
        status: EntityStatus,
    ) -> StoreResult<Option<VersionStamp>> {
        let sql = format!(
            r#"
            UPDATE {}
            SET status = $3, version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING version, updated_at
            "#,
            self.table
        );
        let row = sqlx::query_as::<_, (i64, DateTime<Utc>)>(&sql)
            .bind(id)
            .bind(expected)
            .bind(status)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::update(self.entity, e))?;

        Ok(row.map(|(version, updated_at)| VersionStamp {
            version,
            updated_at,
        }))
    }
}
