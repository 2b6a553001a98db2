use async_trait::async_trait;
use sqlx::{PgConnection, Postgres};

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::repositories::Transaction;

/// PostgreSQL transaction handed to every `create_tx`
///
/// Dropping an unfinished handle rolls the transaction back (sqlx
/// semantics), which covers cancelled requests. After a failed `COMMIT` the
/// server has already aborted the transaction, so a following `rollback` has
/// nothing left to do and succeeds.
pub struct PostgresTransaction {
    inner: Option<sqlx::Transaction<'static, Postgres>>,
}

impl PostgresTransaction {
    pub(crate) fn new(inner: sqlx::Transaction<'static, Postgres>) -> Self {
        Self { inner: Some(inner) }
    }

    /// Connection of the open transaction
    pub(crate) fn conn(&mut self) -> StoreResult<&mut PgConnection> {
        self.inner
            .as_deref_mut()
            .ok_or_else(|| StoreError::transaction("transaction already finished"))
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(&mut self) -> StoreResult<()> {
        let tx = self
            .inner
            .take()
            .ok_or_else(|| StoreError::transaction("transaction already finished"))?;
        tx.commit().await.map_err(StoreError::transaction)
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        match self.inner.take() {
            Some(tx) => tx.rollback().await.map_err(StoreError::transaction),
            None => Ok(()),
        }
    }
}
