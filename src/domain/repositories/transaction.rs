use async_trait::async_trait;

use crate::domain::errors::StoreResult;

/// Handle on one open database transaction
///
/// Obtained from [`UserRepository::begin_tx`](super::UserRepository::begin_tx)
/// and passed by `&mut` into every `create_tx` call so that all writes of an
/// aggregate share it. Once committed or rolled back the handle is finished:
/// further writes fail and a second rollback is a no-op.
#[async_trait]
pub trait Transaction: Send + 'static {
    async fn commit(&mut self) -> StoreResult<()>;

    async fn rollback(&mut self) -> StoreResult<()>;
}
