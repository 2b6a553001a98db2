use async_trait::async_trait;

use super::transaction::Transaction;
use crate::domain::errors::StoreResult;
use crate::domain::user::User;
use crate::domain::versioning::StatusChange;

/// Repository trait for users
///
/// Also the entry point of the transaction coordinator: `begin_tx` opens the
/// transaction every other repository's `create_tx` writes into.
#[async_trait]
pub trait UserRepository<Tx: Transaction>: Send + Sync {
    /// Opens a transaction shared by a multi-entity write
    async fn begin_tx(&self) -> StoreResult<Tx>;

    /// Inserts a user in its own implicit transaction
    async fn create(&self, user: &User) -> StoreResult<User>;

    /// Inserts a user inside `tx`, returning the row with its generated id,
    /// version and timestamps
    async fn create_tx(&self, tx: &mut Tx, user: &User) -> StoreResult<User>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// Writes username and email if `user.version` is still current
    async fn update(&self, user: &User) -> StoreResult<User>;

    async fn disable(&self, id: i64) -> StoreResult<StatusChange>;

    async fn enable(&self, id: i64) -> StoreResult<StatusChange>;
}
