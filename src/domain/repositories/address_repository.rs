use async_trait::async_trait;

use super::transaction::Transaction;
use crate::domain::address::Address;
use crate::domain::errors::StoreResult;
use crate::domain::versioning::StatusChange;

/// Repository trait for addresses
#[async_trait]
pub trait AddressRepository<Tx: Transaction>: Send + Sync {
    async fn create(&self, address: &Address) -> StoreResult<Address>;

    async fn create_tx(&self, tx: &mut Tx, address: &Address) -> StoreResult<Address>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Address>>;

    /// Version-checked update of every mutable column except status
    async fn update(&self, address: &Address) -> StoreResult<Address>;

    async fn disable(&self, id: i64) -> StoreResult<StatusChange>;

    async fn enable(&self, id: i64) -> StoreResult<StatusChange>;
}
