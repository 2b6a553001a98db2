use async_trait::async_trait;

use super::transaction::Transaction;
use crate::domain::contact::Contact;
use crate::domain::errors::StoreResult;
use crate::domain::versioning::StatusChange;

/// Repository trait for contacts
#[async_trait]
pub trait ContactRepository<Tx: Transaction>: Send + Sync {
    async fn create(&self, contact: &Contact) -> StoreResult<Contact>;

    async fn create_tx(&self, tx: &mut Tx, contact: &Contact) -> StoreResult<Contact>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Contact>>;

    /// Version-checked update of every mutable column except status
    async fn update(&self, contact: &Contact) -> StoreResult<Contact>;

    async fn disable(&self, id: i64) -> StoreResult<StatusChange>;

    async fn enable(&self, id: i64) -> StoreResult<StatusChange>;
}
