// Repository ports
// Every port is generic over one transaction type so a saga can only hand
// all of them the same open transaction

pub mod address_repository;
pub mod contact_repository;
pub mod relation_repository;
pub mod transaction;
pub mod user_repository;

pub use address_repository::AddressRepository;
pub use contact_repository::ContactRepository;
pub use relation_repository::{CategoryRelationRepository, ContactRelationRepository};
pub use transaction::Transaction;
pub use user_repository::UserRepository;

use std::sync::Arc;

/// Every repository of the store, sharing one transaction type
pub struct Repositories<Tx: Transaction> {
    pub users: Arc<dyn UserRepository<Tx>>,
    pub addresses: Arc<dyn AddressRepository<Tx>>,
    pub contacts: Arc<dyn ContactRepository<Tx>>,
    pub category_relations: Arc<dyn CategoryRelationRepository<Tx>>,
    pub contact_relations: Arc<dyn ContactRelationRepository<Tx>>,
}

impl<Tx: Transaction> Clone for Repositories<Tx> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            addresses: Arc::clone(&self.addresses),
            contacts: Arc::clone(&self.contacts),
            category_relations: Arc::clone(&self.category_relations),
            contact_relations: Arc::clone(&self.contact_relations),
        }
    }
}
