// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod in_memory;
pub mod postgres_address_repository;
pub mod postgres_contact_repository;
pub mod postgres_relation_repository;
pub mod postgres_transaction;
mod postgres_versioned_rows;
pub mod postgres_user_repository;

use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::repositories::Repositories;

pub use in_memory::{FailPoint, InMemoryStore, MemoryTransaction};
pub use postgres_address_repository::PostgresAddressRepository;
pub use postgres_contact_repository::PostgresContactRepository;
pub use postgres_relation_repository::{
    PostgresCategoryRelationRepository, PostgresContactRelationRepository,
};
pub use postgres_transaction::PostgresTransaction;
pub use postgres_user_repository::PostgresUserRepository;

/// Wires every PostgreSQL repository onto one pool
pub fn postgres_repositories(pool: PgPool) -> Repositories<PostgresTransaction> {
    Repositories {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        addresses: Arc::new(PostgresAddressRepository::new(pool.clone())),
        contacts: Arc::new(PostgresContactRepository::new(pool.clone())),
        category_relations: Arc::new(PostgresCategoryRelationRepository::new(pool.clone())),
        contact_relations: Arc::new(PostgresContactRelationRepository::new(pool)),
    }
}
