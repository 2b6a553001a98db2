use async_trait::async_trait;

use super::transaction::Transaction;
use crate::domain::category::{UserCategoryRelation, UserContactRelation};
use crate::domain::errors::StoreResult;

/// Join rows between users and categories
#[async_trait]
pub trait CategoryRelationRepository<Tx: Transaction>: Send + Sync {
    async fn create(&self, relation: &UserCategoryRelation) -> StoreResult<UserCategoryRelation>;

    async fn create_tx(
        &self,
        tx: &mut Tx,
        relation: &UserCategoryRelation,
    ) -> StoreResult<UserCategoryRelation>;

    async fn find_by_user(&self, user_id: i64) -> StoreResult<Vec<UserCategoryRelation>>;
}

/// Join rows sharing contacts with users
#[async_trait]
pub trait ContactRelationRepository<Tx: Transaction>: Send + Sync {
    async fn create(&self, relation: &UserContactRelation) -> StoreResult<UserContactRelation>;

    async fn create_tx(
        &self,
        tx: &mut Tx,
        relation: &UserContactRelation,
    ) -> StoreResult<UserContactRelation>;

    async fn find_by_user(&self, user_id: i64) -> StoreResult<Vec<UserContactRelation>>;
}
