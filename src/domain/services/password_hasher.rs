use crate::domain::errors::StoreResult;

/// One-way password hashing capability
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> StoreResult<String>;
}
