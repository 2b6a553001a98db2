// Password hashing
// Uses bcrypt for secure password hashing

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::services::PasswordHasher;

/// bcrypt-backed [`PasswordHasher`]
///
/// # Example
/// ```
/// use storefront_backoffice::auth::password::BcryptHasher;
/// use storefront_backoffice::domain::services::PasswordHasher;
///
/// let hasher = BcryptHasher::new(4);
/// let hash = hasher.hash("my_password").expect("valid hash");
/// assert!(hasher.verify("my_password", &hash).unwrap());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Creates a hasher with the given bcrypt cost (4..=31)
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Verifies a password against a bcrypt hash
    ///
    /// # Returns
    /// * `Ok(bool)` - True if password matches, false otherwise
    /// * `Err(StoreError)` - If the hash is malformed
    pub fn verify(&self, password: &str, hash: &str) -> StoreResult<bool> {
        verify(password, hash).map_err(|e| StoreError::PasswordHash(e.to_string()))
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> StoreResult<String> {
        hash(plaintext, self.cost).map_err(|e| StoreError::PasswordHash(e.to_string()))
    }
}
