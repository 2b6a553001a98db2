use std::sync::Arc;

use crate::domain::repositories::{Repositories, Transaction};
use crate::domain::services::{OnboardingService, PasswordHasher};

/// Shared handler state
///
/// Generic over the transaction type so the same router serves the
/// PostgreSQL adapters in production and the in-memory store in tests.
pub struct AppState<Tx: Transaction> {
    pub repos: Repositories<Tx>,
    pub onboarding: Arc<OnboardingService<Tx>>,
}

impl<Tx: Transaction> AppState<Tx> {
    pub fn new(repos: Repositories<Tx>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            onboarding: Arc::new(OnboardingService::new(repos.clone(), hasher)),
            repos,
        }
    }
}

impl<Tx: Transaction> Clone for AppState<Tx> {
    fn clone(&self) -> Self {
        Self {
            repos: self.repos.clone(),
            onboarding: Arc::clone(&self.onboarding),
        }
    }
}
