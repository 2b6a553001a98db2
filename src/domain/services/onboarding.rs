use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use super::password_hasher::PasswordHasher;
use crate::domain::address::Address;
use crate::domain::category::{Category, UserCategoryRelation, UserContactRelation};
use crate::domain::contact::Contact;
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::owner::OwnerRef;
use crate::domain::repositories::{Repositories, Transaction};
use crate::domain::user::User;
use crate::domain::user_full::UserFull;
use crate::domain::validation::Validate;

/// Creates a user together with its address, contact and category
/// memberships as one atomic unit
///
/// Writes run strictly in order (user, address, contact, contact relation,
/// category relations) inside a single transaction opened through the user
/// repository. Any failure rolls the whole sequence back; a panic rolls back
/// and then resumes unwinding with the original payload.
pub struct OnboardingService<Tx: Transaction> {
    repos: Repositories<Tx>,
    hasher: Arc<dyn PasswordHasher>,
}

impl<Tx: Transaction> OnboardingService<Tx> {
    pub fn new(repos: Repositories<Tx>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repos, hasher }
    }

    /// Persists every part of `aggregate` or none of them.
    ///
    /// # Returns
    /// * `Ok(UserFull)` - Built from the rows the repositories returned, with
    ///   generated ids, versions, timestamps and the hashed password
    /// * `Err(StoreError)` - `NilModel`/`InvalidData` before any I/O, otherwise
    ///   the failing write joined with the rollback outcome if that failed too
    pub async fn create_full(&self, aggregate: UserFull) -> StoreResult<UserFull> {
        let UserFull {
            user,
            address,
            contact,
            categories,
        } = aggregate;

        let mut user = user.ok_or(StoreError::NilModel("user"))?;
        let address = address.ok_or(StoreError::NilModel("address"))?;
        let contact = contact.ok_or(StoreError::NilModel("contact"))?;
        if categories.is_empty() {
            return Err(StoreError::invalid("user", "at least one category is required"));
        }
        // plaintext rules; from here on the repositories only see the hash
        user.validate()?;

        user.password = self.hasher.hash(&user.password)?;

        let mut tx = self.repos.users.begin_tx().await?;
        debug!(username = %user.username, "onboarding transaction opened");

        let written = AssertUnwindSafe(self.write_aggregate(&mut tx, user, address, contact, categories))
            .catch_unwind()
            .await;

        match written {
            Err(payload) => {
                error!("panic while writing aggregate, rolling back");
                if let Err(e) = tx.rollback().await {
                    error!(error = %e, "rollback after panic failed");
                }
                panic::resume_unwind(payload)
            }
            Ok(Err(err)) => {
                warn!(error = %err, "onboarding failed, rolling back");
                let rollback = tx.rollback().await;
                Err(err.with_rollback(rollback))
            }
            Ok(Ok(full)) => {
                if let Err(err) = tx.commit().await {
                    error!(error = %err, "onboarding commit failed");
                    let rollback = tx.rollback().await;
                    return Err(err.with_rollback(rollback));
                }
                if let Some(user) = &full.user {
                    info!(
                        user_id = user.id,
                        categories = full.categories.len(),
                        "user onboarded"
                    );
                }
                Ok(full)
            }
        }
    }

    async fn write_aggregate(
        &self,
        tx: &mut Tx,
        user: User,
        mut address: Address,
        mut contact: Contact,
        categories: Vec<Category>,
    ) -> StoreResult<UserFull> {
        let user = self.repos.users.create_tx(tx, &user).await?;

        // the owner id only exists once the user row does
        address.owner = Some(OwnerRef::User(user.id));
        address.validate()?;
        let address = self.repos.addresses.create_tx(tx, &address).await?;

        contact.owner = Some(OwnerRef::User(user.id));
        contact.validate()?;
        let contact = self.repos.contacts.create_tx(tx, &contact).await?;

        let contact_relation = UserContactRelation {
            user_id: user.id,
            contact_id: contact.id,
        };
        contact_relation.validate()?;
        self.repos
            .contact_relations
            .create_tx(tx, &contact_relation)
            .await?;

        for category in &categories {
            let relation = UserCategoryRelation {
                user_id: user.id,
                category_id: category.id,
            };
            relation.validate()?;
            self.repos.category_relations.create_tx(tx, &relation).await?;
        }

        Ok(UserFull {
            user: Some(user),
            address: Some(address),
            contact: Some(contact),
            categories,
        })
    }
}
