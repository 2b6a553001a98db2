use serde::{Deserialize, Serialize};

use crate::domain::address::Address;
use crate::domain::category::Category;
use crate::domain::contact::Contact;
use crate::domain::user::User;

/// Envelope for onboarding a user together with its address, contact and
/// category memberships
///
/// Never persisted itself; either every part reaches storage or none does.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFull {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub contact: Option<Contact>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl UserFull {
    pub fn new(user: User, address: Address, contact: Contact, categories: Vec<Category>) -> Self {
        Self {
            user: Some(user),
            address: Some(address),
            contact: Some(contact),
            categories,
        }
    }
}
