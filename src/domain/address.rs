use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::StoreError;
use crate::domain::owner::{validate_owner, OwnerRef};
use crate::domain::status::EntityStatus;
use crate::domain::validation::{require_max_len, require_text, Validate};

/// Postal address owned by exactly one user, client or supplier
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub owner: Option<OwnerRef>,
    pub street: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub complement: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    #[serde(default)]
    pub status: EntityStatus,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Validate for Address {
    /// # Validation Rules
    /// - Exactly one positive owner reference
    /// - Street, city, state and country are required (at most 100 chars)
    /// - Postal code is 5 to 10 digits
    fn validate(&self) -> Result<(), StoreError> {
        validate_owner("address", self.owner.as_ref())?;

        for (field, value) in [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("country", &self.country),
        ] {
            require_text("address", field, value)?;
            require_max_len("address", field, value, 100)?;
        }

        let digits = self.postal_code.chars().count();
        if !(5..=10).contains(&digits) || !self.postal_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(StoreError::invalid(
                "address",
                format!("postal code {:?} must be 5 to 10 digits", self.postal_code),
            ));
        }
        if self.version < 0 {
            return Err(StoreError::invalid("address", "version must not be negative"));
        }
        Ok(())
    }
}
