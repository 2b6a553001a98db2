use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{Email, Username};
use crate::domain::errors::StoreError;
use crate::domain::status::EntityStatus;
use crate::domain::validation::{require_text, Validate};

/// Minimum plaintext password length
pub const MIN_PASSWORD_LEN: usize = 8;
/// bcrypt ignores everything past 72 bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Back-office user
///
/// `password` carries the plaintext on the way in and the hash once the
/// onboarding service has run; it is never serialized.
///
/// # Invariants
/// - `version` starts at 0 and grows by exactly 1 per persisted mutation
/// - `id` is 0 until the repository assigns one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    #[serde(default = "Uuid::new_v4")]
    pub uid: Uuid,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub status: EntityStatus,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Creates an unsaved, enabled user at version 0
    ///
    /// # Example
    /// ```
    /// use storefront_backoffice::domain::user::User;
    ///
    /// let user = User::new("ana", "ana@x.com", "Secret123");
    /// assert_eq!(user.id, 0);
    /// assert_eq!(user.version, 0);
    /// ```
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            uid: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password: password.into(),
            status: EntityStatus::Enabled,
            version: 0,
            created_at: None,
            updated_at: None,
        }
    }

    /// Checks the fields an update may change; the password is left alone
    pub fn validate_profile(&self) -> Result<(), StoreError> {
        Username::new(self.username.as_str())?;
        Email::new("user", self.email.as_str())?;
        if self.version < 0 {
            return Err(StoreError::invalid("user", "version must not be negative"));
        }
        Ok(())
    }

    /// Checks a user about to be inserted
    ///
    /// `password` already holds the hasher's output here, so only its
    /// presence is checked; the plaintext rules live in [`Validate`].
    pub fn validate_for_storage(&self) -> Result<(), StoreError> {
        self.validate_profile()?;
        require_text("user", "password", &self.password)
    }
}

impl Validate for User {
    /// Checks the plaintext password rules on top of the profile
    fn validate(&self) -> Result<(), StoreError> {
        self.validate_profile()?;

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(StoreError::invalid(
                "user",
                format!("password must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        if self.password.len() > MAX_PASSWORD_BYTES {
            return Err(StoreError::invalid(
                "user",
                format!("password must be at most {} bytes", MAX_PASSWORD_BYTES),
            ));
        }
        Ok(())
    }
}
