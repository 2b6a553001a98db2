use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::StoreError;

/// Email value object representing a valid email address
///
/// # Invariants
/// - Exactly one '@' with a non-empty local part and domain
/// - No whitespace
/// - Is immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Creates a new Email value object
    ///
    /// # Arguments
    /// * `entity` - Name of the entity the address belongs to, used in errors
    /// * `email` - The email string to validate
    ///
    /// # Example
    /// ```
    /// use storefront_backoffice::domain::user::value_objects::Email;
    ///
    /// let email = Email::new("user", "ana@x.com").expect("valid email");
    /// assert_eq!(email.as_str(), "ana@x.com");
    /// ```
    pub fn new(entity: &'static str, email: impl Into<String>) -> Result<Self, StoreError> {
        let email = email.into();
        if Self::is_valid(&email) {
            Ok(Email(email))
        } else {
            Err(StoreError::invalid(entity, format!("invalid email: {:?}", email)))
        }
    }

    fn is_valid(email: &str) -> bool {
        if email.chars().any(char::is_whitespace) {
            return false;
        }
        match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
            None => false,
        }
    }

    /// Returns the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Username value object
///
/// 3 to 50 characters of letters, digits, '.', '_' or '-'.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub fn new(username: impl Into<String>) -> Result<Self, StoreError> {
        let username = username.into();
        let len = username.chars().count();
        if !(3..=50).contains(&len) {
            return Err(StoreError::invalid(
                "user",
                "username must be between 3 and 50 characters",
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(StoreError::invalid(
                "user",
                format!("username {:?} contains invalid characters", username),
            ));
        }
        Ok(Username(username))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
