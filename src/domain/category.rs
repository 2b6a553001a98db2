use serde::{Deserialize, Serialize};

use crate::domain::errors::StoreError;
use crate::domain::validation::{require_id, Validate};

/// Product category a user is assigned to
///
/// Only the id takes part in onboarding; categories are managed elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

impl Category {
    pub fn with_id(id: i64) -> Self {
        Self { id, name: None }
    }
}

/// Join row between a user and a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCategoryRelation {
    pub user_id: i64,
    pub category_id: i64,
}

impl Validate for UserCategoryRelation {
    fn validate(&self) -> Result<(), StoreError> {
        require_id("user", self.user_id)?;
        require_id("category", self.category_id)
    }
}

/// Join row sharing a contact with a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContactRelation {
    pub user_id: i64,
    pub contact_id: i64,
}

impl Validate for UserContactRelation {
    fn validate(&self) -> Result<(), StoreError> {
        require_id("user", self.user_id)?;
        require_id("contact", self.contact_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_with_both_ids_is_valid() {
        let relation = UserCategoryRelation {
            user_id: 1,
            category_id: 2,
        };
        assert!(relation.validate().is_ok());
    }

    #[test]
    fn zero_category_is_zero_id() {
        let relation = UserCategoryRelation {
            user_id: 1,
            category_id: 0,
        };
        assert!(matches!(relation.validate(), Err(StoreError::ZeroId("category"))));
    }

    #[test]
    fn zero_user_is_zero_id() {
        let relation = UserContactRelation {
            user_id: 0,
            contact_id: 5,
        };
        assert!(matches!(relation.validate(), Err(StoreError::ZeroId("user"))));
    }
}
