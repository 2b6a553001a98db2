use serde::{Deserialize, Serialize};

use crate::domain::errors::StoreError;

/// The single row an address or contact belongs to
///
/// Persisted as three nullable columns (`user_id`, `client_id`,
/// `supplier_id`) of which exactly one is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OwnerRef {
    User(i64),
    Client(i64),
    Supplier(i64),
}

impl OwnerRef {
    /// Rebuilds an owner from its column representation.
    ///
    /// # Errors
    /// `InvalidData` when zero or more than one column is set.
    pub fn from_columns(
        entity: &'static str,
        user_id: Option<i64>,
        client_id: Option<i64>,
        supplier_id: Option<i64>,
    ) -> Result<Self, StoreError> {
        match (user_id, client_id, supplier_id) {
            (Some(id), None, None) => Ok(OwnerRef::User(id)),
            (None, Some(id), None) => Ok(OwnerRef::Client(id)),
            (None, None, Some(id)) => Ok(OwnerRef::Supplier(id)),
            (None, None, None) => Err(StoreError::invalid(entity, "an owner reference is required")),
            _ => Err(StoreError::invalid(
                entity,
                "exactly one of user_id, client_id, supplier_id must be set",
            )),
        }
    }

    /// Column values in `(user_id, client_id, supplier_id)` order
    pub fn columns(&self) -> (Option<i64>, Option<i64>, Option<i64>) {
        match *self {
            OwnerRef::User(id) => (Some(id), None, None),
            OwnerRef::Client(id) => (None, Some(id), None),
            OwnerRef::Supplier(id) => (None, None, Some(id)),
        }
    }

    pub fn id(&self) -> i64 {
        match *self {
            OwnerRef::User(id) | OwnerRef::Client(id) | OwnerRef::Supplier(id) => id,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        match *self {
            OwnerRef::User(id) => Some(id),
            _ => None,
        }
    }
}

/// Checks the owner slot of an address or contact before a write.
pub(crate) fn validate_owner(entity: &'static str, owner: Option<&OwnerRef>) -> Result<(), StoreError> {
    let owner = owner.ok_or_else(|| StoreError::invalid(entity, "an owner reference is required"))?;
    if owner.id() <= 0 {
        return Err(StoreError::invalid(
            entity,
            format!("owner id {} must be positive", owner.id()),
        ));
    }
    Ok(())
}
