use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::StoreError;
use crate::domain::owner::{validate_owner, OwnerRef};
use crate::domain::status::EntityStatus;
use crate::domain::user::value_objects::Email;
use crate::domain::validation::{require_max_len, require_text, Validate};

/// Contact card owned by exactly one user, client or supplier
///
/// Users may additionally share a contact through a
/// [`UserContactRelation`](crate::domain::category::UserContactRelation).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub owner: Option<OwnerRef>,
    pub contact_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub cellphone: Option<String>,
    #[serde(default)]
    pub status: EntityStatus,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contact {
    pub fn named(contact_name: impl Into<String>) -> Self {
        Self {
            contact_name: contact_name.into(),
            ..Default::default()
        }
    }
}

fn validate_phone(field: &str, phone: &str) -> Result<(), StoreError> {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-' | ' '));
    if !allowed || !(8..=15).contains(&digits) {
        return Err(StoreError::invalid(
            "contact",
            format!("{} {:?} is not a valid phone number", field, phone),
        ));
    }
    Ok(())
}

impl Validate for Contact {
    fn validate(&self) -> Result<(), StoreError> {
        validate_owner("contact", self.owner.as_ref())?;
        require_text("contact", "contact_name", &self.contact_name)?;
        require_max_len("contact", "contact_name", &self.contact_name, 100)?;

        if let Some(email) = &self.email {
            Email::new("contact", email.as_str())?;
        }
        if let Some(phone) = &self.phone {
            validate_phone("phone", phone)?;
        }
        if let Some(cellphone) = &self.cellphone {
            validate_phone("cellphone", cellphone)?;
        }
        if self.version < 0 {
            return Err(StoreError::invalid("contact", "version must not be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(contact: Contact) -> Contact {
        Contact {
            owner: Some(OwnerRef::User(1)),
            ..contact
        }
    }

    #[test]
    fn named_contact_with_owner_is_valid() {
        assert!(owned(Contact::named("Ana")).validate().is_ok());
    }

    #[test]
    fn contact_without_owner_is_rejected() {
        assert!(Contact::named("Ana").validate().is_err());
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(owned(Contact::named(" ")).validate().is_err());
    }

    #[test]
    fn optional_email_is_checked() {
        let contact = owned(Contact {
            email: Some("nope".to_string()),
            ..Contact::named("Ana")
        });
        assert!(contact.validate().is_err());
    }

    #[test]
    fn phone_formats() {
        let ok = owned(Contact {
            phone: Some("+55 (11) 3333-4444".to_string()),
            ..Contact::named("Ana")
        });
        assert!(ok.validate().is_ok());

        let bad = owned(Contact {
            cellphone: Some("call me".to_string()),
            ..Contact::named("Ana")
        });
        assert!(bad.validate().is_err());
    }
}
