use serde::{Deserialize, Serialize};

/// Lifecycle status shared by every versioned entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entity_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    #[default]
    Enabled,
    Disabled,
}

impl EntityStatus {
    pub fn is_enabled(&self) -> bool {
        matches!(self, EntityStatus::Enabled)
    }
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityStatus::Enabled => write!(f, "enabled"),
            EntityStatus::Disabled => write!(f, "disabled"),
        }
    }
}
