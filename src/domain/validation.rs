use crate::domain::errors::StoreError;

/// Business-rule check run before an entity is written
pub trait Validate {
    fn validate(&self) -> Result<(), StoreError>;
}

pub(crate) fn require_text(entity: &'static str, field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::invalid(entity, format!("{} must not be empty", field)));
    }
    Ok(())
}

pub(crate) fn require_max_len(
    entity: &'static str,
    field: &str,
    value: &str,
    max: usize,
) -> Result<(), StoreError> {
    if value.chars().count() > max {
        return Err(StoreError::invalid(
            entity,
            format!("{} must be at most {} characters", field, max),
        ));
    }
    Ok(())
}

pub(crate) fn require_id(entity: &'static str, id: i64) -> Result<(), StoreError> {
    if id == 0 {
        return Err(StoreError::ZeroId(entity));
    }
    if id < 0 {
        return Err(StoreError::invalid(entity, format!("id {} must be positive", id)));
    }
    Ok(())
}
