use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::contact::Contact;
use crate::domain::errors::StoreError;
use crate::domain::owner::OwnerRef;
use crate::domain::repositories::Transaction;
use crate::domain::versioning::StatusChange;

/// Request body for updating a contact
///
/// A missing `owner` keeps the current one.
#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    #[serde(default)]
    pub owner: Option<OwnerRef>,
    pub contact_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub cellphone: Option<String>,
    pub version: i64,
}

/// GET /api/contacts/:id
pub async fn get_contact<Tx: Transaction>(
    State(state): State<AppState<Tx>>,
    Path(id): Path<i64>,
) -> Result<Json<Contact>, ApiError> {
    let contact = state
        .repos
        .contacts
        .find_by_id(id)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "contact",
            id,
        })?;

    Ok(Json(contact))
}

/// PUT /api/contacts/:id
pub async fn update_contact<Tx: Transaction>(
    State(state): State<AppState<Tx>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateContactRequest>,
) -> Result<Json<Contact>, ApiError> {
    let current = state
        .repos
        .contacts
        .find_by_id(id)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "contact",
            id,
        })?;

    let contact = Contact {
        owner: req.owner.or(current.owner),
        contact_name: req.contact_name,
        email: req.email,
        phone: req.phone,
        cellphone: req.cellphone,
        version: req.version,
        ..current
    };

    Ok(Json(state.repos.contacts.update(&contact).await?))
}

/// PATCH /api/contacts/:id/disable
pub async fn disable_contact<Tx: Transaction>(
    State(state): State<AppState<Tx>>,
    Path(id): Path<i64>,
) -> Result<Json<StatusChange>, ApiError> {
    Ok(Json(state.repos.contacts.disable(id).await?))
}

/// PATCH /api/contacts/:id/enable
pub async fn enable_contact<Tx: Transaction>(
    State(state): State<AppState<Tx>>,
    Path(id): Path<i64>,
) -> Result<Json<StatusChange>, ApiError> {
    Ok(Json(state.repos.contacts.enable(id).await?))
}
