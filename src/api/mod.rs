// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::domain::repositories::Transaction;
use handlers::{addresses, contacts, health, users};

pub use state::AppState;

/// Builds the back-office router over any repository backend
pub fn router<Tx: Transaction>(state: AppState<Tx>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // User routes
        .route("/api/users/full", post(users::create_full::<Tx>))
        .route(
            "/api/users/:id",
            get(users::get_user::<Tx>).put(users::update_user::<Tx>),
        )
        .route("/api/users/:id/disable", patch(users::disable_user::<Tx>))
        .route("/api/users/:id/enable", patch(users::enable_user::<Tx>))
        // Address routes
        .route(
            "/api/addresses/:id",
            get(addresses::get_address::<Tx>).put(addresses::update_address::<Tx>),
        )
        .route(
            "/api/addresses/:id/disable",
            patch(addresses::disable_address::<Tx>),
        )
        .route(
            "/api/addresses/:id/enable",
            patch(addresses::enable_address::<Tx>),
        )
        // Contact routes
        .route(
            "/api/contacts/:id",
            get(contacts::get_contact::<Tx>).put(contacts::update_contact::<Tx>),
        )
        .route(
            "/api/contacts/:id/disable",
            patch(contacts::disable_contact::<Tx>),
        )
        .route(
            "/api/contacts/:id/enable",
            patch(contacts::enable_contact::<Tx>),
        )
        .with_state(state)
}
