// HTTP handlers
// Thin adapters from JSON requests onto repositories and services

pub mod addresses;
pub mod contacts;
pub mod health;
pub mod users;
