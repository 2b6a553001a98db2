//! Storefront Back-Office Library
//!
//! Aggregate consistency core for the store back office: the user
//! onboarding saga and the optimistic versioning protocol for users,
//! addresses and contacts, with PostgreSQL and in-memory adapters.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
