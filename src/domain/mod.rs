// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod address;
pub mod category;
pub mod contact;
pub mod errors;
pub mod owner;
pub mod repositories;
pub mod services;
pub mod status;
pub mod user;
pub mod user_full;
pub mod validation;
pub mod versioning;
