// Authentication helpers
// Password hashing consumed by the onboarding service

pub mod password;
