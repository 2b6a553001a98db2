// Domain services
// Orchestration that spans more than one repository

pub mod onboarding;
pub mod password_hasher;

pub use onboarding::OnboardingService;
pub use password_hasher::PasswordHasher;
