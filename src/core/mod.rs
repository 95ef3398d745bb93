//! Core business logic - framework-agnostic catalog, role and account operations.

/// Account registration, password checks and sign-in sessions
pub mod accounts;
/// Product catalog operations
pub mod product;
/// The fixed authorization roles and role membership
pub mod roles;
/// Idempotent startup seeding of roles and the bootstrap administrator
pub mod seeding;
