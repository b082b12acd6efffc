// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route Prefix: /api/*
// Middleware: JWT validation -> user validation (injects ValidatedUser + DbPool) -> role guard
//
// Owner handlers scope every call by the validated user's id; ownership of the
// target record is checked inside the services.

pub mod auth;
pub mod emergency_contacts;
pub mod invitations;
pub mod leases;
pub mod payments;
pub mod portal;
pub mod properties;
pub mod tenants;
pub mod units;
