// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth)        -> /, /health, /auth/*, /invitations/:code
// Protected (JWT + user)  -> /api/*, with an owner or tenant role guard per route group
//
// Handlers stay thin: decode the request, run cheap input validation before
// touching the database, call one service, wrap the result in the envelope.

pub mod extract;
pub mod protected;
pub mod public;

pub use extract::{ApiJson, ApiPath, ApiQuery};
