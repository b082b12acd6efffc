// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, invitation redemption and service status.
// No user context exists here, so every input is validated before any query runs.

pub mod auth;
pub mod invitations;
pub mod system;

pub use auth::{login as auth_login, register as auth_register};
pub use invitations::{accept as invitation_accept, validate as invitation_validate};
pub use system::{health, root};
