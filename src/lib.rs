//! login-auth-api - credential login with stateless bearer tokens
//!
//! Issues a signed, two-hour token on login or registration, then checks that
//! token on every request and binds the caller's identity to the request
//! before any handler runs.
//!
//! ## Pieces
//!
//! - **Token service**: HS256 JWT issuance and verification
//! - **Authentication gate**: `Authorization: Bearer` extraction, verification, identity lookup
//! - **Access policy**: login and register are public, everything else needs an identity
//! - **User store**: in-memory or MongoDB

pub mod auth;
pub mod config;
pub mod logging;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GatewayError, Result};
