//! Authentication and authorization
//!
//! Provides:
//! - JWT token issuance and verification
//! - The per-request authentication gate
//! - The fixed capability set and route access policy
//! - Password hashing with Argon2
//! - Login and registration

pub mod flow;
pub mod gate;
pub mod jwt;
pub mod password;
pub mod permissions;

pub use flow::{AuthFlow, AuthResponse};
pub use gate::{extract_token_from_header, AuthContext, AuthGate, AuthStatus};
pub use jwt::{Claims, TokenService, ISSUER};
pub use password::{hash_password, verify_password, Argon2Verifier, CredentialVerifier};
pub use permissions::{is_request_allowed, required_access, Access, Capability};
