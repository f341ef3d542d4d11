//! Per-request authentication gate
//!
//! Runs once for every inbound request. Reads the `Authorization` header,
//! verifies the bearer token, resolves the subject through the user store and
//! hands back an explicit `AuthStatus` that the caller threads through the
//! rest of the request. Nothing is stored anywhere else; the gate never
//! rejects a request itself; access policy lives in `auth::permissions`.
//!
//! Status transitions for one request:
//!
//! ```text
//! header absent                      -> NoToken
//! header present -> verify -> none   -> Rejected
//!                           -> subject -> lookup -> Bound(identity)
//!                                                -> Err (fault)
//! ```

use hyper::header::AUTHORIZATION;
use hyper::HeaderMap;
use std::sync::Arc;
use tracing::{debug, error};

use crate::auth::jwt::TokenService;
use crate::auth::permissions::{Capability, AUTHENTICATED_CAPABILITIES};
use crate::store::{Identity, UserStore};
use crate::types::{GatewayError, Result};

/// Literal prefix stripped from the `Authorization` header
pub const BEARER_PREFIX: &str = "Bearer ";

/// Request-scoped record of who a request belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub identity: Identity,
    pub capabilities: &'static [Capability],
}

impl AuthContext {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            capabilities: AUTHENTICATED_CAPABILITIES,
        }
    }

    pub fn email(&self) -> &str {
        &self.identity.email
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Outcome of the gate for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// No `Authorization` header
    NoToken,
    /// A header was present but did not yield a verified subject
    Rejected,
    /// Verified and resolved
    Bound(AuthContext),
}

impl AuthStatus {
    pub fn context(&self) -> Option<&AuthContext> {
        match self {
            AuthStatus::Bound(ctx) => Some(ctx),
            _ => None,
        }
    }

    pub fn into_context(self) -> Option<AuthContext> {
        match self {
            AuthStatus::Bound(ctx) => Some(ctx),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Bound(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuthStatus::NoToken => "no-token",
            AuthStatus::Rejected => "rejected",
            AuthStatus::Bound(_) => "bound",
        }
    }
}

/// Extract the candidate token from an `Authorization` header value.
///
/// Strips exactly the literal `"Bearer "` prefix; no trimming, no case folding.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    auth_header?.strip_prefix(BEARER_PREFIX)
}

/// The authentication gate
#[derive(Clone)]
pub struct AuthGate {
    tokens: TokenService,
    users: Arc<dyn UserStore>,
}

impl AuthGate {
    pub fn new(tokens: TokenService, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }

    /// Authenticate a request from its headers
    ///
    /// Returns `Err` only for faults: a store failure, or a validly signed
    /// token whose subject no longer exists.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthStatus> {
        let Some(raw) = headers.get(AUTHORIZATION) else {
            return Ok(AuthStatus::NoToken);
        };

        let header = match raw.to_str() {
            Ok(h) => h,
            Err(_) => {
                debug!("Authorization header is not valid ASCII");
                return Ok(AuthStatus::Rejected);
            }
        };

        self.authenticate_header(Some(header)).await
    }

    /// Authenticate from an optional raw header value
    pub async fn authenticate_header(&self, auth_header: Option<&str>) -> Result<AuthStatus> {
        if auth_header.is_none() {
            return Ok(AuthStatus::NoToken);
        }

        let Some(token) = extract_token_from_header(auth_header) else {
            debug!("Authorization header is not a bearer token");
            return Ok(AuthStatus::Rejected);
        };

        let Some(subject) = self.tokens.verify(token) else {
            return Ok(AuthStatus::Rejected);
        };

        match self.users.find_by_email(&subject).await? {
            Some(identity) => {
                debug!("Authenticated request for {}", identity.email);
                Ok(AuthStatus::Bound(AuthContext::new(identity)))
            }
            None => {
                error!("Valid token for unknown identity {}", subject);
                Err(GatewayError::Internal(format!(
                    "token subject {} no longer resolvable",
                    subject
                )))
            }
        }
    }
}
