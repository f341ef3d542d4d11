//! Capabilities and route access policy
//!
//! There is no role system: every authenticated identity holds the same
//! single capability. Routes are either public (login, register) or require
//! an authenticated context.

use hyper::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability granted to an authenticated request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "ROLE_USER")]
    User,
}

/// The fixed capability set bound to every authenticated context
pub const AUTHENTICATED_CAPABILITIES: &[Capability] = &[Capability::User];

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::User => "ROLE_USER",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a route demands of the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
}

/// Access required for a method and path
pub fn required_access(method: &Method, path: &str) -> Access {
    match (method, path) {
        (&Method::POST, "/auth/login") | (&Method::POST, "/auth/register") => Access::Public,
        _ => Access::Authenticated,
    }
}

/// Check whether a request may reach its handler
pub fn is_request_allowed(access: Access, authenticated: bool) -> bool {
    match access {
        Access::Public => true,
        Access::Authenticated => authenticated,
    }
}
