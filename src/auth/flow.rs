//! Login and registration
//!
//! Orchestrates the user store, the credential verifier and the token
//! service to hand a client its bearer token.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::jwt::TokenService;
use crate::auth::password::CredentialVerifier;
use crate::store::{Identity, UserStore};
use crate::types::{GatewayError, Result};

/// Successful login/registration payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthResponse {
    pub name: String,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthFlow {
    users: Arc<dyn UserStore>,
    verifier: Arc<dyn CredentialVerifier>,
    tokens: TokenService,
}

impl AuthFlow {
    pub fn new(
        users: Arc<dyn UserStore>,
        verifier: Arc<dyn CredentialVerifier>,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            verifier,
            tokens,
        }
    }

    /// Authenticate with email and password
    ///
    /// Fails with `NotFound` for an unknown key and `BadCredentials` for a
    /// wrong password. No token is issued on failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("User not found: {}", email)))?;

        if !self.verifier.verify(password, &user.password_hash)? {
            info!("Login failed - invalid password: {}", email);
            return Err(GatewayError::BadCredentials);
        }

        let token = self.tokens.issue(&user)?;
        info!("Login successful: {}", email);

        Ok(AuthResponse {
            name: user.name,
            token,
        })
    }

    /// Create an identity and log it in
    ///
    /// Fails with `BadRequest` if any field is empty and with `Conflict` if
    /// the key is already registered.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthResponse> {
        if email.is_empty() || password.is_empty() || name.is_empty() {
            return Err(GatewayError::BadRequest(
                "Missing required fields: name, email, password".into(),
            ));
        }

        if self.users.find_by_email(email).await?.is_some() {
            info!("Registration refused - already exists: {}", email);
            return Err(GatewayError::Conflict(email.to_string()));
        }

        let password_hash = self.verifier.hash(password)?;
        let user = Identity::new(email, name, password_hash);

        // The store has the final word on uniqueness
        self.users.save(user.clone()).await?;

        let token = self.tokens.issue(&user)?;
        info!("Registered new user: {}", email);

        Ok(AuthResponse {
            name: user.name,
            token,
        })
    }
}
