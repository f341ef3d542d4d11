//! Token issuance and verification
//!
//! Tokens are compact JWTs signed with HS256 (HMAC-SHA256) using the single
//! process-wide secret. They carry exactly three claims: issuer, subject
//! (the identity key) and expiry.
//!
//! Issuing can fail (a broken precondition, reported as `TokenCreation`).
//! Verifying cannot: any bad token, whatever the reason, yields `None`.

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::Identity;
use crate::types::{GatewayError, Result};

/// Issuer claim written into and required from every token
pub const ISSUER: &str = "login-auth-api";

/// Token lifetime
pub const TOKEN_LIFETIME_HOURS: i64 = 2;

/// Expiry is computed on a UTC-3 wall clock, whatever the host timezone.
const EXPIRY_UTC_OFFSET_WEST_SECONDS: i32 = 3 * 3600;

/// Secrets shorter than this are accepted but logged
pub const RECOMMENDED_SECRET_LEN: usize = 32;

/// Payload stored in the token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject: identity key (email)
    pub sub: String,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
}

/// Issues and verifies bearer tokens
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a token service from the server secret
    ///
    /// Returns an error if the secret is empty.
    pub fn new(secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(GatewayError::Config("JWT secret must not be empty".into()));
        }

        if secret.len() < RECOMMENDED_SECRET_LEN {
            warn!(
                "JWT secret is shorter than {} bytes; use a strong random value in production",
                RECOMMENDED_SECRET_LEN
            );
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        // Expiry is compared in verify_at against the caller's clock, strictly.
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Issue a token for an identity, expiring two hours from now
    pub fn issue(&self, identity: &Identity) -> Result<String> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String> {
        if identity.email.is_empty() {
            return Err(GatewayError::TokenCreation(
                "cannot issue a token for an empty identity key".into(),
            ));
        }

        let expires_at = expiration_from(now).ok_or_else(|| {
            GatewayError::TokenCreation("token expiry is out of range".into())
        })?;

        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: identity.email.clone(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| GatewayError::TokenCreation(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token and return its subject, or `None` if it is not valid now
    pub fn verify(&self, token: &str) -> Option<String> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against the clock reading `now`
    ///
    /// The signature, issuer and claim structure must check out and the
    /// expiry must lie strictly after `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Option<String> {
        let claims = match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(err) => {
                use jsonwebtoken::errors::ErrorKind;
                let reason = match err.kind() {
                    ErrorKind::InvalidSignature => "invalid signature",
                    ErrorKind::InvalidIssuer => "wrong issuer",
                    ErrorKind::MissingRequiredClaim(_) => "missing claim",
                    ErrorKind::InvalidAlgorithm => "unexpected algorithm",
                    _ => "malformed token",
                };
                debug!("Token rejected: {}", reason);
                return None;
            }
        };

        if claims.exp <= now.timestamp() {
            debug!("Token rejected: expired");
            return None;
        }

        Some(claims.sub)
    }
}

/// Expiry instant for a token issued at `now`: two hours later on a UTC-3 wall clock
pub fn expiration_from(now: DateTime<Utc>) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::west_opt(EXPIRY_UTC_OFFSET_WEST_SECONDS)?;
    now.with_timezone(&offset)
        .checked_add_signed(TimeDelta::try_hours(TOKEN_LIFETIME_HOURS)?)
}
