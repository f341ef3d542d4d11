//! Configuration for the login gateway
//!
//! CLI arguments and environment variable handling using clap.
//! A `.env` file is loaded by `main` before parsing.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;

use crate::types::GatewayError;

/// Secret used when `--dev-mode` is on and no secret is configured
const DEV_SECRET: &str = "dev-only-insecure-secret-not-for-production";

/// Credential login gateway issuing signed bearer tokens
#[derive(Parser, Debug, Clone)]
#[command(name = "login-auth-api")]
#[command(about = "Credential login gateway with stateless bearer token authentication")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (built-in secret when JWT_SECRET is unset)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Secret for token signing (required outside dev mode)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// MongoDB connection URI; users are kept in memory when unset
    #[arg(long, env = "MONGODB_URI")]
    pub mongodb_uri: Option<String>,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "login_auth")]
    pub mongodb_db: String,

    /// Browser origin allowed by CORS
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:4200")]
    pub cors_origin: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Args {
    /// Get the effective secret (falls back to a fixed one in dev mode)
    pub fn jwt_secret(&self) -> Result<String, GatewayError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => Ok(secret.clone()),
            (None, true) => Ok(DEV_SECRET.to_string()),
            (None, false) => Err(GatewayError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        match self.jwt_secret() {
            Ok(secret) if secret.is_empty() => {
                return Err("JWT_SECRET must not be empty".to_string());
            }
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }

        if self.cors_origin.is_empty() {
            return Err("CORS_ORIGIN must not be empty".to_string());
        }

        Ok(())
    }

    /// Human-readable name of the configured user store
    pub fn store_backend(&self) -> &'static str {
        if self.mongodb_uri.is_some() {
            "mongodb"
        } else {
            "memory"
        }
    }
}
