//! User storage
//!
//! The gateway only ever needs two capabilities from persistence: look an
//! identity up by its key (email) and save a new one. Uniqueness of the key
//! is the store's job, not the caller's.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Result;

pub use memory::MemoryUserStore;
pub use mongo::MongoUserStore;

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique identity key
    pub email: String,
    /// Display name returned on login
    pub name: String,
    /// One-way credential hash (PHC string)
    pub password_hash: String,
}

impl Identity {
    pub fn new(email: impl Into<String>, name: impl Into<String>, password_hash: String) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            password_hash,
        }
    }
}

/// Lookup and persistence of identities
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find an identity by its key
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;

    /// Persist a new identity.
    ///
    /// Fails with `GatewayError::Conflict` if the key is already taken.
    async fn save(&self, identity: Identity) -> Result<()>;
}
