//! In-memory user store
//!
//! Used when no MongoDB URI is configured and by the test suite.
//! Contents are lost on restart.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{Identity, UserStore};
use crate::types::{GatewayError, Result};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<String, Identity>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove an identity (tokens issued for it stop resolving)
    pub fn remove(&self, email: &str) -> Option<Identity> {
        self.users.remove(email).map(|(_, identity)| identity)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        Ok(self.users.get(email).map(|entry| entry.value().clone()))
    }

    async fn save(&self, identity: Identity) -> Result<()> {
        match self.users.entry(identity.email.clone()) {
            Entry::Occupied(_) => Err(GatewayError::Conflict(identity.email)),
            Entry::Vacant(slot) => {
                slot.insert(identity);
                Ok(())
            }
        }
    }
}
