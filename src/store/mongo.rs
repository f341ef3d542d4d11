//! MongoDB-backed user store
//!
//! Pattern follows the doorway db layer: connect with short server-selection
//! timeouts, ping, then make sure the unique index on the key exists.

use async_trait::async_trait;
use bson::doc;
use mongodb::{options::IndexOptions, Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Identity, UserStore};
use crate::types::{GatewayError, Result};

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<bson::oid::ObjectId>,
    /// Unique identity key
    pub email: String,
    pub name: String,
    /// Argon2 password hash
    pub password_hash: String,
    pub created_at: bson::DateTime,
}

impl From<Identity> for UserDoc {
    fn from(identity: Identity) -> Self {
        Self {
            _id: None,
            email: identity.email,
            name: identity.name,
            password_hash: identity.password_hash,
            created_at: bson::DateTime::now(),
        }
    }
}

impl From<UserDoc> for Identity {
    fn from(doc: UserDoc) -> Self {
        Identity {
            email: doc.email,
            name: doc.name,
            password_hash: doc.password_hash,
        }
    }
}

#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<UserDoc>,
}

impl MongoUserStore {
    /// Connect, verify the connection and ensure indexes
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| GatewayError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| GatewayError::Database(format!("MongoDB ping failed: {}", e)))?;

        let users = db.collection::<UserDoc>(USER_COLLECTION);
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();
        users
            .create_index(index)
            .await
            .map_err(|e| GatewayError::Database(format!("Failed to create indexes: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self { users })
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let found = self.users.find_one(doc! { "email": email }).await?;
        Ok(found.map(Identity::from))
    }

    async fn save(&self, identity: Identity) -> Result<()> {
        let email = identity.email.clone();
        match self.users.insert_one(UserDoc::from(identity)).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(GatewayError::Conflict(email)),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    let msg = err.to_string();
    msg.contains("E11000") || msg.contains("duplicate key")
}
