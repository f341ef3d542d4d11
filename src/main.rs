//! login-auth-api - credential login with stateless bearer tokens

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use login_auth_api::{
    config::Args,
    logging,
    server,
    store::{MemoryUserStore, MongoUserStore, UserStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init_tracing(&args);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  login-auth-api");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("User store: {}", args.store_backend());
    info!("CORS origin: {}", args.cors_origin);
    info!("======================================");

    let users: Arc<dyn UserStore> = match &args.mongodb_uri {
        Some(uri) => match MongoUserStore::connect(uri, &args.mongodb_db).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        },
        None => Arc::new(MemoryUserStore::new()),
    };

    let state = match server::AppState::new(&args, users) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
