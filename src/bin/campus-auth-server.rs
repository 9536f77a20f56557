// ABOUTME: Server binary connecting uOttawa students to Brightspace via OAuth2
// ABOUTME: Production entry point wiring config, database, session manager and HTTP serving
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Campus Auth Server Binary
//!
//! Starts the authentication backend: Brightspace OAuth2 login, stateless
//! JWT sessions, and the SQLite-backed user directory.

use anyhow::Result;
use campus_auth_server::{
    auth::{self, AuthManager},
    config::environment::{DatabaseUrl, ServerConfig},
    database::Database,
    logging,
    server::{AuthServer, ServerResources},
};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "campus-auth-server")]
#[command(about = "Campus Auth Server - Brightspace OAuth2 login and JWT sessions")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL (sqlite: path or sqlite::memory:)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle container environments where clap may not work properly
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Argument parsing failed: {e}");
            eprintln!("Using configuration from environment");
            Args {
                http_port: None,
                database_url: None,
            }
        }
    };

    // Load configuration from environment
    let mut config = ServerConfig::from_env()?;

    // Apply CLI overrides
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = DatabaseUrl::parse_url(&database_url)?;
    }

    // Initialize production logging
    logging::init_from_env()?;

    info!("Starting Campus Auth Server");
    info!("{}", config.summary());

    // Resolve the JWT signing secret: provided via environment, or generated
    // fresh for this process
    let jwt_secret = match config.auth.jwt_secret.as_deref() {
        Some(secret) => secret.as_bytes().to_vec(),
        None => {
            warn!("JWT_SECRET not set; generated a random secret, sessions will not survive a restart");
            auth::generate_jwt_secret()?.to_vec()
        }
    };

    // Create parent directory for file-backed SQLite if it doesn't exist
    if let DatabaseUrl::SQLite { path } = &config.database.url {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    // Initialize database
    let database = Database::new(&config.database.url.to_connection_string()).await?;
    info!("Database connected: {}", config.database.url);

    if config.database.auto_migrate {
        database.migrate().await?;
        info!("Database schema is up to date");
    }

    // Initialize authentication manager
    let auth_manager = {
        // Safe: JWT expiry hours are small positive configuration values (1-168)
        #[allow(clippy::cast_possible_wrap)]
        {
            AuthManager::new(jwt_secret, config.auth.jwt_expiry_hours as i64)
        }
    };
    info!("Authentication manager initialized");

    // Create server resources and server
    let config = Arc::new(config);
    let resources = Arc::new(ServerResources::new(
        database,
        auth_manager,
        config.clone(),
    )?);
    let server = AuthServer::new(resources);

    display_available_endpoints(&config);

    info!("Ready to authenticate users");

    if let Err(e) = server.run().await {
        error!("Server error: {e}");
        return Err(e);
    }

    Ok(())
}

/// Display all available API endpoints with their ports
fn display_available_endpoints(config: &ServerConfig) {
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());

    info!("=== Available API Endpoints ===");
    display_auth_endpoints(&host, config.http_port);
    display_monitoring_endpoints(&host, config.http_port);
    info!("=== End of Endpoint List ===");
}

#[allow(clippy::cognitive_complexity)]
fn display_auth_endpoints(host: &str, port: u16) {
    info!("Authentication:");
    info!("   Begin Login:       GET  http://{host}:{port}/api/auth/login");
    info!("   OAuth Callback:    GET  http://{host}:{port}/api/auth/callback");
    info!("   Refresh Session:   POST http://{host}:{port}/api/auth/token/refresh");
    info!("   Current User:      GET  http://{host}:{port}/api/auth/me");
    info!("   Session Status:    GET  http://{host}:{port}/api/auth/status");
    info!("   Logout:            POST http://{host}:{port}/api/auth/logout");
}

fn display_monitoring_endpoints(host: &str, port: u16) {
    info!("Monitoring:");
    info!("   Health Check:      GET  http://{host}:{port}/api/health");
}
