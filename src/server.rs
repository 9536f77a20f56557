// ABOUTME: HTTP server assembly and the shared resource container
// ABOUTME: ServerResources dependency injection plus router construction and serving
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campus Assistant Contributors

//! HTTP server assembly
//!
//! [`ServerResources`] is the dependency-injection container shared by every
//! route handler; [`AuthServer`] assembles the router, applies CORS and
//! request tracing, and serves it.

use crate::auth::AuthManager;
use crate::config::environment::ServerConfig;
use crate::database::Database;
use crate::middleware::setup_cors;
use crate::oauth::{BrightspaceOAuthClient, OAuthManager};
use crate::routes::{AuthRoutes, HealthRoutes};
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Centralized resource container for dependency injection
///
/// Holds all shared server state behind `Arc`s so every handler observes
/// the same database pool, session manager, and OAuth flow state. Nothing
/// in the crate reaches for globals; everything is constructed here and
/// passed down.
#[derive(Clone)]
pub struct ServerResources {
    /// User and provider-token persistence
    pub database: Arc<Database>,
    /// Session token signing and verification
    pub auth_manager: Arc<AuthManager>,
    /// Brightspace OAuth flow orchestration
    pub oauth_manager: Arc<OAuthManager>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Create new server resources with proper Arc sharing
    ///
    /// The Brightspace HTTP client and the OAuth manager are built here so
    /// there is exactly one of each per process.
    ///
    /// # Errors
    ///
    /// Returns an error when the Brightspace HTTP client cannot be
    /// constructed.
    pub fn new(
        database: Database,
        auth_manager: AuthManager,
        config: Arc<ServerConfig>,
    ) -> Result<Self> {
        let database = Arc::new(database);

        let client = BrightspaceOAuthClient::new(
            config.oauth.brightspace.clone(),
            config.brightspace_api.clone(),
        )?;
        let oauth_manager = Arc::new(OAuthManager::new(database.clone(), client));

        Ok(Self {
            database,
            auth_manager: Arc::new(auth_manager),
            oauth_manager,
            config,
        })
    }
}

/// The campus auth HTTP server
pub struct AuthServer {
    resources: Arc<ServerResources>,
}

impl AuthServer {
    /// Create a new server around shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Assemble the full application router
    ///
    /// Route sets merge per domain; CORS and request tracing wrap the
    /// whole surface.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .merge(AuthRoutes::routes(self.resources.clone()))
            .merge(HealthRoutes::routes())
            .layer(setup_cors(&self.resources.config))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured port and serve until the process stops
    ///
    /// # Errors
    ///
    /// Returns an error when the port cannot be bound or the server loop
    /// fails.
    pub async fn run(&self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.resources.config.http_port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("HTTP server listening on http://{addr}");

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}
