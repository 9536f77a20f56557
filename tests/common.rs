// ABOUTME: Shared fixtures for the integration tests
// ABOUTME: In-memory database, session manager and server resource constructors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campus Assistant Contributors
#![allow(
    dead_code,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared fixtures for `campus_auth_server` integration tests: one place to
//! build databases, session managers and fully wired server resources.

use anyhow::Result;
use campus_auth_server::{
    auth::{generate_jwt_secret, AuthManager},
    config::environment::{
        AppUrls, AuthConfig, BrightspaceApiConfig, DatabaseConfig, DatabaseUrl, Environment,
        LogLevel, OAuthConfig, OAuthProviderConfig, ServerConfig,
    },
    database::Database,
    models::User,
    oauth::TokenData,
    server::ServerResources,
};
use chrono::{Duration, Utc};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// Install a quiet subscriber once per test process; `TEST_LOG` raises the level
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test database setup: in-memory SQLite with migrations applied
pub async fn create_test_database() -> Result<Arc<Database>> {
    init_test_logging();
    let database = Database::new("sqlite::memory:").await?;
    database.migrate().await?;
    Ok(Arc::new(database))
}

/// Create a test authentication manager with a fresh random secret
pub fn create_test_auth_manager() -> AuthManager {
    let jwt_secret = generate_jwt_secret().expect("Failed to generate JWT secret");
    AuthManager::new(jwt_secret.to_vec(), 24)
}

/// Server configuration pointing the Brightspace endpoints at `provider_base`,
/// normally the URI of a `wiremock` server
pub fn test_server_config(provider_base: &str) -> ServerConfig {
    ServerConfig {
        http_port: 8081,
        log_level: LogLevel::Info,
        environment: Environment::Testing,
        database: DatabaseConfig {
            url: DatabaseUrl::Memory,
            auto_migrate: true,
        },
        auth: AuthConfig {
            jwt_secret: None,
            jwt_expiry_hours: 24,
        },
        oauth: OAuthConfig {
            brightspace: OAuthProviderConfig {
                client_id: Some("test-client-id".into()),
                client_secret: Some("test-client-secret".into()),
                redirect_uri: Some("http://localhost:8081/api/auth/callback".into()),
                scopes: vec!["core:*:*".into()],
                enabled: true,
            },
        },
        brightspace_api: BrightspaceApiConfig {
            base_url: format!("{provider_base}/d2l/api"),
            api_version: "1.0".into(),
            auth_url: format!("{provider_base}/d2l/oauth2/auth"),
            token_url: format!("{provider_base}/d2l/api/oauth2/token"),
        },
        urls: AppUrls {
            frontend_url: "http://localhost:3000".into(),
            api_url: "http://localhost:8081".into(),
        },
        cors_origins: vec!["*".into()],
    }
}

/// Full server resources built around a caller-provided JWT secret, so the
/// test can mint its own session tokens against the same key
pub async fn create_test_resources_with_secret(
    provider_base: &str,
    jwt_secret: Vec<u8>,
) -> Result<Arc<ServerResources>> {
    let database = create_test_database().await?;
    let auth_manager = AuthManager::new(jwt_secret, 24);
    let config = Arc::new(test_server_config(provider_base));

    Ok(Arc::new(ServerResources::new(
        (*database).clone(),
        auth_manager,
        config,
    )?))
}

/// Full server resources with a random JWT secret
pub async fn create_test_resources(provider_base: &str) -> Result<Arc<ServerResources>> {
    let jwt_secret = generate_jwt_secret()?;
    create_test_resources_with_secret(provider_base, jwt_secret.to_vec()).await
}

/// Create a standard test user
pub fn create_test_user() -> User {
    User::new(
        "student@uottawa.ca".into(),
        Some("Test Student".into()),
        Some("12345".into()),
    )
}

/// A usable provider token pair as it would come back from a code exchange
pub fn test_token_data() -> TokenData {
    TokenData {
        access_token: "access-token-1".into(),
        refresh_token: Some("refresh-token-1".into()),
        expires_at: Some(Utc::now() + Duration::hours(1)),
        scope: Some("core:*:*".into()),
        token_type: "Bearer".into(),
    }
}
