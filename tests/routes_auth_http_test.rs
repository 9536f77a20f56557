// ABOUTME: HTTP integration tests for authentication routes
// ABOUTME: Covers session introspection, refresh, status, and logout endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campus Assistant Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use campus_auth_server::auth::{generate_jwt_secret, AuthManager};
use campus_auth_server::models::User;
use campus_auth_server::oauth::TokenData;
use campus_auth_server::routes::AuthRoutes;
use campus_auth_server::server::ServerResources;
use chrono::{Duration, Utc};
use helpers::axum_test::AxumTestRequest;
use std::sync::Arc;

/// Test setup helper for authentication route testing
struct AuthTestSetup {
    resources: Arc<ServerResources>,
    jwt_secret: Vec<u8>,
}

impl AuthTestSetup {
    async fn new() -> anyhow::Result<Self> {
        let jwt_secret = generate_jwt_secret()?.to_vec();
        let resources =
            common::create_test_resources_with_secret("http://localhost:9", jwt_secret.clone())
                .await?;
        Ok(Self {
            resources,
            jwt_secret,
        })
    }

    fn routes(&self) -> axum::Router {
        AuthRoutes::routes(self.resources.clone())
    }

    /// Store a logged-in user and mint a live session token for them
    async fn login_user(&self) -> anyhow::Result<(User, String)> {
        self.login_user_with_token(&common::test_token_data()).await
    }

    async fn login_user_with_token(&self, token: &TokenData) -> anyhow::Result<(User, String)> {
        let user = self
            .resources
            .database
            .record_oauth_login(&common::create_test_user(), token)
            .await?;
        let session = self.resources.auth_manager.generate_token(&user)?;
        Ok((user, session))
    }

    /// A session token for `user` that expired an hour ago
    fn expired_session_for(&self, user: &User) -> String {
        AuthManager::new(self.jwt_secret.clone(), -1)
            .generate_token(user)
            .expect("token generation")
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

// ============================================================================
// GET /api/auth/login
// ============================================================================

#[tokio::test]
async fn test_login_without_provider_configuration_is_a_server_error() {
    let mut config = common::test_server_config("http://localhost:9");
    config.oauth.brightspace.client_id = None;

    let database = common::create_test_database().await.expect("setup failed");
    let resources = Arc::new(
        ServerResources::new(
            (*database).clone(),
            common::create_test_auth_manager(),
            Arc::new(config),
        )
        .expect("resources"),
    );

    let response = AxumTestRequest::get("/api/auth/login")
        .send(AuthRoutes::routes(resources))
        .await;

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "CONFIG_ERROR");
}

// ============================================================================
// GET /api/auth/me
// ============================================================================

#[tokio::test]
async fn test_me_requires_a_bearer_token() {
    let setup = AuthTestSetup::new().await.expect("setup failed");

    let response = AxumTestRequest::get("/api/auth/me")
        .send(setup.routes())
        .await;
    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

    let response = AxumTestRequest::get("/api/auth/me")
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send(setup.routes())
        .await;
    assert_eq!(response.status(), 401);

    let response = AxumTestRequest::get("/api/auth/me")
        .header("Authorization", "Bearer not-a-session-token")
        .send(setup.routes())
        .await;
    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "SESSION_INVALID");
}

#[tokio::test]
async fn test_me_returns_the_user_profile() {
    let setup = AuthTestSetup::new().await.expect("setup failed");
    let (user, session) = setup.login_user().await.expect("login failed");

    let response = AxumTestRequest::get("/api/auth/me")
        .header("Authorization", &bearer(&session))
        .send(setup.routes())
        .await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"].as_str(), Some(user.id.to_string().as_str()));
    assert_eq!(body["email"], "student@uottawa.ca");
    assert_eq!(body["brightspace_user_id"], "12345");
    assert_eq!(body["is_verified"], true);
    // Provider credentials never appear in the profile payload
    assert!(body.get("access_token").is_none());
    assert!(body.get("refresh_token").is_none());
}

#[tokio::test]
async fn test_me_for_a_vanished_user_is_not_found() {
    let setup = AuthTestSetup::new().await.expect("setup failed");

    // A token signed by this server for an account that was never stored
    let ghost = common::create_test_user();
    let session = setup
        .resources
        .auth_manager
        .generate_token(&ghost)
        .unwrap();

    let response = AxumTestRequest::get("/api/auth/me")
        .header("Authorization", &bearer(&session))
        .send(setup.routes())
        .await;

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
}

#[tokio::test]
async fn test_me_rejects_expired_sessions() {
    let setup = AuthTestSetup::new().await.expect("setup failed");
    let (user, _) = setup.login_user().await.expect("login failed");
    let expired = setup.expired_session_for(&user);

    let response = AxumTestRequest::get("/api/auth/me")
        .header("Authorization", &bearer(&expired))
        .send(setup.routes())
        .await;

    assert_eq!(response.status(), 401);
}

// ============================================================================
// POST /api/auth/token/refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_requires_a_bearer_token() {
    let setup = AuthTestSetup::new().await.expect("setup failed");

    let response = AxumTestRequest::post("/api/auth/token/refresh")
        .send(setup.routes())
        .await;
    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_refresh_rotates_the_session() {
    let setup = AuthTestSetup::new().await.expect("setup failed");
    let (user, session) = setup.login_user().await.expect("login failed");

    let response = AxumTestRequest::post("/api/auth/token/refresh")
        .header("Authorization", &bearer(&session))
        .send(setup.routes())
        .await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(
        body["user"]["id"].as_str(),
        Some(user.id.to_string().as_str())
    );

    let new_session = body["access_token"].as_str().expect("access_token");
    let claims = setup
        .resources
        .auth_manager
        .validate_token(new_session)
        .unwrap();
    assert_eq!(claims.sub, user.id.to_string());
}

#[tokio::test]
async fn test_refresh_rejects_an_expired_session() {
    let setup = AuthTestSetup::new().await.expect("setup failed");
    let (user, _) = setup.login_user().await.expect("login failed");
    let expired = setup.expired_session_for(&user);

    // Authentic signature, expiry in the past: dead for every endpoint,
    // refresh included. Only a new login restores access.
    let response = AxumTestRequest::post("/api/auth/token/refresh")
        .header("Authorization", &bearer(&expired))
        .send(setup.routes())
        .await;

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "SESSION_INVALID");
}

#[tokio::test]
async fn test_refresh_for_a_vanished_user_is_not_found() {
    let setup = AuthTestSetup::new().await.expect("setup failed");

    let ghost = common::create_test_user();
    let session = setup
        .resources
        .auth_manager
        .generate_token(&ghost)
        .unwrap();

    let response = AxumTestRequest::post("/api/auth/token/refresh")
        .header("Authorization", &bearer(&session))
        .send(setup.routes())
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_refresh_rejects_foreign_signatures() {
    let setup = AuthTestSetup::new().await.expect("setup failed");
    let (user, _) = setup.login_user().await.expect("login failed");

    let foreign = common::create_test_auth_manager()
        .generate_token(&user)
        .unwrap();

    let response = AxumTestRequest::post("/api/auth/token/refresh")
        .header("Authorization", &bearer(&foreign))
        .send(setup.routes())
        .await;

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "SESSION_INVALID");
}

// ============================================================================
// GET /api/auth/status
// ============================================================================

#[tokio::test]
async fn test_status_without_a_session() {
    let setup = AuthTestSetup::new().await.expect("setup failed");

    let response = AxumTestRequest::get("/api/auth/status")
        .send(setup.routes())
        .await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["brightspace_connected"], false);
    assert!(body.get("user_id").is_none());
}

#[tokio::test]
async fn test_status_with_a_connected_account() {
    let setup = AuthTestSetup::new().await.expect("setup failed");
    let (user, session) = setup.login_user().await.expect("login failed");

    let response = AxumTestRequest::get("/api/auth/status")
        .header("Authorization", &bearer(&session))
        .send(setup.routes())
        .await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["brightspace_connected"], true);
    assert_eq!(body["user_id"].as_str(), Some(user.id.to_string().as_str()));
}

#[tokio::test]
async fn test_status_with_an_expired_session_reads_unauthenticated() {
    let setup = AuthTestSetup::new().await.expect("setup failed");
    let (user, _) = setup.login_user().await.expect("login failed");
    let expired = setup.expired_session_for(&user);

    let response = AxumTestRequest::get("/api/auth/status")
        .header("Authorization", &bearer(&expired))
        .send(setup.routes())
        .await;

    // Status never rejects; it just reports the session as absent
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["brightspace_connected"], false);
}

#[tokio::test]
async fn test_status_reports_disconnected_without_a_usable_token() {
    let setup = AuthTestSetup::new().await.expect("setup failed");

    // Logged in, but the stored Brightspace token expired with no refresh
    let dead_token = TokenData {
        refresh_token: None,
        expires_at: Some(Utc::now() - Duration::hours(1)),
        ..common::test_token_data()
    };
    let (_, session) = setup
        .login_user_with_token(&dead_token)
        .await
        .expect("login failed");

    let response = AxumTestRequest::get("/api/auth/status")
        .header("Authorization", &bearer(&session))
        .send(setup.routes())
        .await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["brightspace_connected"], false);
}

// ============================================================================
// POST /api/auth/logout
// ============================================================================

#[tokio::test]
async fn test_logout_acknowledges_with_and_without_a_session() {
    let setup = AuthTestSetup::new().await.expect("setup failed");

    let response = AxumTestRequest::post("/api/auth/logout")
        .send(setup.routes())
        .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Successfully logged out");

    let (_, session) = setup.login_user().await.expect("login failed");
    let response = AxumTestRequest::post("/api/auth/logout")
        .header("Authorization", &bearer(&session))
        .send(setup.routes())
        .await;
    assert_eq!(response.status(), 200);

    // Sessions are stateless; the token keeps validating until it expires
    let me = AxumTestRequest::get("/api/auth/me")
        .header("Authorization", &bearer(&session))
        .send(setup.routes())
        .await;
    assert_eq!(me.status(), 200);
}
