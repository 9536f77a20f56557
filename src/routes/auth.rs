// ABOUTME: Authentication route handlers for Brightspace login, OAuth callback and sessions
// ABOUTME: Thin axum handlers delegating to OAuthManager, AuthManager and Database
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Campus Assistant Contributors

//! Authentication routes
//!
//! The browser-facing half of the login flow: `/api/auth/login` hands the
//! frontend a Brightspace authorization URL, `/api/auth/callback` receives
//! the provider redirect and turns it into a session token. The remaining
//! endpoints serve an established session: token refresh, identity lookup,
//! connection status, and logout.

use crate::errors::AppError;
use crate::logging::AppLogger;
use crate::models::UserResponse;
use crate::server::ServerResources;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Query parameters Brightspace appends to the callback redirect
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Authorization code to exchange; absent when the provider reports an error
    pub code: Option<String>,
    /// Anti-forgery state issued by `/api/auth/login`
    pub state: Option<String>,
    /// Error code from the provider (for example when the user denies access)
    pub error: Option<String>,
}

/// Response payload for a refreshed session token
#[derive(Debug, Serialize)]
pub struct TokenRefreshResponse {
    /// Newly signed session token
    pub access_token: String,
    /// Token type, always `bearer`
    pub token_type: String,
    /// Current user record
    pub user: UserResponse,
}

/// Response payload for `/api/auth/status`
#[derive(Debug, Serialize)]
pub struct AuthStatusResponse {
    /// Whether the presented session token is valid
    pub authenticated: bool,
    /// Whether a usable Brightspace token is stored for the user
    pub brightspace_connected: bool,
    /// Session subject, present only when authenticated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

/// Response payload for `/api/auth/logout`
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Acknowledgement message
    pub message: String,
}

/// Authentication route handlers
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/login", get(Self::handle_login))
            .route("/api/auth/callback", get(Self::handle_callback))
            .route("/api/auth/token/refresh", post(Self::handle_token_refresh))
            .route("/api/auth/me", get(Self::handle_me))
            .route("/api/auth/status", get(Self::handle_status))
            .route("/api/auth/logout", post(Self::handle_logout))
            .with_state(resources)
    }

    /// Pull the bearer token out of the authorization header
    fn bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AppError> {
        headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(AppError::auth_required)
    }

    /// Extract and validate the session token, returning the authenticated
    /// user id. Every validation failure collapses to the same opaque 401.
    fn authenticate(
        headers: &axum::http::HeaderMap,
        resources: &Arc<ServerResources>,
    ) -> Result<Uuid, AppError> {
        let token = Self::bearer_token(headers)?;

        let claims = resources
            .auth_manager
            .validate_token_detailed(token)
            .map_err(|e| {
                tracing::debug!(error = %e, "Session token rejected");
                AppError::session_invalid()
            })?;

        Uuid::parse_str(&claims.sub).map_err(|_| AppError::session_invalid())
    }

    /// 302 redirect built the way Brightspace expects callers to consume it
    fn redirect(url: &str) -> Response {
        (StatusCode::FOUND, [(header::LOCATION, url.to_owned())]).into_response()
    }

    /// Redirect back to the frontend login page carrying an error code
    fn login_error_redirect(frontend_url: &str, error_code: &str) -> Response {
        Self::redirect(&format!(
            "{frontend_url}/login?error={}",
            urlencoding::encode(error_code)
        ))
    }

    /// Handle starting a Brightspace login
    ///
    /// Registers a fresh anti-forgery state and returns the authorization URL
    /// the frontend should navigate to. Fails only when the OAuth client is
    /// not configured.
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let authorization = resources
            .oauth_manager
            .begin_login()
            .map_err(|e| AppError::config(e.to_string()))?;

        tracing::debug!("Issued Brightspace authorization URL");

        Ok((StatusCode::OK, Json(authorization)).into_response())
    }

    /// Handle the OAuth callback redirect from Brightspace
    ///
    /// Always answers with a 302 back to the frontend: to the dashboard with
    /// a session token on success, to the login page with an error code on
    /// any failure. Checks run in a fixed order: the provider `error`
    /// parameter, then parameter presence, then the state (consumed before
    /// any code exchange), then the exchange itself.
    async fn handle_callback(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<CallbackParams>,
    ) -> Response {
        let frontend_url = &resources.config.urls.frontend_url;

        if let Some(provider_error) = params.error {
            tracing::warn!(error = %provider_error, "Brightspace reported an error on callback");
            return Self::login_error_redirect(frontend_url, &provider_error);
        }

        let (Some(code), Some(state)) = (params.code, params.state) else {
            return Self::login_error_redirect(frontend_url, "missing_parameters");
        };

        let user = match resources.oauth_manager.handle_callback(&code, &state).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Brightspace callback rejected");
                return Self::login_error_redirect(frontend_url, e.callback_error_code());
            }
        };

        match resources.auth_manager.generate_token(&user) {
            Ok(token) => {
                AppLogger::log_oauth_event(&user.id.to_string(), "login", true);
                Self::redirect(&format!(
                    "{frontend_url}/dashboard?token={}",
                    urlencoding::encode(&token)
                ))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to sign session token");
                Self::login_error_redirect(frontend_url, "server_error")
            }
        }
    }

    /// Handle session token refresh
    ///
    /// The presented token must still be valid, expiry included; an expired
    /// session cannot renew itself. The user row must still exist.
    async fn handle_token_refresh(
        State(resources): State<Arc<ServerResources>>,
        headers: axum::http::HeaderMap,
    ) -> Result<Response, AppError> {
        let token = Self::bearer_token(&headers)?;

        let user_id = resources.auth_manager.extract_user_id(token).map_err(|e| {
            tracing::debug!(error = %e, "Refresh rejected: session token invalid or expired");
            AppError::session_invalid()
        })?;

        let user = resources
            .database
            .get_user(user_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .ok_or_else(|| AppError::not_found("User"))?;

        let access_token = resources
            .auth_manager
            .refresh_token(token, &user)
            .map_err(|e| {
                tracing::debug!(error = %e, "Refresh rejected: could not re-issue session");
                AppError::session_invalid()
            })?;

        AppLogger::log_auth_event(&user.id.to_string(), "token_refresh", true, None);

        let response = TokenRefreshResponse {
            access_token,
            token_type: "bearer".into(),
            user: UserResponse::from(&user),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle fetching the authenticated user's record
    async fn handle_me(
        State(resources): State<Arc<ServerResources>>,
        headers: axum::http::HeaderMap,
    ) -> Result<Response, AppError> {
        let user_id = Self::authenticate(&headers, &resources)?;

        let user = resources
            .database
            .get_user(user_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .ok_or_else(|| AppError::not_found("User"))?;

        Ok((StatusCode::OK, Json(UserResponse::from(&user))).into_response())
    }

    /// Handle the session/connection status probe
    ///
    /// Always answers 200. Absent, invalid or expired credentials and any
    /// internal failure all yield `authenticated: false` rather than an
    /// error status, so the frontend can poll this unconditionally.
    async fn handle_status(
        State(resources): State<Arc<ServerResources>>,
        headers: axum::http::HeaderMap,
    ) -> Json<AuthStatusResponse> {
        let Ok(user_id) = Self::authenticate(&headers, &resources) else {
            return Json(AuthStatusResponse {
                authenticated: false,
                brightspace_connected: false,
                user_id: None,
            });
        };

        let brightspace_connected = resources.oauth_manager.is_connected(user_id).await;

        Json(AuthStatusResponse {
            authenticated: true,
            brightspace_connected,
            user_id: Some(user_id),
        })
    }

    /// Handle logout
    ///
    /// Sessions are stateless, so this is an acknowledgement only: the token
    /// stays valid until it expires and the client discards it. Stored
    /// Brightspace credentials are kept so the next login skips the consent
    /// screen. Known limitation: no server-side revocation.
    async fn handle_logout(
        State(resources): State<Arc<ServerResources>>,
        headers: axum::http::HeaderMap,
    ) -> Json<LogoutResponse> {
        if let Ok(user_id) = Self::authenticate(&headers, &resources) {
            AppLogger::log_auth_event(&user_id.to_string(), "logout", true, None);
        }

        Json(LogoutResponse {
            message: "Successfully logged out".into(),
        })
    }
}
