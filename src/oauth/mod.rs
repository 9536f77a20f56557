// ABOUTME: OAuth module handling the Brightspace authorization-code flow
// ABOUTME: Centralizes state handling, token exchange, and token lifecycle
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # OAuth Management Module
//!
//! Everything between "user clicks Log in" and "a Brightspace token is on
//! file": anti-forgery state, the authorization URL, code exchange, identity
//! lookup, and keeping stored tokens fresh.

pub mod client;
pub mod manager;
pub mod state;

pub use client::{BrightspaceIdentity, BrightspaceOAuthClient};
pub use manager::OAuthManager;
pub use state::StateCache;

use serde::{Deserialize, Serialize};

/// Token material returned by the provider's token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenData {
    /// Access token for Brightspace API calls
    pub access_token: String,
    /// Refresh token, present when offline access was granted
    pub refresh_token: Option<String>,
    /// Absolute expiry instant; `None` when the provider sent no lifetime
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Granted scope string
    pub scope: Option<String>,
    /// Token type, normally "Bearer"
    pub token_type: String,
}

/// Response handed to the frontend when a login flow starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    /// Provider authorization URL the browser should visit
    pub auth_url: String,
    /// Anti-forgery state bound to this flow
    pub state: String,
}

/// OAuth flow error types
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Client credentials are missing or the provider is disabled
    #[error("OAuth provider is not configured: {0}")]
    NotConfigured(String),

    /// State parameter is unknown, already used, or expired
    #[error("Invalid state parameter")]
    InvalidState,

    /// The provider rejected the grant itself; retrying cannot succeed
    #[error("Authorization grant rejected: {0}")]
    InvalidGrant(String),

    /// The provider answered but the answer is unusable
    #[error("Provider error: {0}")]
    Provider(String),

    /// Transport-level failure (timeout, connection, 5xx); safe to retry
    #[error("Provider request failed: {0}")]
    Network(String),

    /// Stored token is expired and carries no refresh token
    #[error("No refresh token available; re-authentication required")]
    NoRefreshToken,

    /// The user has no Brightspace token on file
    #[error("No Brightspace connection for this user")]
    NotConnected,

    /// Persistence failure while storing or loading tokens
    #[error("Database error: {0}")]
    Database(String),
}

impl OAuthError {
    /// Whether retrying the same operation could succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Error code used in browser redirects when a callback fails
    ///
    /// Every provider-side failure during the exchange reads as a failed
    /// authentication, outages included; `server_error` is kept for faults
    /// inside this service.
    #[must_use]
    pub const fn callback_error_code(&self) -> &'static str {
        match self {
            Self::InvalidState => "invalid_state",
            Self::InvalidGrant(_) | Self::Provider(_) | Self::Network(_) | Self::NoRefreshToken => {
                "auth_failed"
            }
            Self::NotConfigured(_) | Self::NotConnected | Self::Database(_) => "server_error",
        }
    }
}
