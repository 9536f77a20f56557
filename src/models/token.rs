// ABOUTME: Stored Brightspace OAuth token model
// ABOUTME: One row per user holding the current access/refresh token pair
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campus Assistant Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's current Brightspace token pair.
///
/// Each user has at most one row; a refresh or re-login replaces the
/// credentials in place rather than accumulating history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderToken {
    /// Unique token record identifier
    pub id: String,
    /// Owning user
    pub user_id: Uuid,
    /// Current access token
    pub access_token: String,
    /// Refresh token, when the provider granted offline access
    pub refresh_token: Option<String>,
    /// Token type, normally "Bearer"
    pub token_type: String,
    /// When the access token expires; `None` means it never does
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted scope string
    pub scope: Option<String>,
    /// When this record was created
    pub created_at: DateTime<Utc>,
    /// When the credentials were last replaced
    pub updated_at: DateTime<Utc>,
}

impl ProviderToken {
    /// Create a new token record for a user.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        access_token: String,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
        scope: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            access_token,
            refresh_token,
            token_type: "Bearer".into(),
            expires_at,
            scope,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the access token can no longer be used.
    ///
    /// A token is usable only while its expiry lies strictly in the future;
    /// a token without an expiry never expires.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() >= expires_at)
    }

    /// Replace the credentials after a refresh.
    ///
    /// Providers may omit the refresh token from a refresh response; in that
    /// case the existing one stays valid and is kept.
    pub fn update_token(
        &mut self,
        access_token: String,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
        scope: Option<String>,
    ) {
        self.access_token = access_token;
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
        self.expires_at = expires_at;
        self.scope = scope;
        self.updated_at = Utc::now();
    }
}
