// ABOUTME: User identity models for OAuth-backed accounts
// ABOUTME: User row definition plus the JSON payload returned by the API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campus Assistant Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default timezone for new accounts
const DEFAULT_TIMEZONE: &str = "America/Toronto";
/// Default interface language for new accounts
const DEFAULT_LANGUAGE: &str = "en";

/// A local user account, created on first successful Brightspace login.
///
/// The Brightspace user id, once set, uniquely identifies the row; every
/// subsequent login refreshes the mutable profile fields in place. Rows are
/// never deleted by the auth subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// User email address (unique)
    pub email: String,
    /// Display name as reported by Brightspace
    pub display_name: Option<String>,
    /// Brightspace user identifier (unique once linked)
    pub brightspace_user_id: Option<String>,
    /// Whether the account is active
    pub is_active: bool,
    /// Whether the identity has been verified
    pub is_verified: bool,
    /// Free-form user preferences
    pub preferences: serde_json::Value,
    /// IANA timezone name
    pub timezone: String,
    /// Interface language code
    pub language: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// When the account was last modified
    pub updated_at: DateTime<Utc>,
    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new user account.
    ///
    /// Accounts only come into existence through a completed OAuth login,
    /// so they start out verified.
    #[must_use]
    pub fn new(
        email: String,
        display_name: Option<String>,
        brightspace_user_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            display_name,
            brightspace_user_id,
            is_active: true,
            is_verified: true,
            preferences: serde_json::Value::Object(serde_json::Map::new()),
            timezone: DEFAULT_TIMEZONE.into(),
            language: DEFAULT_LANGUAGE.into(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }
}

/// User payload returned by the API (never includes credentials)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// Unique user identifier
    pub id: Uuid,
    /// User email address
    pub email: String,
    /// Display name
    pub display_name: Option<String>,
    /// Brightspace user identifier
    pub brightspace_user_id: Option<String>,
    /// Whether the account is active
    pub is_active: bool,
    /// Whether the identity has been verified
    pub is_verified: bool,
    /// IANA timezone name
    pub timezone: String,
    /// Interface language code
    pub language: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            brightspace_user_id: user.brightspace_user_id.clone(),
            is_active: user.is_active,
            is_verified: user.is_verified,
            timezone: user.timezone.clone(),
            language: user.language.clone(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}
