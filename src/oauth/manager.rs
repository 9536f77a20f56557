// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # OAuth Manager
//!
//! Orchestrates the complete Brightspace flow: login start, callback
//! completion, and keeping stored tokens usable for API calls.

use super::{AuthorizationResponse, BrightspaceOAuthClient, OAuthError, StateCache};
use crate::database::Database;
use crate::models::{ProviderToken, User};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Central coordinator for the Brightspace authorization-code flow
pub struct OAuthManager {
    database: Arc<Database>,
    client: BrightspaceOAuthClient,
    states: StateCache,
    refresh_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl OAuthManager {
    /// Create a new OAuth manager
    #[must_use]
    pub fn new(database: Arc<Database>, client: BrightspaceOAuthClient) -> Self {
        Self {
            database,
            client,
            states: StateCache::new(),
            refresh_locks: DashMap::new(),
        }
    }

    /// Start a login flow: register a state value and build the provider
    /// authorization URL carrying it.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::NotConfigured`] when client credentials are
    /// missing; the issued state then simply ages out of the cache.
    pub fn begin_login(&self) -> Result<AuthorizationResponse, OAuthError> {
        let state = self.states.issue();
        let auth_url = self.client.authorization_url(&state)?;

        debug!("Issued state for a new Brightspace login flow");
        Ok(AuthorizationResponse { auth_url, state })
    }

    /// Complete a callback: spend the state, exchange the code, resolve the
    /// user's identity, and persist the account plus token pair.
    ///
    /// The state is consumed before anything touches the network, so a
    /// replayed callback fails fast and never triggers a second exchange of
    /// the same code.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidState`] for unknown, reused, or expired
    /// states; otherwise whatever the exchange, identity fetch, or database
    /// write produced.
    pub async fn handle_callback(&self, code: &str, state: &str) -> Result<User, OAuthError> {
        if !self.states.consume(state) {
            warn!("OAuth callback presented an unknown, reused, or expired state");
            return Err(OAuthError::InvalidState);
        }

        let token = self.client.exchange_code(code).await?;
        let identity = self.client.fetch_identity(&token.access_token).await?;

        let candidate = User::new(
            identity.email(),
            identity.display_name(),
            Some(identity.identifier.clone()),
        );

        let user = self
            .database
            .record_oauth_login(&candidate, &token)
            .await
            .map_err(|e| OAuthError::Database(e.to_string()))?;

        info!(
            user_id = %user.id,
            email = %user.email,
            "Brightspace login completed"
        );

        Ok(user)
    }

    /// Return a usable Brightspace token for the user, refreshing through
    /// the provider when the stored one has expired.
    ///
    /// Refreshes for the same user are serialized on a per-user lock:
    /// concurrent callers collapse onto one upstream refresh, and the
    /// waiters re-read the freshly stored token instead of spending the
    /// rotated refresh token a second time.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::NotConnected`] when no token is stored,
    /// [`OAuthError::NoRefreshToken`] when the stored token expired without
    /// refresh capability, or the refresh call's own error.
    pub async fn get_valid_token(&self, user_id: Uuid) -> Result<ProviderToken, OAuthError> {
        let token = self.load_token(user_id).await?;
        if !token.is_expired() {
            return Ok(token);
        }

        let refreshed = self.refresh_serialized(user_id).await;

        // Drop the user's lock entry once no other caller holds a handle to
        // it; the map then only carries in-flight refreshes
        self.refresh_locks
            .remove_if(&user_id, |_, lock| Arc::strong_count(lock) == 1);

        refreshed
    }

    /// Refresh the stored token while holding the user's refresh lock
    async fn refresh_serialized(&self, user_id: Uuid) -> Result<ProviderToken, OAuthError> {
        let lock = Arc::clone(
            self.refresh_locks
                .entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        let _guard = lock.lock().await;

        // Another caller may have refreshed while this one waited
        let mut token = self.load_token(user_id).await?;
        if !token.is_expired() {
            return Ok(token);
        }

        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or(OAuthError::NoRefreshToken)?;

        info!(user_id = %user_id, "Refreshing expired Brightspace token");
        let refreshed = self.client.refresh_token(refresh_token).await?;

        token.update_token(
            refreshed.access_token,
            refreshed.refresh_token,
            refreshed.expires_at,
            refreshed.scope,
        );

        self.database
            .upsert_provider_token(&token)
            .await
            .map_err(|e| OAuthError::Database(e.to_string()))?;

        Ok(token)
    }

    /// Number of per-user refresh locks currently held in memory
    #[must_use]
    pub fn refresh_lock_count(&self) -> usize {
        self.refresh_locks.len()
    }

    /// Whether the user currently holds, or can refresh to, a usable token.
    /// Any failure along the way reads as "not connected".
    pub async fn is_connected(&self, user_id: Uuid) -> bool {
        match self.get_valid_token(user_id).await {
            Ok(_) => true,
            Err(e) => {
                debug!(user_id = %user_id, "Brightspace connection check failed: {}", e);
                false
            }
        }
    }

    async fn load_token(&self, user_id: Uuid) -> Result<ProviderToken, OAuthError> {
        self.database
            .get_provider_token(user_id)
            .await
            .map_err(|e| OAuthError::Database(e.to_string()))?
            .ok_or(OAuthError::NotConnected)
    }
}
