// ABOUTME: HTTP client for the Brightspace OAuth2 and identity endpoints
// ABOUTME: Builds authorization URLs, exchanges codes, refreshes tokens, fetches whoami
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Campus Assistant Contributors

use super::{OAuthError, TokenData};
use crate::config::environment::{BrightspaceApiConfig, OAuthProviderConfig};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Upper bound on any single provider request
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Domain used when the identity response carries no email address
const FALLBACK_EMAIL_DOMAIN: &str = "uottawa.ca";

/// Client for the Brightspace side of the authorization-code flow.
///
/// One instance is built at startup and shared; the underlying HTTP client
/// enforces a 30 second timeout on every call so a stalled provider cannot
/// pin request handlers.
pub struct BrightspaceOAuthClient {
    oauth: OAuthProviderConfig,
    api: BrightspaceApiConfig,
    http: reqwest::Client,
}

/// Token endpoint response format
#[derive(Debug, Deserialize)]
struct BrightspaceTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    token_type: Option<String>,
    scope: Option<String>,
}

impl BrightspaceTokenResponse {
    fn into_token_data(self) -> TokenData {
        TokenData {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
            scope: self.scope,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".into()),
        }
    }
}

/// Identity returned by the Brightspace whoami endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct BrightspaceIdentity {
    /// Brightspace user identifier
    #[serde(rename = "Identifier")]
    pub identifier: String,
    /// Given name
    #[serde(rename = "FirstName", default)]
    pub first_name: Option<String>,
    /// Family name
    #[serde(rename = "LastName", default)]
    pub last_name: Option<String>,
    /// Email address, absent on most tenants
    #[serde(rename = "EmailAddress", default)]
    pub email_address: Option<String>,
}

impl BrightspaceIdentity {
    /// Display name composed from first and last name, `None` when both are
    /// blank so an existing stored name is not overwritten with nothing.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_owned())
        }
    }

    /// Email to store for this identity, falling back to a synthesized
    /// institutional address when the provider did not report one.
    #[must_use]
    pub fn email(&self) -> String {
        self.email_address
            .clone()
            .filter(|email| !email.is_empty())
            .unwrap_or_else(|| format!("{}@{FALLBACK_EMAIL_DOMAIN}", self.identifier))
    }
}

/// Resolved credentials after configuration checks
struct ClientCredentials<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
}

impl BrightspaceOAuthClient {
    /// Create the client with a bounded-timeout HTTP transport
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(oauth: OAuthProviderConfig, api: BrightspaceApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for Brightspace")?;

        Ok(Self { oauth, api, http })
    }

    fn credentials(&self) -> Result<ClientCredentials<'_>, OAuthError> {
        if !self.oauth.enabled {
            return Err(OAuthError::NotConfigured(
                "Brightspace OAuth is disabled".into(),
            ));
        }

        let client_id = self
            .oauth
            .client_id
            .as_deref()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                OAuthError::NotConfigured("BRIGHTSPACE_OAUTH_CLIENT_ID is not set".into())
            })?;

        let client_secret = self
            .oauth
            .client_secret
            .as_deref()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                OAuthError::NotConfigured("BRIGHTSPACE_OAUTH_CLIENT_SECRET is not set".into())
            })?;

        let redirect_uri = self
            .oauth
            .redirect_uri
            .as_deref()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                OAuthError::NotConfigured("BRIGHTSPACE_OAUTH_REDIRECT_URI is not set".into())
            })?;

        Ok(ClientCredentials {
            client_id,
            client_secret,
            redirect_uri,
        })
    }

    /// Build the provider authorization URL for a login attempt.
    ///
    /// `access_type=offline` asks Brightspace for a refresh token alongside
    /// the access token.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::NotConfigured`] when credentials are missing or
    /// the configured endpoint is not a valid URL.
    pub fn authorization_url(&self, state: &str) -> Result<String, OAuthError> {
        let creds = self.credentials()?;

        let mut url = Url::parse(&self.api.auth_url).map_err(|e| {
            OAuthError::NotConfigured(format!("Invalid authorization endpoint URL: {e}"))
        })?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", creds.client_id)
            .append_pair("redirect_uri", creds.redirect_uri)
            .append_pair("scope", &self.oauth.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("access_type", "offline");

        Ok(url.into())
    }

    /// Exchange an authorization code for a token pair
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidGrant`] when the provider rejects the
    /// code, [`OAuthError::Network`] on transport failures or provider 5xx,
    /// and [`OAuthError::Provider`] for other protocol-level failures.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenData, OAuthError> {
        let creds = self.credentials()?;

        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", creds.client_id),
            ("client_secret", creds.client_secret),
            ("code", code),
            ("redirect_uri", creds.redirect_uri),
        ];

        self.token_request("Token exchange", &params).await
    }

    /// Trade a refresh token for a fresh token pair
    ///
    /// # Errors
    ///
    /// Same classification as [`exchange_code`](Self::exchange_code); an
    /// [`OAuthError::InvalidGrant`] here means the refresh token itself has
    /// been revoked and the user must log in again.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenData, OAuthError> {
        let creds = self.credentials()?;

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", creds.client_id),
            ("client_secret", creds.client_secret),
            ("refresh_token", refresh_token),
        ];

        self.token_request("Token refresh", &params).await
    }

    async fn token_request(
        &self,
        operation: &str,
        params: &[(&str, &str)],
    ) -> Result<TokenData, OAuthError> {
        let response = self
            .http
            .post(&self.api.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("{operation} request failed: {e}")))?;

        let status = response.status();

        if status.is_server_error() {
            return Err(OAuthError::Network(format!(
                "{operation} failed: token endpoint returned {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::Network(format!("{operation} response unreadable: {e}")))?;

        if !status.is_success() {
            tracing::warn!("{} rejected with {}: {}", operation, status, body);
            if body.contains("invalid_grant") {
                return Err(OAuthError::InvalidGrant(body));
            }
            return Err(OAuthError::Provider(format!(
                "{operation} failed with {status}: {body}"
            )));
        }

        let token_response: BrightspaceTokenResponse = serde_json::from_str(&body)
            .map_err(|e| OAuthError::Provider(format!("Malformed token response: {e}")))?;

        Ok(token_response.into_token_data())
    }

    /// Fetch the authenticated user's identity from the whoami endpoint
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::Network`] on transport failures or provider
    /// 5xx, [`OAuthError::Provider`] when the token is rejected or the
    /// response cannot be parsed.
    pub async fn fetch_identity(
        &self,
        access_token: &str,
    ) -> Result<BrightspaceIdentity, OAuthError> {
        let url = self.api.whoami_url();

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("Identity request failed: {e}")))?;

        let status = response.status();

        if status.is_server_error() {
            return Err(OAuthError::Network(format!(
                "Identity endpoint returned {status}"
            )));
        }

        if !status.is_success() {
            return Err(OAuthError::Provider(format!(
                "Identity endpoint rejected the access token with {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::Network(format!("Identity response unreadable: {e}")))?;

        serde_json::from_str(&body)
            .map_err(|e| OAuthError::Provider(format!("Malformed identity response: {e}")))
    }
}
