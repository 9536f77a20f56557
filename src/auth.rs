// ABOUTME: JWT-based session authentication for the campus auth server
// ABOUTME: Handles session token generation, validation, and refresh
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Campus Assistant Contributors

//! # Authentication and Session Management
//!
//! This module issues and validates the HS256 session tokens handed to the
//! frontend after a completed Brightspace login. Session tokens are distinct
//! from the Brightspace tokens stored per user; those never leave the server.

use crate::models::User;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

const SECONDS_PER_HOUR: i64 = 3600;

/// Render a duration as the largest sensible unit, for log messages
fn humanize_duration(duration: Duration) -> String {
    let total_secs = duration.num_seconds().abs();
    let days = total_secs / (24 * SECONDS_PER_HOUR);
    let hours = total_secs / SECONDS_PER_HOUR;
    let minutes = (total_secs % SECONDS_PER_HOUR) / 60;

    if days > 0 {
        format!("{days} days")
    } else if hours > 0 {
        format!("{hours} hours")
    } else if minutes > 0 {
        format!("{minutes} minutes")
    } else {
        format!("{total_secs} seconds")
    }
}

/// Why a session token failed verification.
///
/// The distinction stays inside the crate; route handlers collapse every
/// variant into one opaque 401.
#[derive(Debug, Clone)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
        /// Current time for reference
        current_time: DateTime<Utc>,
    },
    /// Token signature is invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token does not parse as a `JWT` at all
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

impl std::fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenExpired {
                expired_at,
                current_time,
            } => {
                let since = current_time.signed_duration_since(*expired_at);
                write!(
                    f,
                    "Session token expired {} ago at {}",
                    humanize_duration(since),
                    expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                )
            }
            Self::TokenInvalid { reason } => {
                write!(f, "Session token signature is invalid: {reason}")
            }
            Self::TokenMalformed { details } => {
                write!(f, "Session token is malformed: {details}")
            }
        }
    }
}

impl std::error::Error for JwtValidationError {}

/// `JWT` claims carried by a session token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID`
    pub sub: String,
    /// User email
    pub email: String,
    /// Linked Brightspace user identifier
    pub brightspace_user_id: Option<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Authentication manager for `JWT` session tokens
pub struct AuthManager {
    jwt_secret: Vec<u8>,
    token_expiry_hours: i64,
    /// Distinguishes tokens issued within the same second
    token_counter: AtomicU64,
}

impl Clone for AuthManager {
    fn clone(&self) -> Self {
        Self {
            jwt_secret: self.jwt_secret.clone(),
            token_expiry_hours: self.token_expiry_hours,
            // Each instance keeps its own counter; uniqueness only has to
            // hold per issuer
            token_counter: AtomicU64::new(0),
        }
    }
}

impl AuthManager {
    /// Create a new authentication manager
    #[must_use]
    pub const fn new(jwt_secret: Vec<u8>, token_expiry_hours: i64) -> Self {
        Self {
            jwt_secret,
            token_expiry_hours,
            token_counter: AtomicU64::new(0),
        }
    }

    /// How long sessions issued by this manager live
    #[must_use]
    pub const fn token_expiry_hours(&self) -> i64 {
        self.token_expiry_hours
    }

    /// Generate an HS256 session token for a user
    ///
    /// # Errors
    ///
    /// Returns an error when `JWT` encoding fails.
    pub fn generate_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let expiry = now + Duration::hours(self.token_expiry_hours);

        // Millisecond-offset iat so rapid logins never mint identical tokens
        let counter = self.token_counter.fetch_add(1, Ordering::Relaxed);
        let unique_iat =
            now.timestamp() * 1000 + i64::from(u32::try_from(counter % 1000).unwrap_or(0));

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            brightspace_user_id: user.brightspace_user_id.clone(),
            iat: unique_iat,
            exp: expiry.timestamp(),
        };

        let encoding_key = EncodingKey::from_secret(&self.jwt_secret);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &encoding_key)
            .context("Failed to encode session token")?;

        Ok(token)
    }

    /// Validate an HS256 session token
    ///
    /// Funnels through the same checks as [`Self::validate_token_detailed`];
    /// there is exactly one definition of a valid session.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad signature, an expired token, or a token
    /// that does not decode as a `JWT` with the expected claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        self.validate_token_detailed(token)
            .map_err(anyhow::Error::from)
    }

    /// Narrow jsonwebtoken's error kinds into the crate's own categories
    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> JwtValidationError {
        use jsonwebtoken::errors::ErrorKind;
        tracing::warn!("Session token validation failed: {:?}", e);

        match e.kind() {
            ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
                reason: "signature verification failed".into(),
            },
            ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
                details: "not a structurally valid JWT".into(),
            },
            ErrorKind::Base64(base64_err) => JwtValidationError::TokenMalformed {
                details: format!("segment did not decode as base64: {base64_err}"),
            },
            ErrorKind::Json(json_err) => JwtValidationError::TokenMalformed {
                details: format!("claims segment is not valid JSON: {json_err}"),
            },
            ErrorKind::Utf8(utf8_err) => JwtValidationError::TokenMalformed {
                details: format!("claims segment is not valid UTF-8: {utf8_err}"),
            },
            _ => JwtValidationError::TokenInvalid {
                reason: format!("rejected by validation: {e}"),
            },
        }
    }

    /// Validate a session token, reporting which check failed
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] distinguishing expiry from signature
    /// and structural failures.
    pub fn validate_token_detailed(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let claims = self.decode_token_claims(token)?;
        Self::validate_claims_expiry(&claims)?;

        tracing::debug!("Session token validation successful for user: {}", claims.sub);
        Ok(claims)
    }

    /// Decode session token claims without expiration validation
    fn decode_token_claims(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let decoding_key = DecodingKey::from_secret(&self.jwt_secret);
        let mut validation_no_exp = Validation::new(Algorithm::HS256);
        validation_no_exp.validate_exp = false;

        decode::<Claims>(token, &decoding_key, &validation_no_exp)
            .map(|token_data| token_data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))
    }

    /// Reject claims unless their expiry lies strictly in the future,
    /// logging how stale they are
    fn validate_claims_expiry(claims: &Claims) -> Result<(), JwtValidationError> {
        let current_time = Utc::now();
        if current_time.timestamp() < claims.exp {
            return Ok(());
        }

        let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
        tracing::warn!(
            "Session token expired for user {}: {} past expiry at {}",
            claims.sub,
            humanize_duration(current_time.signed_duration_since(expired_at)),
            expired_at.to_rfc3339()
        );
        Err(JwtValidationError::TokenExpired {
            expired_at,
            current_time,
        })
    }

    /// Replace a still-valid session token with a fresh one
    ///
    /// The old token must pass full validation, expiry included; an expired
    /// session cannot renew itself and requires a new login.
    ///
    /// # Errors
    ///
    /// Returns an error when the old token is invalid or expired, or when
    /// issuing the replacement fails.
    pub fn refresh_token(&self, old_token: &str, user: &User) -> Result<String> {
        let _claims = self
            .validate_token_detailed(old_token)
            .map_err(|e| anyhow::anyhow!("Refused to refresh an invalid session token: {e}"))?;

        self.generate_token(user)
    }

    /// Extract the user id from a valid session token
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid or expired token, or when its subject
    /// is not a valid `UUID`.
    pub fn extract_user_id(&self, token: &str) -> Result<Uuid> {
        let claims = self
            .validate_token_detailed(token)
            .map_err(|e| anyhow::anyhow!("Invalid session token: {e}"))?;

        Uuid::parse_str(&claims.sub).with_context(|| {
            format!("Failed to parse user ID from token subject: {}", claims.sub)
        })
    }
}

/// Generate a random `JWT` signing secret
///
/// Used at startup when `JWT_SECRET` is not configured. Sessions signed with
/// a generated secret do not survive a restart.
///
/// # Errors
///
/// Returns an error if the system RNG fails; the server cannot sign sessions
/// without one.
pub fn generate_jwt_secret() -> Result<[u8; 64]> {
    use ring::rand::{SecureRandom, SystemRandom};

    let rng = SystemRandom::new();
    let mut secret = [0u8; 64];

    rng.fill(&mut secret).map_err(|e| {
        tracing::error!("System RNG failure while generating JWT secret: {e:?}");
        anyhow::anyhow!("system RNG failure, cannot generate a JWT signing secret")
    })?;

    Ok(secret)
}
