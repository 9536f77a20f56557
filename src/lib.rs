// ABOUTME: Main library entry point for the campus auth server
// ABOUTME: Brightspace OAuth2 login plus stateless JWT sessions for the uOttawa assistant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campus Assistant Contributors

#![deny(unsafe_code)]

//! # Campus Auth Server
//!
//! The authentication backend of the uOttawa Brightspace Assistant. It
//! connects end users to the Brightspace learning platform via the OAuth2
//! authorization-code grant and issues the application's own stateless JWT
//! session tokens.
//!
//! ## Features
//!
//! - **Brightspace login**: authorization-code flow with anti-forgery state
//! - **Stateless sessions**: HS256-signed JWTs, refresh without re-login
//! - **Provider token store**: per-user access/refresh tokens with
//!   transparent, serialized refresh
//! - **Single identity**: one user row per Brightspace identity, linked by
//!   atomic upsert
//!
//! ## Architecture
//!
//! - **oauth**: the provider-facing flow (authorization URL, code exchange,
//!   identity fetch, state cache, refresh policy)
//! - **auth**: session token issuing and verification
//! - **database**: `SQLite` persistence for users and provider tokens
//! - **routes**: the HTTP surface under `/api/auth` plus `/api/health`
//! - **server**: dependency injection container and router assembly
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use campus_auth_server::config::environment::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Campus auth server configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Session token management: JWT issuing, validation, and refresh
pub mod auth;

/// Configuration management from environment variables
pub mod config;

/// `SQLite` persistence for users and provider tokens
pub mod database;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// Production logging and structured output
pub mod logging;

/// HTTP middleware (CORS)
pub mod middleware;

/// Data models for users and provider credentials
pub mod models;

/// Brightspace OAuth2 flow: client, state cache, and orchestration
pub mod oauth;

/// HTTP routes for authentication and health checks
pub mod routes;

/// Server assembly: shared resources and the axum application
pub mod server;
