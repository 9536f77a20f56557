// ABOUTME: Configuration module grouping the environment-resolved settings
// ABOUTME: Re-exports the typed config structs the rest of the crate consumes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campus Assistant Contributors

//! Configuration module for the campus auth server
//!
//! This module provides centralized configuration management:
//!
//! - **Environment**: Server configuration from environment variables,
//!   including the database URL, JWT session settings, the Brightspace
//!   OAuth client, and frontend/backend URLs.

/// Environment and server configuration
pub mod environment;

pub use environment::{
    AppUrls, AuthConfig, BrightspaceApiConfig, DatabaseConfig, DatabaseUrl, Environment,
    LogLevel, OAuthConfig, OAuthProviderConfig, ServerConfig,
};
