// ABOUTME: Core data models for users and provider credentials
// ABOUTME: User, ProviderToken and the payload shapes derived from them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campus Assistant Contributors

//! Data models for the auth subsystem
//!
//! Two records persist: the [`User`] identity row and the per-user
//! [`ProviderToken`] credential row. Everything else (CSRF states, session
//! claims) is transient and lives with the module that owns it.

/// Provider credential models
pub mod token;
/// User identity models
pub mod user;

pub use token::ProviderToken;
pub use user::{User, UserResponse};
