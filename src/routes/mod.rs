// ABOUTME: Route module organization for the campus auth server HTTP endpoints
// ABOUTME: Route definitions and thin handlers organized by domain, delegating to service layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campus Assistant Contributors

//! Route modules for the campus auth server
//!
//! Each domain module contains only route definitions and thin handler
//! functions that delegate to the service layer (`OAuthManager`,
//! `AuthManager`, `Database`).

/// Authentication and session routes
pub mod auth;
/// Health check routes
pub mod health;

/// Authentication route handlers
pub use auth::AuthRoutes;
/// Health check route handlers
pub use health::HealthRoutes;
