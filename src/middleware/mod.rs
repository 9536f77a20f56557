// ABOUTME: HTTP middleware for the campus auth server
// ABOUTME: CORS configuration applied to the router at assembly time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campus Assistant Contributors

//! HTTP middleware modules

/// CORS configuration
pub mod cors;

pub use cors::setup_cors;
