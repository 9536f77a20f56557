// ABOUTME: Cross-origin policy for the auth API, driven by CORS_ORIGINS
// ABOUTME: Builds the tower-http CorsLayer the frontend client talks through
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Campus Assistant Contributors

use crate::config::environment::ServerConfig;
use axum::http::{header::HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Configure CORS settings for the auth API
///
/// Origins come from the `CORS_ORIGINS` configuration: wildcard ("*") for
/// development, a comma-separated origin list for production. Methods and
/// headers cover what the frontend sends: JSON requests carrying the
/// `authorization` header.
pub fn setup_cors(config: &ServerConfig) -> CorsLayer {
    let allow_origin = if config.cors_origins.iter().any(|o| o == "*") {
        // Development mode: allow any origin
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();

        if origins.is_empty() {
            // Fallback to any if parsing failed
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static("access-control-request-method"),
            HeaderName::from_static("access-control-request-headers"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}
