// ABOUTME: Structured tracing setup for the auth server's log output
// ABOUTME: Resolves level, format and detail flags from the environment and installs the subscriber
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Campus Assistant Contributors

//! Production logging with structured output
//!
//! The subscriber is assembled from [`LoggingConfig`], which resolves from
//! environment variables. `RUST_LOG` always wins for filtering; dependency
//! noise (hyper, reqwest) is capped regardless.

use anyhow::Result;
use serde_json::json;
use std::env;
use std::io;
use tracing::info;
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Per-crate level caps applied on top of whatever filter is configured,
/// so chatty dependencies cannot drown out auth events
const NOISE_CAPS: [&str; 4] = ["hyper=warn", "reqwest=warn", "sqlx=info", "tower_http=info"];

/// Resolved logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level emitted (trace through error)
    pub level: String,
    /// Formatter selection
    pub format: LogFormat,
    /// Annotate records with source file and line
    pub include_location: bool,
    /// Annotate records with thread ids and names
    pub include_thread: bool,
    /// Emit span open and close events
    pub include_spans: bool,
    /// Service name stamped on the startup record
    pub service_name: String,
    /// Reported service version
    pub service_version: String,
    /// Deployment environment name
    pub environment: String,
}

/// How log records are rendered
#[derive(Debug, Clone)]
pub enum LogFormat {
    /// Newline-delimited `JSON`, for log aggregation
    Json,
    /// Human-readable multi-line output, for development
    Pretty,
    /// Single-line output without targets
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Pretty,
            include_location: false,
            include_thread: false,
            include_spans: false,
            service_name: env!("CARGO_PKG_NAME").to_owned(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: "development".to_owned(),
        }
    }
}

/// A detail flag is on in production, or when its variable is set at all
fn detail_flag(var: &str, production: bool) -> bool {
    production || env::var(var).is_ok()
}

impl LoggingConfig {
    /// Resolve logging configuration from environment variables.
    ///
    /// `RUST_LOG` takes precedence over `LOG_LEVEL`. Production turns on
    /// every detail flag; outside production each can be enabled through its
    /// own `LOG_INCLUDE_*` variable.
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG")
            .or_else(|_| env::var("LOG_LEVEL"))
            .unwrap_or_else(|_| "info".to_owned());

        let format = env::var("LOG_FORMAT").map_or(LogFormat::Pretty, |raw| match raw.as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        });

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_owned());
        let production = environment == "production";

        let ident =
            |var: &str, fallback: &str| env::var(var).unwrap_or_else(|_| fallback.to_owned());

        Self {
            level,
            format,
            include_location: detail_flag("LOG_INCLUDE_LOCATION", production),
            include_thread: detail_flag("LOG_INCLUDE_THREAD", production),
            include_spans: detail_flag("LOG_INCLUDE_SPANS", production),
            service_name: ident("SERVICE_NAME", env!("CARGO_PKG_NAME")),
            service_version: ident("SERVICE_VERSION", env!("CARGO_PKG_VERSION")),
            environment,
        }
    }

    /// Filter honoring `RUST_LOG` when present, with the noise caps and the
    /// crate's own level layered on top
    fn build_filter(&self) -> EnvFilter {
        let mut filter =
            env::var("RUST_LOG").map_or_else(|_| EnvFilter::new(&self.level), EnvFilter::new);

        for cap in NOISE_CAPS {
            if let Ok(directive) = cap.parse::<Directive>() {
                filter = filter.add_directive(directive);
            }
        }

        if let Ok(directive) = format!("campus_auth_server={}", self.level).parse::<Directive>() {
            filter = filter.add_directive(directive);
        }

        filter
    }

    fn span_events(&self) -> FmtSpan {
        if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Install the global tracing subscriber described by this configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the subscriber cannot be installed
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.build_filter());

        let layer = fmt::layer()
            .with_target(true)
            .with_writer(io::stdout)
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_thread_ids(self.include_thread)
            .with_thread_names(self.include_thread)
            .with_span_events(self.span_events());

        match self.format {
            LogFormat::Json => registry.with(layer.json()).init(),
            LogFormat::Pretty => registry.with(layer).init(),
            LogFormat::Compact => registry.with(layer.compact().with_target(false)).init(),
        }

        self.announce();

        Ok(())
    }

    /// One record describing how logging came up, plus a machine-readable summary
    fn announce(&self) {
        info!(
            service = %self.service_name,
            version = %self.service_version,
            env = %self.environment,
            "Logging initialized"
        );

        let summary = json!({
            "service": self.service_name,
            "version": self.service_version,
            "environment": self.environment,
            "log": { "level": self.level, "format": format!("{:?}", self.format) },
            "detail": {
                "location": self.include_location,
                "thread": self.include_thread,
                "spans": self.include_spans,
            }
        });
        info!("Logging configuration: {summary}");
    }
}

/// Install the subscriber with stock settings
///
/// # Errors
///
/// Returns an error if the subscriber cannot be installed
pub fn init_default() -> Result<()> {
    LoggingConfig::default().init()
}

/// Install the subscriber configured from the environment
///
/// # Errors
///
/// Returns an error if the subscriber cannot be installed
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Canned log shapes for authentication flow events
pub struct AppLogger;

impl AppLogger {
    /// Record a session event for one user
    pub fn log_auth_event(user_id: &str, event: &str, success: bool, details: Option<&str>) {
        info!(
            auth.event = %event,
            auth.success = success,
            user.id = %user_id,
            details = details.unwrap_or("-"),
            "Auth event"
        );
    }

    /// Record an `OAuth` exchange against the learning platform
    pub fn log_oauth_event(user_id: &str, event: &str, success: bool) {
        info!(
            oauth.provider = "brightspace",
            oauth.event = %event,
            oauth.success = success,
            user.id = %user_id,
            "OAuth event"
        );
    }
}
