// ABOUTME: In-process HTTP harness for exercising the server's routers in tests
// ABOUTME: Drives axum apps through tower::ServiceExt::oneshot, no sockets involved
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campus Assistant Contributors

use axum::{
    body::{to_bytes, Body},
    http::{request, HeaderMap, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

/// Request under construction, sent with [`AxumTestRequest::send`]
pub struct AxumTestRequest {
    builder: request::Builder,
}

impl AxumTestRequest {
    /// Start a GET request
    pub fn get(uri: &str) -> Self {
        Self::with_method(Method::GET, uri)
    }

    /// Start a POST request
    pub fn post(uri: &str) -> Self {
        Self::with_method(Method::POST, uri)
    }

    /// Start an OPTIONS request, for CORS preflight checks
    #[allow(dead_code)]
    pub fn options(uri: &str) -> Self {
        Self::with_method(Method::OPTIONS, uri)
    }

    fn with_method(method: Method, uri: &str) -> Self {
        Self {
            builder: Request::builder().method(method).uri(uri),
        }
    }

    /// Attach a request header
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.builder = self.builder.header(key, value);
        self
    }

    /// Run the request through the router and capture the full response
    pub async fn send(self, app: Router) -> AxumTestResponse {
        let request = self
            .builder
            .body(Body::empty())
            .expect("test request must be well formed");

        let response = app
            .oneshot(request)
            .await
            .expect("router returned an error");

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body should be readable")
            .to_vec();

        AxumTestResponse {
            status,
            headers,
            body,
        }
    }
}

/// A fully buffered response: status, headers and body
pub struct AxumTestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl AxumTestResponse {
    /// Status code as a bare u16, convenient for `assert_eq!`
    pub const fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// A header value, when present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Deserialize the body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(self) -> T {
        serde_json::from_slice(&self.body).expect("body should be valid JSON")
    }

    /// The body as a UTF-8 string
    pub fn text(self) -> String {
        String::from_utf8(self.body).expect("body should be valid UTF-8")
    }

    /// Assert an exact status, chainable
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status, expected,
            "expected status {expected}, got {}",
            self.status
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_get_request_round_trip() {
        let app = Router::new().route("/ping", get(|| async { "pong" }));
        let response = AxumTestRequest::get("/ping").send(app).await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.text(), "pong");
    }

    #[tokio::test]
    async fn test_request_headers_reach_the_handler() {
        let app = Router::new().route(
            "/echo",
            get(|headers: HeaderMap| async move {
                headers
                    .get("x-probe")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("missing")
                    .to_owned()
            }),
        );
        let response = AxumTestRequest::get("/echo")
            .header("x-probe", "present")
            .send(app)
            .await;
        assert_eq!(response.text(), "present");
    }

    #[tokio::test]
    async fn test_response_headers_are_retained() {
        let app = Router::new().route(
            "/redirect",
            get(|| async {
                (
                    StatusCode::FOUND,
                    [("location", "http://localhost:3000/dashboard")],
                )
            }),
        );
        let response = AxumTestRequest::get("/redirect").send(app).await;
        assert_eq!(response.status(), 302);
        assert_eq!(
            response.header("location"),
            Some("http://localhost:3000/dashboard")
        );
        assert_eq!(response.header("x-missing"), None);
    }
}
