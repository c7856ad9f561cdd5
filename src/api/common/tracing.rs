//! Request/response hooks for `tower_http::trace::TraceLayer`.

use axum::body::Body;
use axum::http::{HeaderMap, Request, Response};
use std::collections::HashMap;
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tracing::{info_span, Span};

use crate::authentication::nonce::NONCE_HEADER;

fn is_sensitive(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.contains("authorization") || name.contains("cookie") || name.contains("token") || name == NONCE_HEADER
}

fn loggable_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            if is_sensitive(name.as_str()) {
                Some((name.to_string(), "[REDACTED]".to_string()))
            } else {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            }
        })
        .collect()
}

pub fn make_custom_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri().path(),
        query = ?request.uri().query(),
        request_id = request_id,
        user_agent = ?request.headers().get("user-agent"),
    )
}

pub fn on_custom_request(request: &Request<Body>, _span: &Span) {
    tracing::info!(
        method = %request.method(),
        uri = %request.uri(),
        headers = ?loggable_headers(request.headers()),
        "Incoming HTTP request"
    );
}

pub fn on_custom_response(response: &Response<Body>, latency: Duration, _span: &Span) {
    let status = response.status();
    let latency_ms = latency.as_millis();

    if status.is_server_error() {
        tracing::error!(status = %status, latency_ms, "HTTP request completed with server error");
    } else if status.is_client_error() {
        tracing::warn!(status = %status, latency_ms, "HTTP request completed with client error");
    } else {
        tracing::info!(status = %status, latency_ms, "HTTP request completed successfully");
    }
}

pub fn on_custom_failure(error: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
    let error_type = match &error {
        ServerErrorsFailureClass::StatusCode(code) => format!("HTTP {}", code.as_u16()),
        ServerErrorsFailureClass::Error(_) => "Internal Error".to_string(),
    };

    tracing::error!(
        error = ?error,
        latency_ms = latency.as_millis(),
        error_type = error_type,
        "HTTP request failed"
    );
}
