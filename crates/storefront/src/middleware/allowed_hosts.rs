//! Host header allow list.
//!
//! Entries match the request host exactly, except that an entry starting
//! with `.` also matches any subdomain. An empty list allows every host.

use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header::HOST},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::state::AppState;

/// Whether `host` (with or without a port) is in `allowed`.
#[must_use]
pub fn host_allowed(allowed: &[String], host: &str) -> bool {
    if allowed.is_empty() {
        return true;
    }

    let host = strip_port(host.trim()).to_ascii_lowercase();
    if host.is_empty() {
        return false;
    }

    allowed.iter().any(|entry| match entry.strip_prefix('.') {
        Some(domain) => host == domain || host.ends_with(entry.as_str()),
        None => host == *entry || entry == "*",
    })
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literal
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or_default();
    }
    host.rsplit_once(':')
        .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
        .map_or(host, |(name, _)| name)
}

/// Reject requests whose `Host` header is not allowed.
pub async fn allowed_hosts_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let allowed = &state.config().allowed_hosts;
    let host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().host())
        .unwrap_or_default();

    if host_allowed(allowed, host) {
        next.run(request).await
    } else {
        tracing::warn!(host = %host, "Rejected request for disallowed host");
        (StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid host" }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(list: &[&str]) -> Vec<String> {
        list.iter().map(|h| (*h).to_string()).collect()
    }

    #[test]
    fn test_empty_list_allows_all() {
        assert!(host_allowed(&[], "anything.example"));
    }

    #[test]
    fn test_exact_and_port() {
        let allowed = hosts(&["api.ojasritu.co.in", "localhost"]);
        assert!(host_allowed(&allowed, "api.ojasritu.co.in"));
        assert!(host_allowed(&allowed, "API.ojasritu.co.in:443"));
        assert!(host_allowed(&allowed, "localhost:8000"));
        assert!(!host_allowed(&allowed, "evil.co.in"));
        assert!(!host_allowed(&allowed, ""));
    }

    #[test]
    fn test_subdomain_wildcard() {
        let allowed = hosts(&[".ojasritu.co.in"]);
        assert!(host_allowed(&allowed, "ojasritu.co.in"));
        assert!(host_allowed(&allowed, "www.ojasritu.co.in"));
        assert!(!host_allowed(&allowed, "notojasritu.co.in"));
    }

    #[test]
    fn test_ipv6_literal() {
        let allowed = hosts(&["::1"]);
        assert!(host_allowed(&allowed, "[::1]:8000"));
    }
}
