//! HTTP Basic Authentication for the admin surface

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AdminAuthConfig {
    /// Username for the admin surface (None = auth disabled)
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AdminAuthConfig {
    /// ADMIN_USERNAME and ADMIN_PASSWORD must both be set to enable auth
    pub fn from_env() -> Self {
        let read = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let username = read("ADMIN_USERNAME");
        let password = read("ADMIN_PASSWORD");

        if username.is_some() && password.is_some() {
            tracing::info!("Admin authentication enabled");
            Self { username, password }
        } else {
            if username.is_some() || password.is_some() {
                tracing::warn!(
                    "ADMIN_USERNAME and ADMIN_PASSWORD must both be set to enable authentication"
                );
            }
            tracing::warn!("Admin authentication DISABLED - anyone can edit the roster!");
            Self::disabled()
        }
    }

    pub fn disabled() -> Self {
        Self {
            username: None,
            password: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    pub fn validate(&self, username: &str, password: &str) -> bool {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => {
                constant_time_eq(u.as_bytes(), username.as_bytes())
                    && constant_time_eq(p.as_bytes(), password.as_bytes())
            }
            _ => true,
        }
    }

    /// Check a raw `Authorization` header value
    fn accepts_header(&self, value: &str) -> bool {
        let Some(credentials) = value.strip_prefix("Basic ") else {
            return false;
        };
        let Ok(decoded) = STANDARD.decode(credentials.trim()) else {
            return false;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return false;
        };
        decoded
            .split_once(':')
            .is_some_and(|(user, pass)| self.validate(user, pass))
    }

    fn accepts(&self, request: &Request<Body>) -> bool {
        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| self.accepts_header(v))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn unauthorized(realm: &str) -> Response<Body> {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{}\"", realm))],
        "Unauthorized",
    )
        .into_response()
}

/// Middleware for HTTP Basic Authentication on admin routes
pub async fn admin_auth_middleware(
    State(auth_config): State<Arc<AdminAuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if !auth_config.is_enabled() || auth_config.accepts(&request) {
        return next.run(request).await;
    }
    unauthorized("Squad Wheel Admin")
}

fn query_param_equals(request: &Request<Body>, key: &str, expected: &str) -> bool {
    let Some(query) = request.uri().query() else {
        return false;
    };
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .any(|(k, v)| k == key && v == expected)
}

/// Require HTTP Basic Auth for `/ws?role=admin` so viewers cannot take over
/// the admin session.
pub async fn admin_ws_auth_middleware(
    State(auth_config): State<Arc<AdminAuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if !query_param_equals(&request, "role", "admin") {
        return next.run(request).await;
    }

    if !auth_config.is_enabled() {
        tracing::warn!(
            "Admin WebSocket requested but admin authentication is DISABLED; set ADMIN_USERNAME and ADMIN_PASSWORD"
        );
        return next.run(request).await;
    }

    if auth_config.accepts(&request) {
        return next.run(request).await;
    }
    unauthorized("Squad Wheel Admin (WebSocket)")
}

/// Kept outside `static/` so the public file fallback cannot serve it
const ADMIN_PAGE: &str = "pages/admin.html";

/// Serve the admin page (mounted behind the auth middleware)
pub async fn serve_admin() -> impl IntoResponse {
    match tokio::fs::read_to_string(ADMIN_PAGE).await {
        Ok(content) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            content,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Admin page not found").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> AdminAuthConfig {
        AdminAuthConfig {
            username: Some("admin".to_string()),
            password: Some("secret".to_string()),
        }
    }

    #[test]
    fn test_query_param_equals() {
        let req = Request::builder()
            .uri("/ws?role=admin&x=1")
            .body(Body::empty())
            .unwrap();
        assert!(query_param_equals(&req, "role", "admin"));
        assert!(!query_param_equals(&req, "role", "viewer"));
        assert!(!query_param_equals(&req, "missing", "x"));
    }

    #[test]
    fn test_auth_config_disabled_when_incomplete() {
        let config = AdminAuthConfig::disabled();
        assert!(!config.is_enabled());
        assert!(config.validate("any", "thing"));

        let config = AdminAuthConfig {
            username: Some("user".to_string()),
            password: None,
        };
        assert!(!config.is_enabled());
    }

    #[test]
    fn test_auth_config_enabled() {
        let config = enabled();
        assert!(config.is_enabled());
        assert!(config.validate("admin", "secret"));
        assert!(!config.validate("admin", "wrong"));
        assert!(!config.validate("wrong", "secret"));
        assert!(!config.validate("", ""));
    }

    #[test]
    fn test_accepts_header() {
        let config = enabled();
        // "admin:secret"
        assert!(config.accepts_header("Basic YWRtaW46c2VjcmV0"));
        // "user:pass"
        assert!(!config.accepts_header("Basic dXNlcjpwYXNz"));
        assert!(!config.accepts_header("Bearer YWRtaW46c2VjcmV0"));
        assert!(!config.accepts_header("Basic !!!"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(constant_time_eq(b"", b""));
    }
}
