//! Security Middleware for the marketplace API
//!
//! Provides:
//! - Bearer token authentication
//! - Admin role guard
//! - Request body size limits
//! - Security headers
//! - Request logging with sanitization

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::access::RequestOrigin;
use crate::error::{MarketError, MarketResult};
use crate::models::Actor;
use crate::store::MarketStore;

/// Security configuration for middleware
#[derive(Debug, Clone)]
pub struct SecurityMiddlewareConfig {
    /// Maximum request body size in bytes
    pub max_request_size: usize,
    /// Enable request logging
    pub log_requests: bool,
    /// Sanitize client addresses in logs
    pub sanitize_logs: bool,
}

impl Default for SecurityMiddlewareConfig {
    fn default() -> Self {
        Self {
            max_request_size: 64 * 1024,
            log_requests: true,
            sanitize_logs: true,
        }
    }
}

/// Bearer token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Actor id
    pub sub: Uuid,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// HS256 token verification (and issuance, for sibling services and tests)
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn issue(&self, actor_id: Uuid, ttl: Duration) -> MarketResult<String> {
        let claims = Claims {
            sub: actor_id,
            exp: (Utc::now() + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| MarketError::Unexpected(format!("token encoding: {}", e)))
    }

    /// Actor id carried by a valid, unexpired token
    pub fn verify(&self, token: &str) -> MarketResult<Uuid> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                MarketError::Unauthenticated
            })
    }
}

/// The caller, as loaded from storage by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct AuthenticatedActor(pub Actor);

/// Shared state for security middleware
#[derive(Clone)]
pub struct SecurityState {
    pub config: SecurityMiddlewareConfig,
    pub tokens: Arc<TokenVerifier>,
    pub store: Arc<dyn MarketStore>,
}

impl SecurityState {
    pub fn new(
        config: SecurityMiddlewareConfig,
        tokens: Arc<TokenVerifier>,
        store: Arc<dyn MarketStore>,
    ) -> Self {
        Self {
            config,
            tokens,
            store,
        }
    }
}

/// Extract client IP from request, handling proxies
pub fn get_client_ip(headers: &HeaderMap, addr: Option<&SocketAddr>) -> Option<String> {
    // Check X-Forwarded-For header (from reverse proxy)
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            // Take the first IP (original client)
            if let Some(ip) = value.split(',').next().map(str::trim).filter(|ip| !ip.is_empty()) {
                return Some(ip.to_string());
            }
        }
    }

    // Check X-Real-IP header
    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip) = real_ip.to_str() {
            return Some(ip.trim().to_string());
        }
    }

    // Fall back to socket address
    addr.map(|a| a.ip().to_string())
}

fn connect_addr(request: &Request) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Origin and agent of the request, for the audit trail
pub fn request_origin(request: &Request) -> RequestOrigin {
    let headers = request.headers();
    RequestOrigin {
        address: get_client_ip(headers, connect_addr(request).as_ref()),
        agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

/// Sanitize value for logging (mask sensitive data)
pub fn sanitize_for_log(value: &str) -> String {
    if value.len() <= 8 || !value.is_ascii() {
        return "*".repeat(value.chars().count());
    }
    format!("{}...{}", &value[..4], &value[value.len() - 4..])
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware
///
/// Resolves the bearer token to a stored actor and attaches
/// [`AuthenticatedActor`] and [`RequestOrigin`] to the request.
pub async fn auth_middleware(
    State(state): State<SecurityState>,
    mut request: Request,
    next: Next,
) -> Result<Response, MarketError> {
    let path = request.uri().path().to_string();

    let Some(token) = bearer_token(request.headers()) else {
        warn!("Missing bearer token for path: {}", path);
        return Err(MarketError::Unauthenticated);
    };

    let actor_id = state.tokens.verify(token)?;
    let Some(actor) = state.store.get_actor(actor_id).await? else {
        warn!(actor_id = %actor_id, "Token for unknown user on path: {}", path);
        return Err(MarketError::Unauthenticated);
    };

    debug!(actor_id = %actor.id, role = %actor.role, "Authenticated for path: {}", path);
    let origin = request_origin(&request);
    request.extensions_mut().insert(origin);
    request.extensions_mut().insert(AuthenticatedActor(actor));

    Ok(next.run(request).await)
}

/// Admin guard; must run inside [`auth_middleware`]
pub async fn require_admin_middleware(request: Request, next: Next) -> Result<Response, MarketError> {
    let is_admin = match request.extensions().get::<AuthenticatedActor>() {
        Some(AuthenticatedActor(actor)) if actor.is_admin() => true,
        Some(AuthenticatedActor(actor)) => {
            warn!(
                actor_id = %actor.id,
                path = %request.uri().path(),
                "Non-admin attempted admin route"
            );
            false
        }
        None => return Err(MarketError::Unauthenticated),
    };

    if !is_admin {
        return Err(MarketError::forbidden("Admin access required"));
    }
    Ok(next.run(request).await)
}

/// Security headers middleware
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        "Strict-Transport-Security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // Contact details must never be cached by intermediaries
    headers.insert(
        "Cache-Control",
        HeaderValue::from_static("no-store, no-cache, must-revalidate"),
    );

    headers.remove("Server");

    response
}

/// Request logging middleware with sanitization
pub async fn logging_middleware(
    State(state): State<SecurityState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.log_requests {
        return next.run(request).await;
    }

    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client_ip = get_client_ip(request.headers(), connect_addr(&request).as_ref())
        .unwrap_or_else(|| "unknown".to_string());

    let log_ip = if state.config.sanitize_logs {
        sanitize_for_log(&client_ip)
    } else {
        client_ip
    };

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            client_ip = %log_ip,
            "Request failed"
        );
    } else if status.is_client_error() {
        warn!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            client_ip = %log_ip,
            "Client error"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            client_ip = %log_ip,
            "Request completed"
        );
    }

    response
}

/// Request body size validation middleware
pub async fn body_size_middleware(
    State(state): State<SecurityState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if let Some(length) = length {
        if length > state.config.max_request_size {
            warn!(
                "Request body too large: {} bytes (max: {})",
                length, state.config.max_request_size
            );
            return Err(StatusCode::PAYLOAD_TOO_LARGE);
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-with-at-least-32-chars";

    #[test]
    fn test_token_roundtrip_and_rejection() {
        let verifier = TokenVerifier::new(SECRET);
        let id = Uuid::new_v4();

        let token = verifier.issue(id, Duration::hours(1)).unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), id);

        let other = TokenVerifier::new("another-secret-that-is-also-32-chars-long");
        assert!(matches!(other.verify(&token), Err(MarketError::Unauthenticated)));

        let expired = verifier.issue(id, Duration::hours(-2)).unwrap();
        assert!(matches!(verifier.verify(&expired), Err(MarketError::Unauthenticated)));

        assert!(verifier.verify("not-a-token").is_err());
    }

    #[test]
    fn test_sanitize_for_log() {
        assert_eq!(sanitize_for_log("short"), "*****");
        assert_eq!(sanitize_for_log("abcdefghij"), "abcd...ghij");
        let result = sanitize_for_log("192.168.1.100");
        assert!(result.starts_with("192."));
        assert!(result.ends_with(".100"));
        assert!(result.contains("..."));
    }

    #[test]
    fn test_client_ip_precedence() {
        let addr: SocketAddr = "10.0.0.5:4000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(get_client_ip(&headers, Some(&addr)).as_deref(), Some("10.0.0.5"));
        assert_eq!(get_client_ip(&headers, None), None);

        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.7"));
        assert_eq!(get_client_ip(&headers, Some(&addr)).as_deref(), Some("198.51.100.7"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(get_client_ip(&headers, Some(&addr)).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }
}
