//! Security headers middleware
//!
//! Adds to every response:
//! - X-Content-Type-Options: nosniff
//! - X-Frame-Options: DENY
//! - Referrer-Policy: strict-origin-when-cross-origin
//!
//! and, only when `force_https` is configured, Strict-Transport-Security and
//! a Content-Security-Policy.

use crate::config::ApiConfig;
use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Security headers configuration
#[derive(Debug, Clone)]
pub struct SecurityHeadersConfig {
    /// Content-Security-Policy header value, if any
    pub csp: Option<String>,
    /// Strict-Transport-Security header value, if any
    pub hsts: Option<String>,
    /// X-Frame-Options header value
    pub frame_options: String,
    /// X-Content-Type-Options header value
    pub content_type_options: String,
    /// Referrer-Policy header value
    pub referrer_policy: String,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            csp: None,
            hsts: None,
            frame_options: "DENY".to_string(),
            content_type_options: "nosniff".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
        }
    }
}

impl SecurityHeadersConfig {
    /// Headers for the download API
    ///
    /// The CSP still allows same-origin scripts and styles so the Swagger UI
    /// keeps working behind HTTPS.
    pub fn from_api_config(api: &ApiConfig) -> Self {
        if !api.force_https {
            return Self::default();
        }

        Self {
            csp: Some(
                concat!(
                    "default-src 'self'; ",
                    "style-src 'self' 'unsafe-inline'; ",
                    "img-src 'self' data:; ",
                    "frame-ancestors 'none'; ",
                    "base-uri 'self'; ",
                    "form-action 'self'"
                )
                .to_string(),
            ),
            hsts: Some("max-age=31536000; includeSubDomains".to_string()),
            ..Self::default()
        }
    }
}

/// Security headers middleware function
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn security_headers_middleware(
    State(config): State<Arc<SecurityHeadersConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    if let Some(csp) = &config.csp
        && let Ok(value) = HeaderValue::from_str(csp)
    {
        headers.insert(header::CONTENT_SECURITY_POLICY, value);
    }

    if let Some(hsts) = &config.hsts
        && let Ok(value) = HeaderValue::from_str(hsts)
    {
        headers.insert(header::STRICT_TRANSPORT_SECURITY, value);
    }

    if let Ok(value) = HeaderValue::from_str(&config.content_type_options) {
        headers.insert(header::X_CONTENT_TYPE_OPTIONS, value);
    }

    if let Ok(value) = HeaderValue::from_str(&config.frame_options) {
        headers.insert(header::X_FRAME_OPTIONS, value);
    }

    if let Ok(value) = HeaderValue::from_str(&config.referrer_policy) {
        headers.insert(header::REFERRER_POLICY, value);
    }

    response
}
