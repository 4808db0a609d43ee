use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE, HOST, ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use regex::{Regex, RegexBuilder};
use serde_json::json;

use crate::error::{Result, SurgeonError};

const DEFAULT_ORIGIN_PATTERNS: [&str; 2] = [
    r"^https?://localhost(:\d+)?$",
    r"^https://[a-z0-9-]+\.github\.io$",
];

pub const REJECTED_ORIGIN_MESSAGE: &str = "Origin is not allowed by CORS policy";

/// Allow-list of browser origins.
#[derive(Debug)]
pub struct CorsPolicy {
    configured: Vec<String>,
    patterns: Vec<Regex>,
}

impl CorsPolicy {
    pub fn new(configured: &[String]) -> Result<Self> {
        let patterns = DEFAULT_ORIGIN_PATTERNS
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| SurgeonError::Config(format!("Bad origin pattern: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            configured: configured
                .iter()
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            patterns,
        })
    }

    /// An origin is allowed when it is the service's own origin, listed in
    /// configuration, or matches a default pattern.
    pub fn is_allowed(&self, origin: &str, host: Option<&str>) -> bool {
        if let Some(host) = host {
            if origin == format!("http://{host}") || origin == format!("https://{host}") {
                return true;
            }
        }

        self.configured.iter().any(|allowed| allowed == origin)
            || self.patterns.iter().any(|pattern| pattern.is_match(origin))
    }

    fn decorate(&self, origin: &str, allowed: bool, headers: &mut HeaderMap) {
        if allowed {
            if let Ok(value) = HeaderValue::from_str(origin) {
                headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
                headers.insert(VARY, HeaderValue::from_static("Origin"));
            }
        }
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        );
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    }
}

/// Middleware applying [`CorsPolicy`] to every route.
///
/// Requests without an `Origin` header pass through untouched, except that a
/// preflight always ends here with 204.
pub async fn enforce(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let is_preflight = request.method() == Method::OPTIONS;
    let Some(origin) = header_str(request.headers(), ORIGIN) else {
        return if is_preflight {
            StatusCode::NO_CONTENT.into_response()
        } else {
            next.run(request).await
        };
    };

    let host = header_str(request.headers(), HOST);
    let allowed = policy.is_allowed(&origin, host.as_deref());

    let mut response = if !allowed {
        log::warn!("Rejected request from origin {origin}");
        (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": REJECTED_ORIGIN_MESSAGE })),
        )
            .into_response()
    } else if is_preflight {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    policy.decorate(&origin, allowed, response.headers_mut());
    response
}

fn header_str(headers: &HeaderMap, name: axum::http::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}
