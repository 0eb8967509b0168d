use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{self, HeaderValue},
        Method, Request, Response, StatusCode,
    },
    middleware::Next,
};
use tracing::debug;

/// Origins the dashboard SPA may call from
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    /// `*` reflects any origin, except in production
    pub allow_wildcard: bool,
}

impl CorsPolicy {
    pub fn new(allowed_origins: Vec<String>, production: bool) -> Self {
        let has_wildcard = allowed_origins.iter().any(|o| o == "*");
        Self {
            allowed_origins,
            allow_wildcard: has_wildcard && !production,
        }
    }

    pub fn from_config() -> Self {
        let config = crate::app_config::config();
        Self::new(config.cors_allowed_origins.clone(), config.is_production())
    }

    /// The origin to echo back, if the request's origin is allowed
    pub fn allowed_origin(&self, origin: Option<&str>) -> Option<String> {
        let origin = origin?;
        if self.allow_wildcard {
            debug!("CORS: Reflecting origin for non-production wildcard: {}", origin);
            return Some(origin.to_string());
        }
        if self.allowed_origins.iter().any(|o| o == origin) {
            Some(origin.to_string())
        } else {
            debug!("CORS: Origin not in whitelist: {}", origin);
            None
        }
    }
}

fn insert_origin_headers(response: &mut Response<Body>, origin: &str) {
    if let Ok(value) = HeaderValue::from_str(origin) {
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(header::VARY, HeaderValue::from_static("origin"));
    }
}

/// Answers preflight requests and decorates responses for allowed origins
pub async fn dynamic_cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response<Body>, StatusCode> {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let allowed_origin = policy.allowed_origin(origin.as_deref());

    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        if let Some(allowed) = &allowed_origin {
            insert_origin_headers(&mut response, allowed);
            let headers = response.headers_mut();
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("content-type, authorization, accept, origin"),
            );
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("3600"));
        }
        *response.status_mut() = StatusCode::NO_CONTENT;
        return Ok(response);
    }

    let mut response = next.run(req).await;
    if let Some(allowed) = &allowed_origin {
        insert_origin_headers(&mut response, allowed);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelist() {
        let policy = CorsPolicy::new(vec!["http://localhost:5173".to_string()], false);
        assert_eq!(
            policy.allowed_origin(Some("http://localhost:5173")).as_deref(),
            Some("http://localhost:5173")
        );
        assert_eq!(policy.allowed_origin(Some("https://evil.example")), None);
        assert_eq!(policy.allowed_origin(None), None);
    }

    #[test]
    fn test_wildcard_ignored_in_production() {
        let origins = vec!["*".to_string()];
        assert!(CorsPolicy::new(origins.clone(), false)
            .allowed_origin(Some("https://preview.example"))
            .is_some());
        assert!(CorsPolicy::new(origins, true)
            .allowed_origin(Some("https://preview.example"))
            .is_none());
    }
}
