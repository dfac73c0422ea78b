//! HTTP middleware (CORS, 404 handler)

use axum::Json;
use axum::extract::Request;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::IntoResponse;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::core::constants::USER_HEADER;

/// Origins allowed to call the API from a browser
#[derive(Debug, Clone)]
pub struct AllowedOrigins {
    origins: Vec<String>,
}

impl AllowedOrigins {
    /// Origins for the bound host and port, plus the next port for a dev UI
    pub fn new(host: &str, port: u16) -> Self {
        let dev_port = port.saturating_add(1);

        let base_hosts: Vec<&str> = if is_local_or_any(host) {
            vec!["localhost", "127.0.0.1"]
        } else {
            vec![host]
        };

        let origins = base_hosts
            .iter()
            .flat_map(|h| {
                [
                    format!("http://{}:{}", h, port),
                    format!("http://{}:{}", h, dev_port),
                    format!("http://{}", h),
                ]
            })
            .collect();

        Self { origins }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    fn as_header_values(&self) -> Vec<HeaderValue> {
        self.origins.iter().filter_map(|o| o.parse().ok()).collect()
    }
}

fn is_local_or_any(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "127.0.0.1" | "localhost")
}

pub fn cors(allowed: &AllowedOrigins) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed.as_header_values()))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            header::CACHE_CONTROL,
            header::HeaderName::from_static(USER_HEADER),
        ])
        .expose_headers([header::CONTENT_DISPOSITION])
}

/// JSON 404 for unknown routes
pub async fn handle_404(req: Request) -> impl IntoResponse {
    tracing::debug!(method = %req.method(), uri = %req.uri(), "[404]");
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "not_found",
            "code": "ROUTE_NOT_FOUND",
            "message": format!("No route for {} {}", req.method(), req.uri().path()),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_origins() {
        let origins = AllowedOrigins::new("127.0.0.1", 5390);
        assert!(origins.is_allowed("http://localhost:5390"));
        assert!(origins.is_allowed("http://127.0.0.1:5391"));
        assert!(!origins.is_allowed("http://example.com"));
    }

    #[test]
    fn test_named_host_origins() {
        let origins = AllowedOrigins::new("tables.internal", 8080);
        assert!(origins.is_allowed("http://tables.internal:8080"));
        assert!(origins.is_allowed("http://tables.internal"));
        assert!(!origins.is_allowed("http://localhost:8080"));
    }
}
