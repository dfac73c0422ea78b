//! API server initialization

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{self, AllowedOrigins};
use super::routes::{employees, health, timezones, views};
use crate::core::CoreApp;
use crate::core::config::AppConfig;
use crate::core::constants::MAX_REQUEST_BODY_BYTES;
use crate::data::DataServices;

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Serve until shutdown is triggered; returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let app = self.app;
        let shutdown = app.shutdown.clone();

        let host = app.config.server.host.clone();
        let port = app.config.server.port;
        let addr = SocketAddr::new(
            host.parse()
                .with_context(|| format!("Invalid server host: {}", host))?,
            port,
        );

        let router = router(&app.config, &app.data);

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!("Listening on http://{}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        Ok(app)
    }
}

/// Full application router
pub fn router(config: &AppConfig, data: &DataServices) -> Router {
    let allowed_origins = AllowedOrigins::new(&config.server.host, config.server.port);

    let employees_routes = employees::routes(data.duckdb.clone(), config.table.clone());
    let views_routes = views::routes(data.views(), config.table.options.max_views);

    Router::new()
        .route("/api/v1/health", get(health::health))
        .route("/api/v1/timezones", get(timezones::list_timezones))
        .nest("/api/v1/employees", employees_routes)
        .nest("/api/v1/views", views_routes)
        .fallback(middleware::handle_404)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(middleware::cors(&allowed_origins))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{DatabaseConfig, ServerConfig, TableConfig};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5390,
            },
            table: TableConfig::default(),
            database: DatabaseConfig {
                data_dir: None,
                in_memory: true,
                seed_rows: 0,
            },
        }
    }

    async fn test_router() -> Router {
        let data = DataServices::in_memory().await.unwrap();
        data.duckdb.seed_employees(30).await.unwrap();
        router(&config(), &data)
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router()
            .await
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = test_router()
            .await
            .oneshot(Request::get("/api/v1/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_nested_routes_are_mounted() {
        let router = test_router().await;

        let response = router
            .clone()
            .oneshot(
                Request::get("/api/v1/employees/config")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::post("/api/v1/views/load")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"tableViewSaveKey":"employees"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
