//! Axum HTTP server

use axum::http::{header, HeaderValue, Method};
use axum::{extract::Request, middleware::Next, response::Response, Router};
use showbridge_core::ServerConfig;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use super::routes::build_router;
use crate::{error::ControlError, hub::HubHandle, Result};

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    pub started: Instant,
}

impl AppState {
    pub fn new(hub: HubHandle) -> Self {
        Self {
            hub,
            started: Instant::now(),
        }
    }
}

/// Build the complete application with middleware
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any);

    build_router()
        .layer(axum::middleware::from_fn(security_headers))
        .layer(cors)
        .with_state(state)
}

/// Client-facing WebSocket and HTTP server
pub struct WebServer {
    listener: TcpListener,
}

impl WebServer {
    /// Bind the listening socket
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .map_err(|e| {
                ControlError::ServerError(format!(
                    "Failed to bind {}:{}: {}",
                    config.host, config.port, e
                ))
            })?;
        Ok(Self { listener })
    }

    /// Address actually bound
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves
    pub async fn run<F>(self, hub: HubHandle, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Client server listening on {}", self.local_addr()?);

        axum::serve(self.listener, app(AppState::new(hub)))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ControlError::ServerError(format!("Server error: {}", e)))
    }
}

/// Security headers middleware
async fn security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use tower::Service;

    #[tokio::test]
    async fn test_security_headers() {
        let mut app = Router::new()
            .route("/", axum::routing::get(|| async { "Hello" }))
            .layer(axum::middleware::from_fn(security_headers));

        let response = app
            .call(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers
                .get("X-Content-Type-Options")
                .and_then(|h| h.to_str().ok()),
            Some("nosniff")
        );
        assert_eq!(
            headers.get("X-Frame-Options").and_then(|h| h.to_str().ok()),
            Some("DENY")
        );
        assert_eq!(
            headers.get("Referrer-Policy").and_then(|h| h.to_str().ok()),
            Some("no-referrer")
        );
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let server = WebServer::bind(&config).await.unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }
}
