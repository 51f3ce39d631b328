//! API layer - HTTP handlers and routing
//!
//! Everything lives under `/api/v1`:
//! - account endpoints (`auth`)
//! - the product catalog (`products`)
//! - a health probe (`health`)
//!
//! A configured static directory is served for every other path.

pub mod auth;
pub mod health;
pub mod middleware;
pub mod products;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::ServerConfig;

pub use middleware::{admin_only, authenticated, ApiError, AppState, AuthenticatedUser};

/// `{"message": ...}` acknowledgement body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Build the `/api/v1` router
pub fn build_api_router(state: &AppState) -> Router<AppState> {
    let admin_routes = admin_only(products::admin_router(), state);
    let protected_routes = authenticated(auth::protected_router(), state);

    Router::new()
        .merge(auth::public_router())
        .merge(products::public_router())
        .merge(health::router())
        .merge(protected_routes)
        .merge(admin_routes)
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            if origin.trim() == "*" {
                anyhow::bail!("Wildcard CORS origin cannot be used with credentials");
            }
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::COOKIE,
        ])
        .allow_credentials(true))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, server: &ServerConfig) -> anyhow::Result<Router> {
    let mut router = Router::new().nest("/api/v1", build_api_router(&state));

    if let Some(dir) = &server.static_dir {
        tracing::info!("Serving static files from {}", dir.display());
        router = router.fallback_service(ServeDir::new(dir));
    }

    Ok(router
        .layer(cors_layer(&server.cors_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
