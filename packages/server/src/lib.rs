pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod manifest;
pub mod models;
pub mod routes;
pub mod services;
pub mod signer;
pub mod state;
pub mod utils;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Airlift OTA Update Server API",
        version = "1.0.0",
        description = "Over-the-air update server: signed manifests, content-addressed assets, atomic release activation and rollback"
    ),
    tags(
        (name = "Update Protocol", description = "Endpoints consumed by deployed apps"),
        (name = "Releases", description = "Release upload and lifecycle management"),
        (name = "Channels", description = "Deployment channel management"),
        (name = "Stats", description = "Deployment statistics and health"),
        (name = "Admin", description = "Operational endpoints"),
    ),
)]
struct ApiDoc;

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(config.max_age));

    if config.allow_origins.is_empty() || config.allow_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allow_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server.cors);
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(routes::api_routes())
        .split_for_parts();

    router
        .layer(cors)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
}
