//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Signing pipeline
        .route("/api/sign", post(handlers::sign_package))
        // OTA install manifest
        .route("/api/manifest/{filename}", get(handlers::get_manifest))
        // Artifact registry
        .route("/api/files", get(handlers::list_artifacts))
        .route("/api/files/{filename}", delete(handlers::delete_artifact))
        // Health check (intentionally unauthenticated for load balancers)
        .route("/api/health", get(handlers::health_check));

    let public_routes = Router::new()
        .route("/", get(handlers::landing_page))
        .route("/output/{filename}", get(handlers::download_artifact));

    let mut router = Router::new().merge(api_routes).merge(public_routes);

    if let Some(cors) = cors_layer(&state.config.server.allowed_origins) {
        router = router.layer(cors);
    }

    // Whole-body cap: three file parts plus multipart framing. The per-file
    // limit is enforced while each part is streamed to disk.
    let body_limit = state
        .config
        .server
        .max_upload_bytes
        .saturating_mul(3)
        .saturating_add(1024 * 1024);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the CORS layer from configured origins.
///
/// Empty list disables CORS entirely; a literal "*" allows any origin.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    if origins.iter().any(|o| o == "*") {
        return Some(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let values = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "invalid cors origin");
                None
            }
        })
        .collect::<Vec<_>>();

    if values.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(values))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
