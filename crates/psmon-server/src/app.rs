use crate::state::AppState;
use crate::{api, logging, openapi};
use axum::middleware;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "psmon API",
        description = "Host disk, memory and platform monitoring",
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "System", description = "Platform identity, memory and storage maintenance"),
        (name = "Disk", description = "Live and historical disk usage")
    )
)]
struct ApiDoc;

/// Builds the full HTTP application: JSON API, OpenAPI document and the
/// static dashboard, wrapped in CORS and request logging.
pub fn build_http_app(state: AppState) -> Router {
    let (api_router, api_spec) = api::api_routes().split_for_parts();

    let mut merged_spec = ApiDoc::openapi();
    merged_spec.merge(api_spec);
    let spec = Arc::new(merged_spec);

    let static_dir = state.config.static_dir.clone();
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api_router
        .with_state(state)
        .merge(openapi::json_route(spec))
        .nest_service("/static", ServeDir::new(&static_dir))
        .fallback_service(ServeDir::new(&static_dir))
        .layer(cors)
        .layer(middleware::from_fn(logging::request_logging))
}
