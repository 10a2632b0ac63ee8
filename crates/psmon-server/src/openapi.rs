use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use utoipa::openapi::OpenApi;

pub const OPENAPI_JSON_PATH: &str = "/api/openapi.json";

pub fn json_route(spec: Arc<OpenApi>) -> Router {
    Router::new().route(
        OPENAPI_JSON_PATH,
        get(move || {
            let spec = spec.clone();
            async move { Json(spec.as_ref().clone()) }
        }),
    )
}
