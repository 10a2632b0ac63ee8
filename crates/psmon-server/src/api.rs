pub mod disk;
pub mod system;

use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Error envelope (`data` is always null).
#[derive(Serialize, ToSchema)]
pub struct ApiError {
    pub err_code: i32,
    pub err_msg: String,
    pub trace_id: String,
}

/// Envelope wrapping every JSON response.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    /// 0 on success
    pub err_code: i32,
    pub err_msg: String,
    pub trace_id: String,
    pub data: Option<T>,
}

pub fn success_response<T>(status: StatusCode, trace_id: &str, data: T) -> Response
where
    T: Serialize,
{
    (
        status,
        Json(ApiResponse {
            err_code: 0,
            err_msg: "success".to_string(),
            trace_id: trace_id.to_string(),
            data: Some(data),
        }),
    )
        .into_response()
}

fn to_custom_error_code(code: &str) -> i32 {
    match code {
        "bad_request" => 1001,
        "not_found" => 1004,
        "collector_error" => 1201,
        "internal_error" => 1500,
        "storage_error" => 1501,
        _ => 1999,
    }
}

pub fn error_response(status: StatusCode, trace_id: &str, code: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: to_custom_error_code(code),
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

/// Runs blocking storage or collector work off the async workers.
pub(crate) async fn run_blocking<T, E, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<anyhow::Error> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?.map_err(Into::into)
}

#[derive(Serialize, ToSchema)]
struct HealthResponse {
    version: String,
    uptime_secs: i64,
    /// Whether the background disk sampler loop is alive
    sampler_running: bool,
    /// Stored disk usage samples; null when the database is unreadable
    sample_count: Option<u64>,
    /// "ok" or "error"
    storage_status: String,
}

/// Service health, sampler state and sample count.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    )
)]
async fn health(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let uptime = (Utc::now() - state.start_time).num_seconds();
    let store = state.store.clone();
    let sample_count = match run_blocking(move || store.count()).await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::error!(error = %e, "Health check could not count samples");
            None
        }
    };
    success_response(
        StatusCode::OK,
        &trace_id,
        HealthResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: uptime,
            sampler_running: state.sampler_running(),
            storage_status: if sample_count.is_some() { "ok" } else { "error" }.to_string(),
            sample_count,
        },
    )
}

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .merge(system::system_routes())
        .merge(disk::disk_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(to_custom_error_code("bad_request"), 1001);
        assert_eq!(to_custom_error_code("storage_error"), 1501);
        assert_eq!(to_custom_error_code("something_else"), 1999);
    }

    #[tokio::test]
    async fn blocking_errors_are_propagated() {
        let ok: anyhow::Result<u8> = run_blocking(|| Ok::<_, std::io::Error>(7)).await;
        assert_eq!(ok.unwrap(), 7);

        let err = run_blocking(|| {
            Err::<u8, _>(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
