use crate::api::{error_response, run_blocking, success_response};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use psmon_common::types::{MemoryUsage, SystemInfo};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Platform identity of the monitored host.
#[utoipa::path(
    get,
    path = "/api/system/info",
    tag = "System",
    responses(
        (status = 200, description = "Platform identity", body = SystemInfo)
    )
)]
async fn get_system_info(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    success_response(StatusCode::OK, &trace_id, state.system_info.as_ref())
}

/// Current physical memory and swap usage, in bytes.
#[utoipa::path(
    get,
    path = "/api/memory/usage",
    tag = "System",
    responses(
        (status = 200, description = "Memory usage", body = MemoryUsage),
        (status = 500, description = "Collection failed", body = crate::api::ApiError)
    )
)]
async fn get_memory_usage(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let memory = state.memory.clone();
    let result = run_blocking(move || {
        let mut collector = memory.lock().unwrap_or_else(|p| p.into_inner());
        Ok::<_, anyhow::Error>(collector.collect())
    })
    .await;

    match result {
        Ok(usage) => success_response(StatusCode::OK, &trace_id, usage),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read memory usage");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "collector_error",
                "Failed to read memory usage",
            )
        }
    }
}

#[derive(Serialize, ToSchema)]
struct CleanupResult {
    /// Samples removed
    deleted: usize,
    retention_days: u32,
}

/// Deletes samples older than the configured retention horizon right away.
#[utoipa::path(
    post,
    path = "/api/system/storage/cleanup",
    tag = "System",
    responses(
        (status = 200, description = "Cleanup result", body = CleanupResult),
        (status = 500, description = "Storage failure", body = crate::api::ApiError)
    )
)]
async fn trigger_cleanup(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let retention_days = state.config.retention_days;
    let store = state.store.clone();
    match run_blocking(move || store.delete_older_than(retention_days)).await {
        Ok(deleted) => {
            tracing::info!(deleted, retention_days, "Manual storage cleanup finished");
            success_response(
                StatusCode::OK,
                &trace_id,
                CleanupResult {
                    deleted,
                    retention_days,
                },
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Manual cleanup failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "storage_error",
                "Cleanup failed",
            )
        }
    }
}

pub fn system_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_system_info))
        .routes(routes!(get_memory_usage))
        .routes(routes!(trigger_cleanup))
}
