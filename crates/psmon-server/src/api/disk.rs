use crate::api::{error_response, run_blocking, success_response};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use psmon_common::types::{DiskReading, DiskSample};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

const DEFAULT_HISTORY_LIMIT: usize = 100;
const MAX_HISTORY_LIMIT: usize = 1000;

#[derive(Serialize, ToSchema)]
struct LiveDiskUsage {
    disks: Vec<DiskReading>,
    count: usize,
}

#[derive(Serialize, ToSchema)]
struct StoredDiskUsage {
    disks: Vec<DiskSample>,
    count: usize,
}

#[derive(Serialize, ToSchema)]
struct DiskHistory {
    mountpoint: String,
    limit: usize,
    /// Newest first
    samples: Vec<DiskSample>,
    count: usize,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct HistoryParams {
    /// Mountpoint to query, e.g. `/`
    mountpoint: Option<String>,
    /// Maximum samples to return (default 100, clamped to 1..=1000)
    #[param(required = false)]
    limit: Option<usize>,
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

/// Reads disk usage from the host right now, bypassing the database.
#[utoipa::path(
    get,
    path = "/api/disk/usage",
    tag = "Disk",
    responses(
        (status = 200, description = "Live disk usage", body = LiveDiskUsage),
        (status = 500, description = "Collection failed", body = crate::api::ApiError)
    )
)]
async fn get_live_usage(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let provider = state.disk_provider.clone();
    let result = run_blocking(move || {
        let mut provider = provider.lock().unwrap_or_else(|p| p.into_inner());
        provider.collect()
    })
    .await;

    match result {
        Ok(disks) => success_response(
            StatusCode::OK,
            &trace_id,
            LiveDiskUsage {
                count: disks.len(),
                disks,
            },
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read live disk usage");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "collector_error",
                "Failed to read disk usage",
            )
        }
    }
}

/// Most recent stored sample of every mountpoint, most-full first.
#[utoipa::path(
    get,
    path = "/api/disk/usage/latest",
    tag = "Disk",
    responses(
        (status = 200, description = "Latest sample per mountpoint", body = StoredDiskUsage),
        (status = 500, description = "Storage failure", body = crate::api::ApiError)
    )
)]
async fn get_latest_usage(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let store = state.store.clone();
    match run_blocking(move || store.latest_per_mount()).await {
        Ok(disks) => success_response(
            StatusCode::OK,
            &trace_id,
            StoredDiskUsage {
                count: disks.len(),
                disks,
            },
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to query latest disk usage");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "storage_error",
                "Failed to query latest disk usage",
            )
        }
    }
}

/// Stored samples for one mountpoint, newest first.
#[utoipa::path(
    get,
    path = "/api/disk/usage/history",
    tag = "Disk",
    params(HistoryParams),
    responses(
        (status = 200, description = "Sample history", body = DiskHistory),
        (status = 400, description = "Missing mountpoint", body = crate::api::ApiError),
        (status = 500, description = "Storage failure", body = crate::api::ApiError)
    )
)]
async fn get_usage_history(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    let mountpoint = match params.mountpoint {
        Some(m) if !m.trim().is_empty() => m,
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &trace_id,
                "bad_request",
                "mountpoint is required",
            )
        }
    };
    let limit = clamp_limit(params.limit);

    let store = state.store.clone();
    let query_mount = mountpoint.clone();
    match run_blocking(move || store.history(&query_mount, limit)).await {
        Ok(samples) => success_response(
            StatusCode::OK,
            &trace_id,
            DiskHistory {
                mountpoint,
                limit,
                count: samples.len(),
                samples,
            },
        ),
        Err(e) => {
            tracing::error!(mountpoint = %mountpoint, error = %e, "Failed to query disk usage history");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "storage_error",
                "Failed to query disk usage history",
            )
        }
    }
}

pub fn disk_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_live_usage))
        .routes(routes!(get_latest_usage))
        .routes(routes!(get_usage_history))
}
