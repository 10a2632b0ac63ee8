#![allow(dead_code)]

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use psmon_collector::DiskUsageProvider;
use psmon_common::types::{DiskReading, SystemInfo};
use psmon_server::app;
use psmon_server::config::ServerConfig;
use psmon_server::sampler::DiskSampler;
use psmon_server::state::AppState;
use psmon_storage::SqliteDiskUsageStore;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const INDEX_HTML: &str = "<!doctype html><title>psmon test</title>";

pub struct TestContext {
    pub temp_dir: TempDir,
    pub store: Arc<SqliteDiskUsageStore>,
    pub state: AppState,
    pub app: axum::Router,
}

/// Provider returning the same two mounts on every call.
pub struct FixedProvider;

impl DiskUsageProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    fn collect(&mut self) -> Result<Vec<DiskReading>> {
        Ok(vec![
            DiskReading::from_space("/dev/sda1", "/", 1_000_000, 250_000)
                .expect("total is non-zero"),
            DiskReading::from_space("/dev/sdb1", "/data", 1_000_000, 900_000)
                .expect("total is non-zero"),
        ])
    }
}

/// Provider whose mount table can never be read.
pub struct BrokenProvider;

impl DiskUsageProvider for BrokenProvider {
    fn name(&self) -> &str {
        "broken"
    }

    fn collect(&mut self) -> Result<Vec<DiskReading>> {
        anyhow::bail!("mount table unavailable")
    }
}

pub fn test_system_info() -> SystemInfo {
    SystemInfo {
        os_family: "unix".to_string(),
        system: "Linux".to_string(),
        release: "6.1.0".to_string(),
        version: "Debian 12".to_string(),
        kernel: "6.1.0-18-amd64".to_string(),
        hostname: "psmon-test".to_string(),
        machine: "x86_64".to_string(),
        processor: "Test CPU".to_string(),
        server_version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

pub fn build_test_context() -> Result<TestContext> {
    build_test_context_with(Box::new(FixedProvider), |_, _| None)
}

/// Builds state around a temp-dir database. `make_sampler` receives the
/// store and config and may return a sampler to expose through the state.
pub fn build_test_context_with<F>(
    provider: Box<dyn DiskUsageProvider>,
    make_sampler: F,
) -> Result<TestContext>
where
    F: FnOnce(Arc<SqliteDiskUsageStore>, &ServerConfig) -> Option<Arc<DiskSampler>>,
{
    let temp_dir = tempfile::tempdir()?;
    let static_dir = temp_dir.path().join("static");
    std::fs::create_dir_all(&static_dir)?;
    std::fs::write(static_dir.join("index.html"), INDEX_HTML)?;
    std::fs::write(static_dir.join("index.js"), "console.log('psmon');")?;

    let config = ServerConfig {
        data_dir: temp_dir.path().join("data").to_string_lossy().to_string(),
        static_dir: static_dir.to_string_lossy().to_string(),
        retention_days: 30,
        ..ServerConfig::default()
    };
    let store = Arc::new(SqliteDiskUsageStore::open(
        std::path::Path::new(&config.data_dir),
        &config.db_file,
    )?);
    let sampler = make_sampler(store.clone(), &config);

    let state = AppState::new(config, store.clone(), provider, test_system_info(), sampler);
    let app = app::build_http_app(state.clone());

    Ok(TestContext {
        temp_dir,
        store,
        state,
        app,
    })
}

pub async fn request_raw(
    app: &axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, Vec<u8>, Option<String>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");

    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");
    let status = resp.status();
    let trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");

    (status, bytes.to_vec(), trace_id)
}

pub async fn request_no_body(
    app: &axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, Value, Option<String>) {
    let (status, bytes, trace_id) = request_raw(app, method, uri).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json, trace_id)
}

pub fn assert_ok_envelope(json: &Value) {
    assert_eq!(json["err_code"], 0);
    assert!(json["err_msg"].is_string());
    assert!(json.get("trace_id").is_some());
}

pub fn assert_err_envelope(json: &Value, err_code: i32) {
    assert_eq!(json["err_code"], err_code);
    assert!(json["err_msg"].is_string());
    assert!(json.get("trace_id").is_some());
    assert!(json.get("data").is_some());
    assert!(json["data"].is_null());
}

pub fn decode_data<T: DeserializeOwned>(json: &Value) -> T {
    serde_json::from_value(json["data"].clone()).expect("data should decode")
}
