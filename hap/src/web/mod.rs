//! Status and Prometheus metrics server.

pub mod metrics;
pub mod state;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::web::metrics::Metrics;
use crate::web::state::BridgeState;

#[derive(Clone)]
struct AppState {
    bridge_state: BridgeState,
    metrics_handle: PrometheusHandle,
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub port: u16,
    pub enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            enabled: true,
        }
    }
}

/// Start the web server in the background.
pub async fn start_web_server(
    config: WebConfig,
    bridge_state: BridgeState,
) -> Result<(), std::io::Error> {
    if !config.enabled {
        info!("Web server is disabled");
        return Ok(());
    }

    let metrics_handle = metrics::init_metrics()?;
    let app = router(AppState {
        bridge_state,
        metrics_handle,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting web server on http://{}", addr);
    let listener = TcpListener::bind(addr).await?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {}", e);
        }
    });

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/status", get(api_status_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> Response {
    let summary = state.bridge_state.summary();
    if summary.is_healthy() {
        (StatusCode::OK, "OK").into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("UNHEALTHY: {}", summary.failing_devices.join(", ")),
        )
            .into_response()
    }
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    Metrics::set_uptime(state.bridge_state.start_time());
    for (device_type, count) in state.bridge_state.device_counts() {
        Metrics::set_device_count(device_type.as_str(), count);
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics_handle.render(),
    )
        .into_response()
}

async fn api_status_handler(State(state): State<AppState>) -> Response {
    let summary = state.bridge_state.summary();
    let devices: Vec<_> = state
        .bridge_state
        .devices()
        .into_iter()
        .map(|d| {
            serde_json::json!({
                "id": d.id,
                "name": d.name,
                "type": d.device_type.as_str(),
                "status": d.status,
                "last_refresh_seconds_ago": d.last_refresh.map(|t| t.elapsed().as_secs()),
                "refresh_count": d.refresh_count,
                "refresh_failures": d.refresh_failures,
                "patch_failures": d.patch_failures,
                "last_error": d.last_error,
                "last_patch_error": d.last_patch_error,
            })
        })
        .collect();

    Json(serde_json::json!({
        "status": if summary.is_healthy() { "ok" } else { "degraded" },
        "uptime": summary.uptime_display(),
        "uptime_seconds": summary.uptime_seconds,
        "pairing_pin": summary.pairing_pin,
        "pairing_url": summary.pairing_url,
        "device_count": summary.device_count,
        "devices": devices,
    }))
    .into_response()
}
