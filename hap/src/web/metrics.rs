//! Prometheus metrics definitions and registration.
//!
//! Recording helpers are safe to call before a recorder is installed; the
//! `metrics` facade drops the samples in that case.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the Prometheus recorder and register all metric descriptions.
pub fn init_metrics() -> std::io::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(std::io::Error::other)?;
    register_metric_descriptions();
    Ok(handle)
}

fn register_metric_descriptions() {
    describe_gauge!(
        "neviweb_bridge_uptime_seconds",
        "Time in seconds since the bridge started"
    );
    describe_gauge!("neviweb_devices_total", "Number of mounted devices by type");
    describe_counter!(
        "neviweb_cache_hits_total",
        "Reads served from a still valid device cache"
    );
    describe_counter!(
        "neviweb_refresh_total",
        "Device state refreshes sent to the Neviweb API"
    );
    describe_counter!(
        "neviweb_refresh_errors_total",
        "Device state refreshes that failed"
    );
    describe_counter!("neviweb_patch_total", "Device patches sent to the Neviweb API");
    describe_counter!("neviweb_patch_errors_total", "Device patches that failed");
}

pub struct Metrics;

impl Metrics {
    pub fn set_uptime(start_time: Instant) {
        gauge!("neviweb_bridge_uptime_seconds").set(start_time.elapsed().as_secs_f64());
    }

    pub fn set_device_count(device_type: &str, count: usize) {
        gauge!("neviweb_devices_total", "type" => device_type.to_string()).set(count as f64);
    }

    pub fn inc_cache_hits(device_type: &str) {
        counter!("neviweb_cache_hits_total", "type" => device_type.to_string()).increment(1);
    }

    pub fn inc_refreshes(device_type: &str) {
        counter!("neviweb_refresh_total", "type" => device_type.to_string()).increment(1);
    }

    pub fn inc_refresh_errors(device_type: &str) {
        counter!("neviweb_refresh_errors_total", "type" => device_type.to_string()).increment(1);
    }

    pub fn inc_patches(device_type: &str) {
        counter!("neviweb_patch_total", "type" => device_type.to_string()).increment(1);
    }

    pub fn inc_patch_errors(device_type: &str) {
        counter!("neviweb_patch_errors_total", "type" => device_type.to_string()).increment(1);
    }
}
