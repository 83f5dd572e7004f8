// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and describe the series the
    /// service emits. The cache TTL is exposed as a static gauge.
    pub fn init(cache_ttl_secs: u64) -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_counter!("cache_hits_total", "Cache lookups answered from a live entry.");
        describe_counter!("cache_misses_total", "Cache lookups that took the fetch path.");
        describe_counter!("fetch_errors_total", "Upstream fetch failures.");
        describe_counter!("ai_calls_total", "Generative-AI requests issued.");
        describe_counter!(
            "summarizer_fallbacks_total",
            "Items whose display text fell back past the AI summary."
        );

        gauge!("cache_ttl_secs").set(cache_ttl_secs as f64);

        Self { handle }
    }

    /// Router exposing `/metrics` in Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
