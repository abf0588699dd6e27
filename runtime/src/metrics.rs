//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for:
//! - Store action processing and effect execution
//! - Effect cancellation
//! - Fare API requests
//! - Place suggestion lookups
//!
//! # Example
//!
//! ```rust,no_run
//! use farecast_runtime::metrics::MetricsRecorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut recorder = MetricsRecorder::new();
//! recorder.install()?;
//!
//! // ... run the application ...
//!
//! if let Some(text) = recorder.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Process-wide Prometheus recorder.
///
/// Collects metrics in memory; [`MetricsRecorder::render`] produces the
/// Prometheus text exposition format.
#[derive(Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that is not yet installed.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the global recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), the call succeeds
    /// without a handle and [`MetricsRecorder::render`] returns `None`.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            // Fare requests are measured in hundreds of milliseconds
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this recorder was never installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Store
    describe_counter!("store.commands.total", "Total number of actions sent to stores");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken to reduce a single action"
    );
    describe_counter!("store.effects.executed", "Effects started, labelled by type");
    describe_counter!(
        "store.effects.cancelled",
        "Running effects aborted, labelled by reason (explicit or superseded)"
    );
    describe_counter!("store.shutdown.initiated", "Graceful shutdowns started");
    describe_counter!("store.shutdown.completed", "Graceful shutdowns that drained all effects");
    describe_counter!("store.shutdown.timeout", "Graceful shutdowns that timed out");
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );

    // Fare API
    describe_counter!("fare_api.requests_total", "Fare requests, labelled by endpoint and outcome");
    describe_histogram!("fare_api.request_duration_seconds", "Fare request latency");

    // Place search
    describe_counter!("place_search.queries_total", "Place suggestion lookups, labelled by outcome");
    describe_histogram!("place_search.query_duration_seconds", "Place suggestion lookup latency");
}

/// Fare API metrics recorder.
pub struct FareApiMetrics;

impl FareApiMetrics {
    /// Record a completed fare request.
    ///
    /// `endpoint` is `predict`, `smart_predict` or `health`.
    pub fn record_request(endpoint: &'static str, success: bool, duration: Duration) {
        let outcome = if success { "success" } else { "failure" };
        counter!("fare_api.requests_total", "endpoint" => endpoint, "outcome" => outcome)
            .increment(1);
        histogram!("fare_api.request_duration_seconds", "endpoint" => endpoint)
            .record(duration.as_secs_f64());
    }
}

/// Place search metrics recorder.
pub struct PlaceSearchMetrics;

impl PlaceSearchMetrics {
    /// Record a completed suggestion lookup.
    pub fn record_query(success: bool, duration: Duration) {
        let outcome = if success { "success" } else { "failure" };
        counter!("place_search.queries_total", "outcome" => outcome).increment(1);
        histogram!("place_search.query_duration_seconds").record(duration.as_secs_f64());
    }
}
