// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metrics for the Unibox workspace.
//!
//! Recording helpers use the metrics-rs facade; [`PrometheusExporter`]
//! installs the Prometheus recorder and renders the text exposition format.

pub mod recording;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use unibox_core::UniboxError;

pub use recording::{
    record_aggregation_cycle, record_breaker_event, record_channel_fetch, record_resolution,
    register_metrics,
};

/// Installed Prometheus recorder.
pub struct PrometheusExporter {
    handle: PrometheusHandle,
}

impl PrometheusExporter {
    /// Install the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call errors.
    pub fn install() -> Result<Self, UniboxError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            UniboxError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
