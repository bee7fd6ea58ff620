//! Metrics recorder initialization.

use std::net::SocketAddr;

use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[cfg(feature = "prometheus")]
    #[error(transparent)]
    Prometheus(#[from] metrics_exporter_prometheus::BuildError),
}

/// Configuration for the metrics system.
#[derive(Debug, Clone)]
pub struct MetricsRecorderConfig {
    /// Whether metrics collection is enabled
    pub enabled: bool,
    /// Address the Prometheus scrape endpoint listens on
    pub listen: SocketAddr,
    /// Global labels to add to all metrics
    pub global_labels: Vec<(String, String)>,
}

/// Initialize the metrics system.
///
/// Call once at startup, from inside the tokio runtime: the Prometheus
/// exporter spawns its HTTP listener onto it. Without the `prometheus`
/// feature, or with `enabled = false`, no recorder is installed and every
/// metric call is a no-op.
///
/// Returns whether a recorder was installed.
pub fn init_metrics(config: MetricsRecorderConfig) -> Result<bool, Error> {
    if !config.enabled {
        info!("metrics collection is disabled");
        return Ok(false);
    }

    #[cfg(feature = "prometheus")]
    {
        use {crate::rooms, metrics_exporter_prometheus::{Matcher, PrometheusBuilder}};

        let mut builder = PrometheusBuilder::new()
            .with_http_listener(config.listen)
            .set_buckets_for_metric(
                Matcher::Full(rooms::PROVISION_DURATION_SECONDS.to_string()),
                &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            )?;
        for (key, value) in config.global_labels {
            builder = builder.add_global_label(key, value);
        }
        builder.install()?;
        info!(listen = %config.listen, "prometheus metrics exporter listening");
        Ok(true)
    }

    #[cfg(not(feature = "prometheus"))]
    {
        info!("metrics feature not enabled at compile time");
        Ok(false)
    }
}
