//! An in-process Prometheus recorder.

pub use metrics_exporter_prometheus::PrometheusHandle;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use thiserror::Error;
use tracing::debug;

/// Error type for prometheus recorder initialization.
#[derive(Debug, Error)]
pub enum PrometheusError {
    /// Failed to build or install the recorder.
    #[error("failed to install prometheus recorder: {0}")]
    Install(#[from] BuildError),
}

/// Installs a global Prometheus recorder and returns a handle that renders its snapshot.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle, PrometheusError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    debug!(target: "prometheus", "Installed prometheus recorder");
    Ok(handle)
}
