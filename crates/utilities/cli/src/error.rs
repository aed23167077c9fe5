//! Error types for CLI utilities.

use thiserror::Error;

/// Errors that can occur in CLI operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// A global tracing subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Error initializing metrics.
    #[cfg(feature = "metrics")]
    #[error("failed to initialize metrics: {0}")]
    MetricsInitialization(#[from] crate::PrometheusError),
}

/// Type alias for CLI results.
pub type CliResult<T> = Result<T, CliError>;
