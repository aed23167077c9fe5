#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod backtrace;

mod error;
pub use error::{CliError, CliResult};

mod log;
pub use log::{LogArgs, init_tracing_subscriber};

mod styles;
pub use styles::cli_styles;

#[cfg(feature = "metrics")]
mod prometheus;
#[cfg(feature = "metrics")]
pub use prometheus::{PrometheusError, PrometheusHandle, install_prometheus_recorder};
