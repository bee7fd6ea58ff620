//! Metrics collection and export for tempvoice.
//!
//! Metric names live in [`rooms`]; record them with the re-exported facade
//! macros. When the `prometheus` feature is enabled, [`init_metrics`] installs
//! a Prometheus recorder with its own HTTP listener.
//!
//! ```rust,ignore
//! use tempvoice_metrics::{counter, rooms};
//!
//! counter!(rooms::CREATED_TOTAL).increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{Error, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
