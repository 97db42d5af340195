//! Metrics Adapters
//!
//! Prometheus run metrics rendered to a node_exporter textfile.

pub mod run_metrics;

pub use run_metrics::RunMetrics;
