//! Metric Registry & Expiration Manager.
//!
//! Wraps a global `prometheus::Registry` (the teacher's
//! `lazy_static!` + `register_*_vec!` pattern, see `catalog.rs`) with a
//! side table that tracks when each label tuple was last written, so
//! stale series can be reaped instead of reporting their last value
//! forever.

pub mod catalog;
mod handler;
mod registry;

pub use catalog::MetricHandle;
pub use handler::metrics_handler;
pub use registry::MetricRegistry;
