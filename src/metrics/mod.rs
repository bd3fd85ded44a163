//! Metrics exposition for the Herpstat exporter.
//!
//! This module turns the cached device snapshot into Prometheus metric
//! families: derived flags for the safety relay and ramping state, range
//! filtering of probe readings, and the text exposition encoder.

pub mod collector;
pub mod descriptors;
pub mod encoder;

// Re-export commonly used items
pub use collector::{
    snapshot_families, DeviceCollector, HerpstatCollector, HUMIDITY_RANGE, TEMPERATURE_RANGE,
};
pub use descriptors::{Desc, Descriptors, MetricKind};
pub use encoder::{encode, MetricFamily, Sample, TEXT_FORMAT};
