//! Engine and pipeline statistics

pub mod metrics;

pub use metrics::{CaptureStats, EngineStats};
