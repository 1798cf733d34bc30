//! Multipart-JPEG camera streaming engine
//!
//! Per-camera capture-and-stream pipeline for surveillance daemons: a
//! single producer captures, encodes, and publishes frames while any
//! number of HTTP viewers consume a `multipart/x-mixed-replace` JPEG
//! stream, each at its own rate, without ever blocking the producer or
//! each other.
//!
//! # Quick start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use mjpeg_rs::capture::{CameraPipeline, CaptureConfig, TestPatternSource};
//! use mjpeg_rs::codec::ImageJpegEncoder;
//! use mjpeg_rs::engine::StreamEngine;
//! use mjpeg_rs::server::StreamConfig;
//!
//! fn main() -> mjpeg_rs::Result<()> {
//!     let config = StreamConfig::with_port(8081).max_rate(Some(15));
//!     let engine = StreamEngine::bind(config)?;
//!
//!     let mut pipeline = CameraPipeline::new(
//!         Box::new(TestPatternSource::new(640, 480)),
//!         Box::new(ImageJpegEncoder::new()),
//!         engine,
//!         CaptureConfig::default(),
//!     );
//!
//!     pipeline.run_for(Duration::from_secs(60))?;
//!     pipeline.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Design
//!
//! The engine is deliberately runtime-free: every socket is non-blocking,
//! and the whole cycle — accept, flush, publish, flush — is a step
//! function the capture loop invokes once per frame. Frame payloads are
//! immutable reference-counted buffers shared across viewers, so fan-out
//! costs one `Arc` clone per viewer and the last writer to finish frees
//! the frame within the same cycle.

pub mod capture;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod snapshot;
pub mod stats;

pub use capture::{CameraPipeline, CaptureConfig, FrameSource, TestPatternSource};
pub use codec::{ImageJpegEncoder, JpegEncoder};
pub use config::Config;
pub use engine::StreamEngine;
pub use error::{Error, Result};
pub use server::{bind_and_listen, StreamConfig};
pub use snapshot::SnapshotSlot;
pub use stats::{CaptureStats, EngineStats};
