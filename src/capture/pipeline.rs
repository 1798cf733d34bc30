//! Per-camera capture pipeline
//!
//! Glues one frame source to one stream engine: capture, tolerate
//! transient device errors, transform, encode once, update the snapshot
//! slot, then run the engine's cycle step. The pipeline is the "external
//! driver" the engine is designed around — the engine never blocks, the
//! pipeline decides the cadence.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::codec::JpegEncoder;
use crate::engine::StreamEngine;
use crate::error::{Error, Result};
use crate::snapshot::SnapshotSlot;
use crate::stats::CaptureStats;

use super::source::{CaptureError, FrameSource, RawFrame, Transform};

/// Capture-side options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Target capture rate in frames per second
    pub frame_rate: u32,

    /// Consecutive transient failures before the source is declared lost.
    /// The pipeline keeps serving the last good frame either way; this
    /// only controls when the condition is escalated in the log.
    pub max_consecutive_failures: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_rate: 15,
            max_consecutive_failures: 30,
        }
    }
}

/// One camera's capture loop and its stream engine
pub struct CameraPipeline {
    source: Box<dyn FrameSource>,
    transform: Option<Box<dyn Transform>>,
    encoder: Box<dyn JpegEncoder>,
    engine: StreamEngine,
    snapshot: SnapshotSlot,
    config: CaptureConfig,
    last_good: Option<RawFrame>,
    consecutive_failures: u32,
    stats: CaptureStats,
}

impl CameraPipeline {
    /// Assemble a pipeline from its collaborators
    pub fn new(
        source: Box<dyn FrameSource>,
        encoder: Box<dyn JpegEncoder>,
        engine: StreamEngine,
        config: CaptureConfig,
    ) -> Self {
        Self {
            source,
            transform: None,
            encoder,
            engine,
            snapshot: SnapshotSlot::new(),
            config,
            last_good: None,
            consecutive_failures: 0,
            stats: CaptureStats::default(),
        }
    }

    /// Install an image transform (rotation, flip) between capture and encode
    pub fn with_transform(mut self, transform: Box<dyn Transform>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Handle to the latest-frame snapshot slot, for control-side readers
    pub fn snapshot(&self) -> SnapshotSlot {
        self.snapshot.clone()
    }

    /// The pipeline's stream engine
    pub fn engine(&self) -> &StreamEngine {
        &self.engine
    }

    /// Capture-side counters
    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Run one capture cycle.
    ///
    /// Transient capture failures fall back to the last good frame so
    /// connected viewers keep a live picture; only a fatal source error
    /// propagates. Encode failures skip the cycle's publish but still
    /// service viewer sockets.
    pub fn tick(&mut self) -> Result<()> {
        let captured = match self.source.next_frame() {
            Ok(frame) => {
                self.consecutive_failures = 0;
                self.stats.frames_captured += 1;
                Some(frame)
            }
            Err(CaptureError::Transient(reason)) => {
                self.consecutive_failures += 1;
                self.stats.capture_failures += 1;
                if self.consecutive_failures == self.config.max_consecutive_failures {
                    tracing::error!(
                        failures = self.consecutive_failures,
                        reason = %reason,
                        "capture source lost; serving last good frame"
                    );
                } else {
                    tracing::debug!(reason = %reason, "transient capture failure");
                }
                None
            }
            Err(CaptureError::Fatal(reason)) => return Err(Error::Capture(reason)),
        };

        let raw = match captured.or_else(|| self.last_good.clone()) {
            Some(frame) => frame,
            None => {
                // nothing captured yet at all; keep the connection machinery alive
                self.idle_cycle();
                return Ok(());
            }
        };
        self.last_good = Some(raw.clone());

        let frame = match &self.transform {
            Some(transform) => transform.apply(raw),
            None => raw,
        };

        let jpeg = match self.encoder.encode(&frame, self.engine.config().quality) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                tracing::warn!(error = %e, "frame encode failed, skipping cycle");
                self.idle_cycle();
                return Ok(());
            }
        };
        self.stats.frames_encoded += 1;

        self.snapshot.store(jpeg.clone());
        self.engine.process_frame(&jpeg);
        Ok(())
    }

    /// Service sockets without publishing anything
    fn idle_cycle(&mut self) {
        self.engine.accept_pending();
        self.engine.flush();
    }

    /// Drive the pipeline at the configured frame rate until `duration`
    /// has elapsed
    pub fn run_for(&mut self, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        let interval =
            Duration::from_micros(1_000_000 / u64::from(self.config.frame_rate.max(1)));

        while Instant::now() < deadline {
            let started = Instant::now();
            self.tick()?;
            if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }

        Ok(())
    }

    /// Stop the camera's stream, closing all viewer sockets
    pub fn shutdown(self) {
        self.engine.shutdown();
    }
}
