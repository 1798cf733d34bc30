//! Latest-frame snapshot slot
//!
//! The streaming engine itself is single-threaded, but a control surface
//! (web UI, still-image endpoint) typically runs on another thread and
//! wants "the newest JPEG" on demand. This slot is that one crossing
//! point: the capture pipeline overwrites it once per cycle, readers take
//! a cheap `Bytes` clone under a short-lived lock, and neither side ever
//! touches the engine's internal frame buffers.

use std::sync::{Arc, Mutex};

use bytes::Bytes;

/// Shared, mutex-guarded slot holding the newest encoded frame
#[derive(Debug, Clone, Default)]
pub struct SnapshotSlot {
    inner: Arc<Mutex<Option<Bytes>>>,
}

impl SnapshotSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored frame
    pub fn store(&self, jpeg: Bytes) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(jpeg);
        }
    }

    /// The newest frame, if any has been produced yet
    pub fn latest(&self) -> Option<Bytes> {
        self.inner.lock().ok().and_then(|slot| slot.clone())
    }
}
