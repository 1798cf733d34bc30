//! Shared frame buffers
//!
//! One `FrameBuffer` holds one complete wire-ready part (multipart headers,
//! JPEG payload, trailing CRLF) or the connection preamble. Buffers are
//! immutable after construction and shared between viewer sessions through
//! `Arc`, so fan-out never copies frame data and readers need no locking.
//!
//! The `Arc` strong count is the reference count: each session holding the
//! buffer owns one handle, and the allocation is freed the moment the last
//! handle drops — deterministically, within the flush cycle that finished
//! the final write.

use std::sync::Arc;

use bytes::Bytes;

/// Shared handle to an immutable frame buffer
pub type FrameRef = Arc<FrameBuffer>;

/// One complete encoded part, ready to write to a viewer socket
#[derive(Debug)]
pub struct FrameBuffer {
    data: Bytes,
}

impl FrameBuffer {
    /// Wrap already-framed wire bytes into a buffer
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// The wire bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Total length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
