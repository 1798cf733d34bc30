//! Viewer registry and shared frame buffers
//!
//! The registry owns the per-camera set of connected viewers and routes
//! published frames to them.
//!
//! # Architecture
//!
//! ```text
//!                        StreamEngine (one per camera)
//!                     ┌────────────────────────────────┐
//!                     │ registry: ClientRegistry       │
//!                     │   Vec<ClientSession {          │
//!                     │     socket, pending, counters  │
//!                     │   }>                           │
//!                     └───────────────┬────────────────┘
//!                                     │ publish(jpeg)
//!                                     ▼
//!                            Arc<FrameBuffer>
//!                     ┌───────────────┼────────────────┐
//!                     │               │                │
//!                     ▼               ▼                ▼
//!               [viewer A]       [viewer B]       [viewer C]
//!              flush_once()     flush_once()     flush_once()
//!                     │               │                │
//!                     └──► non-blocking TCP writes ◄───┘
//! ```
//!
//! # Zero-Copy Design
//!
//! Frame bytes live in one `Bytes` allocation wrapped in one
//! `Arc<FrameBuffer>`. Distribution clones the `Arc`, never the bytes; the
//! last session to finish writing releases the allocation in the same
//! flush cycle. Buffers are immutable after construction, so concurrent
//! readers need no locking — and since the whole walk runs on the capture
//! thread, neither does the registry itself.

pub mod client;
pub mod frame;
pub mod store;

pub use client::ClientSession;
pub use frame::{FrameBuffer, FrameRef};
pub use store::{ClientRegistry, FlushReport};
