//! Frame acquisition and the per-camera pipeline
//!
//! Capture hardware stays behind the [`FrameSource`] seam; everything in
//! front of it — failure tolerance, the optional transform, encoding, and
//! driving the stream engine — is the [`CameraPipeline`]. The
//! [`TestPatternSource`] generator stands in for hardware in demos and
//! tests.

pub mod pattern;
pub mod pipeline;
pub mod source;

pub use pattern::TestPatternSource;
pub use pipeline::{CameraPipeline, CaptureConfig};
pub use source::{CaptureError, FrameSource, PixelFormat, RawFrame, Transform};
