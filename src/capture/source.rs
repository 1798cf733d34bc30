//! Frame source seam
//!
//! Device-specific capture (V4L2, network cameras, files) lives behind the
//! [`FrameSource`] trait; the pipeline only sees raw frames and a small
//! error taxonomy. A source that hands out already-decoded pixels decides
//! internally how it gets them — a netcam source, for example, decodes its
//! JPEG payloads before returning.

use bytes::Bytes;
use thiserror::Error;

/// Pixel layout of a raw frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGB, 3 bytes per pixel
    Rgb24,
    /// 8-bit grayscale, 1 byte per pixel
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb24 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// One decoded (and possibly rotated) image from a camera
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel layout of `data`
    pub format: PixelFormat,
    /// Packed pixel data, row-major
    pub data: Bytes,
    /// Monotonic capture sequence number
    pub sequence: u64,
}

impl RawFrame {
    /// Expected byte length for the frame's dimensions and format
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Capture failure classes
#[derive(Debug, Error)]
pub enum CaptureError {
    /// One bad read; the device may recover on the next cycle
    #[error("transient capture failure: {0}")]
    Transient(String),
    /// The device is gone and will not come back
    #[error("capture device lost: {0}")]
    Fatal(String),
}

/// A camera, network stream, or synthetic generator producing raw frames
pub trait FrameSource {
    /// Frame dimensions, fixed for the life of the source
    fn dimensions(&self) -> (u32, u32);

    /// Pull the next frame.
    ///
    /// Transient errors are absorbed by the pipeline's tolerance policy;
    /// fatal errors stop the camera.
    fn next_frame(&mut self) -> Result<RawFrame, CaptureError>;
}

/// In-place image transform applied between capture and encode
/// (rotation, flips, colorspace fixes)
pub trait Transform {
    /// Apply the transform, returning the adjusted frame
    fn apply(&self, frame: RawFrame) -> RawFrame;
}
