//! JPEG encoding seam
//!
//! The streaming core only ever sees finished JPEG bytes; how they are
//! produced is pluggable. The default encoder goes through the `image`
//! crate, which is plenty for surveillance-grade frame sizes. A source
//! whose hardware hands back JPEG directly can bypass encoding entirely
//! with [`PassthroughEncoder`].

use bytes::Bytes;

use crate::capture::{PixelFormat, RawFrame};
use crate::error::{Error, Result};

/// Turns raw frames into JPEG bytes
pub trait JpegEncoder {
    /// Encode one frame at the given quality (1–100)
    fn encode(&mut self, frame: &RawFrame, quality: u8) -> Result<Bytes>;
}

/// Encoder backed by the `image` crate's baseline JPEG writer
#[derive(Debug, Default)]
pub struct ImageJpegEncoder;

impl ImageJpegEncoder {
    /// Create an encoder
    pub fn new() -> Self {
        Self
    }
}

impl JpegEncoder for ImageJpegEncoder {
    fn encode(&mut self, frame: &RawFrame, quality: u8) -> Result<Bytes> {
        let color = match frame.format {
            PixelFormat::Rgb24 => image::ExtendedColorType::Rgb8,
            PixelFormat::Gray8 => image::ExtendedColorType::L8,
        };

        let mut out = Vec::with_capacity(frame.data.len() / 8);
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
        encoder
            .encode(&frame.data, frame.width, frame.height, color)
            .map_err(|e| Error::Encode(e.to_string()))?;

        Ok(Bytes::from(out))
    }
}

/// Encoder for sources that already produce JPEG payloads.
///
/// The frame's `data` is passed through untouched; `quality` is ignored.
#[derive(Debug, Default)]
pub struct PassthroughEncoder;

impl JpegEncoder for PassthroughEncoder {
    fn encode(&mut self, frame: &RawFrame, _quality: u8) -> Result<Bytes> {
        Ok(frame.data.clone())
    }
}
