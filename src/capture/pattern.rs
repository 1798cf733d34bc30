//! Synthetic test-pattern source
//!
//! Deterministic stand-in for real capture hardware: scrolling color bars
//! with a brightness ramp along the bottom that encodes the sequence
//! number. Two sources at the same sequence produce identical frames,
//! which the tests lean on.

use bytes::{BufMut, Bytes, BytesMut};

use super::source::{CaptureError, FrameSource, PixelFormat, RawFrame};

/// Classic color-bar palette, left to right
const BARS: [[u8; 3]; 8] = [
    [235, 235, 235], // white
    [235, 235, 16],  // yellow
    [16, 235, 235],  // cyan
    [16, 235, 16],   // green
    [235, 16, 235],  // magenta
    [235, 16, 16],   // red
    [16, 16, 235],   // blue
    [16, 16, 16],    // black
];

/// Rows at the bottom carrying the sequence ramp
const RAMP_ROWS: u32 = 8;

/// Pixels the pattern scrolls sideways per frame
const SCROLL_STEP: u64 = 4;

/// Frame generator producing scrolling RGB color bars
#[derive(Debug)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
    sequence: u64,
}

impl TestPatternSource {
    /// Create a source with the given frame dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            sequence: 0,
        }
    }

    /// Frames generated so far
    pub fn frames_generated(&self) -> u64 {
        self.sequence
    }

    fn render(&self) -> Bytes {
        let width = self.width as usize;
        let mut data = BytesMut::with_capacity(width * self.height as usize * 3);
        let shift = (self.sequence * SCROLL_STEP) % u64::from(self.width);
        let ramp = (self.sequence % 256) as u8;

        for y in 0..self.height {
            let in_ramp = y >= self.height.saturating_sub(RAMP_ROWS);
            for x in 0..self.width {
                if in_ramp {
                    data.put_slice(&[ramp, ramp, ramp]);
                } else {
                    let col = (u64::from(x) + shift) % u64::from(self.width);
                    let bar = (col as usize * BARS.len()) / width;
                    data.put_slice(&BARS[bar]);
                }
            }
        }

        data.freeze()
    }
}

impl FrameSource for TestPatternSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> Result<RawFrame, CaptureError> {
        let frame = RawFrame {
            width: self.width,
            height: self.height,
            format: PixelFormat::Rgb24,
            data: self.render(),
            sequence: self.sequence,
        };
        self.sequence += 1;
        Ok(frame)
    }
}
