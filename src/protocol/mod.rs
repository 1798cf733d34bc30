//! Wire format for the multipart JPEG stream
//!
//! Viewers speak plain HTTP/1.0: one response header announcing a
//! `multipart/x-mixed-replace` body, then an unbounded sequence of JPEG
//! parts separated by a boundary string. Browsers render each part as it
//! arrives, replacing the previous image.

pub mod multipart;

pub use multipart::{preamble, wrap_frame, BOUNDARY};
