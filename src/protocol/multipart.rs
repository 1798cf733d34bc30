//! multipart/x-mixed-replace framing
//!
//! Two kinds of buffer travel to a viewer: the connection preamble (the HTTP
//! response header, sent exactly once) and per-frame parts. Both are built
//! here as immutable `Bytes` so the rest of the crate never edits wire data
//! after construction.
//!
//! The `Content-Length` value is a fixed-width, right-aligned 9-character
//! decimal field. Some MJPEG consumers parse this field positionally, so the
//! width is part of the protocol, not a formatting nicety.

use bytes::{BufMut, Bytes, BytesMut};

/// Boundary token separating frame parts.
///
/// The leading dashes are carried in the `boundary=` parameter itself, so
/// the delimiter line and the declared boundary are the same byte sequence.
/// Longstanding quirk of the protocol; existing viewers depend on it.
pub const BOUNDARY: &str = "--BoundaryString";

/// `Server:` token sent in the preamble
const SERVER_TOKEN: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build the one-time HTTP response header for a new viewer.
///
/// The cache-busting headers keep proxies and browsers from ever serving a
/// stale frame. `cors_allow_origin` adds an `Access-Control-Allow-Origin`
/// header when the stream is embedded in pages served from another origin.
pub fn preamble(cors_allow_origin: Option<&str>) -> Bytes {
    let mut buf = BytesMut::with_capacity(256);
    buf.put_slice(b"HTTP/1.0 200 OK\r\n");
    buf.put_slice(format!("Server: {SERVER_TOKEN}\r\n").as_bytes());
    buf.put_slice(b"Connection: close\r\n");
    buf.put_slice(b"Max-Age: 0\r\n");
    buf.put_slice(b"Expires: 0\r\n");
    buf.put_slice(b"Cache-Control: no-cache, private\r\n");
    buf.put_slice(b"Pragma: no-cache\r\n");
    if let Some(origin) = cors_allow_origin {
        buf.put_slice(format!("Access-Control-Allow-Origin: {origin}\r\n").as_bytes());
    }
    buf.put_slice(
        format!("Content-Type: multipart/x-mixed-replace; boundary={BOUNDARY}\r\n\r\n").as_bytes(),
    );
    buf.freeze()
}

/// Wrap one encoded JPEG into a complete wire-ready part.
///
/// Layout: boundary line, part headers with the 9-character length field,
/// blank line, JPEG bytes, trailing CRLF. The part header uses the
/// lowercase `Content-type` spelling; the preamble uses `Content-Type`.
/// Both have been on the wire for decades and are matched by downstream
/// tooling as-is.
pub fn wrap_frame(jpeg: &[u8]) -> Bytes {
    let header = format!(
        "{BOUNDARY}\r\nContent-type: image/jpeg\r\nContent-Length: {:>9}\r\n\r\n",
        jpeg.len()
    );

    let mut buf = BytesMut::with_capacity(header.len() + jpeg.len() + 2);
    buf.put_slice(header.as_bytes());
    buf.put_slice(jpeg);
    buf.put_slice(b"\r\n");
    buf.freeze()
}
