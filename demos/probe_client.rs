//! Minimal MJPEG stream consumer
//!
//! Run with: cargo run --example probe_client [ADDR]
//!
//! Connects to a running stream (pattern_server by default), prints the
//! response headers, then reports every received frame and its size.
//! Handy for eyeballing throttling and frame-cap behavior without a
//! browser.

use std::io::{BufRead, BufReader, Read};
use std::net::TcpStream;

fn main() -> std::io::Result<()> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8081".into());

    let stream = TcpStream::connect(&addr)?;
    println!("connected to {addr}");
    let mut reader = BufReader::new(stream);

    // response preamble, up to the blank line
    let mut line = String::new();
    loop {
        line.clear();
        reader.read_line(&mut line)?;
        if line == "\r\n" || line.is_empty() {
            break;
        }
        print!("< {line}");
    }

    let mut frames = 0u64;
    loop {
        // part headers: boundary line, content type, content length
        let mut content_length = None;
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                println!("server closed the stream after {frames} frames");
                return Ok(());
            }
            if line == "\r\n" {
                break;
            }
            if let Some(value) = line.strip_prefix("Content-Length:") {
                content_length = value.trim().parse::<usize>().ok();
            }
        }

        let Some(len) = content_length else {
            eprintln!("part without a Content-Length header, giving up");
            return Ok(());
        };

        // JPEG payload plus the trailing CRLF
        let mut payload = vec![0u8; len + 2];
        reader.read_exact(&mut payload)?;
        frames += 1;
        println!("frame {frames}: {len} bytes");
    }
}
