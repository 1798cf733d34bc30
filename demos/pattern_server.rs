//! Synthetic camera served as a multipart JPEG stream
//!
//! Run with: cargo run --example pattern_server [PORT]
//!
//! Then open http://127.0.0.1:8081/ in a browser, or point any MJPEG
//! viewer (ffplay, VLC, probe_client) at it. Every viewer gets its own
//! throttled copy of the stream; slow viewers skip frames instead of
//! lagging behind.

use std::time::Duration;

use mjpeg_rs::capture::{CameraPipeline, CaptureConfig, TestPatternSource};
use mjpeg_rs::codec::ImageJpegEncoder;
use mjpeg_rs::engine::StreamEngine;
use mjpeg_rs::server::StreamConfig;
use tracing_subscriber::EnvFilter;

fn main() -> mjpeg_rs::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(8081);

    let config = StreamConfig::with_port(port)
        .localhost_only(false)
        .max_rate(Some(15))
        .quality(75);
    let engine = StreamEngine::bind(config)?;
    println!("streaming on http://127.0.0.1:{port}/ (ctrl-c to stop)");

    let mut pipeline = CameraPipeline::new(
        Box::new(TestPatternSource::new(640, 480)),
        Box::new(ImageJpegEncoder::new()),
        engine,
        CaptureConfig {
            frame_rate: 15,
            ..Default::default()
        },
    );

    loop {
        pipeline.run_for(Duration::from_secs(10))?;

        let stats = pipeline.engine().stats();
        tracing::info!(
            viewers = pipeline.engine().client_count(),
            published = stats.frames_published,
            skipped = stats.frames_dropped(),
            bytes = stats.bytes_sent,
            "stream stats"
        );
    }
}
