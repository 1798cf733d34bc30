//! Per-camera stream engine
//!
//! One `StreamEngine` owns one listening socket and every viewer connected
//! to it. The engine never runs a loop of its own: the camera's capture
//! cycle drives it, once per captured frame, through [`StreamEngine::process_frame`]:
//!
//! 1. accept a pending viewer, if any (never blocking);
//! 2. flush leftover partial writes from earlier cycles;
//! 3. publish the fresh frame to every idle, rate-eligible viewer;
//! 4. flush again so ready viewers get the new frame in the same cycle.
//!
//! Every socket operation is non-blocking with explicit would-block
//! handling, so a stalled viewer can never hold up capture or its fellow
//! viewers. All engine state is instance-owned; two cameras on different
//! ports share nothing.

use std::io;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use crate::error::Result;
use crate::protocol;
use crate::registry::{ClientRegistry, FrameBuffer, FrameRef};
use crate::server::{bind_and_listen, StreamConfig};
use crate::stats::EngineStats;

/// Frame distributor and multi-viewer flush engine for one camera
#[derive(Debug)]
pub struct StreamEngine {
    listener: TcpListener,
    registry: ClientRegistry,
    config: StreamConfig,
    preamble: Bytes,
    stats: EngineStats,
}

impl StreamEngine {
    /// Bind the configured streaming port and create an engine for it.
    ///
    /// On failure the caller should log the error and run the camera
    /// without a stream; nothing else depends on this socket.
    pub fn bind(config: StreamConfig) -> Result<Self> {
        let listener = bind_and_listen(&config)?;
        Ok(Self::from_listener(listener, config))
    }

    /// Build an engine around an existing listener.
    ///
    /// The listener is switched to non-blocking mode if it is not already.
    pub fn from_listener(listener: TcpListener, config: StreamConfig) -> Self {
        if let Err(e) = listener.set_nonblocking(true) {
            tracing::warn!(error = %e, "could not set stream listener non-blocking");
        }

        let preamble = protocol::preamble(config.cors_allow_origin.as_deref());

        Self {
            listener,
            registry: ClientRegistry::new(),
            config,
            preamble,
            stats: EngineStats::default(),
        }
    }

    /// Address the engine is listening on
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The engine's configuration
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Number of currently connected viewers
    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    /// Lifetime counters
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Accept one pending viewer, if any.
    ///
    /// Returns the new session id, or `None` when nothing is pending, the
    /// viewer cap is reached (connections then wait in the OS backlog), or
    /// the accepted socket could not be configured. The new session is
    /// pre-armed with the protocol preamble so its first flush emits valid
    /// HTTP headers before any frame exists.
    pub fn accept_pending(&mut self) -> Option<u64> {
        if self.registry.len() >= self.config.max_clients {
            return None;
        }

        match self.listener.accept() {
            Ok((socket, peer_addr)) => {
                if let Err(e) = socket.set_nonblocking(true) {
                    tracing::warn!(peer = %peer_addr, error = %e, "dropping viewer: socket setup failed");
                    return None;
                }
                if self.config.tcp_nodelay {
                    if let Err(e) = socket.set_nodelay(true) {
                        tracing::debug!(peer = %peer_addr, error = %e, "could not set TCP_NODELAY");
                    }
                }

                let id = self.register(socket, peer_addr);
                Some(id)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                tracing::warn!(error = %e, "stream accept failed");
                None
            }
        }
    }

    fn register(&mut self, socket: TcpStream, peer_addr: std::net::SocketAddr) -> u64 {
        // each viewer gets its own preamble buffer; the payload bytes are
        // shared, the handle is not
        let preamble = Arc::new(FrameBuffer::new(self.preamble.clone()));
        let id = self.registry.add(socket, peer_addr, preamble);
        self.stats.clients_accepted += 1;

        tracing::info!(
            client = id,
            peer = %peer_addr,
            viewers = self.registry.len(),
            "stream viewer connected"
        );
        id
    }

    /// Publish one encoded JPEG to every eligible viewer.
    ///
    /// Called at most once per captured frame. When no viewer is idle the
    /// frame is skipped without wrapping or allocation; when viewers are
    /// idle but all throttled, the wrapped buffer is dropped on the spot.
    /// Viewers never queue frames: a slow viewer skips ahead to whatever
    /// is published once it catches up.
    pub fn publish(&mut self, jpeg: &[u8]) {
        if !self.registry.has_idle() {
            self.stats.frames_skipped += 1;
            return;
        }

        let frame: FrameRef = Arc::new(FrameBuffer::new(protocol::wrap_frame(jpeg)));
        let handed = self
            .registry
            .distribute(&frame, self.config.effective_max_rate(), Instant::now());

        if handed == 0 {
            self.stats.frames_throttled += 1;
        } else {
            self.stats.frames_published += 1;
            tracing::trace!(viewers = handed, bytes = frame.len(), "frame published");
        }
    }

    /// Drain pending writes to all viewers and reap dead ones
    pub fn flush(&mut self) {
        let report = self.registry.flush(self.config.effective_limit());

        self.stats.bytes_sent += report.bytes_written as u64;
        self.stats.buffers_completed += report.buffers_completed;
        self.stats.clients_disconnected += report.disconnected;
    }

    /// One full capture-cycle step: accept, flush, publish, flush
    pub fn process_frame(&mut self, jpeg: &[u8]) {
        self.accept_pending();
        self.flush();
        self.publish(jpeg);
        self.flush();
    }

    /// Close the listener and every viewer socket
    pub fn shutdown(mut self) {
        tracing::info!(
            viewers = self.registry.len(),
            "closing stream listener and viewer sockets"
        );
        self.registry.shutdown();
    }
}
