//! Viewer sessions
//!
//! A `ClientSession` is one connected HTTP viewer: a non-blocking socket,
//! an optional in-flight buffer with a write offset, and per-viewer
//! delivery state (frame counter, throttle timestamp). Sessions never own
//! the distribution logic — the registry walks them and the engine decides
//! what they get.
//!
//! A session is armed with at most one buffer at a time and is never handed
//! a new one until the current one has fully drained, so a viewer always
//! sees frames in publish order and a slow viewer skips frames instead of
//! queueing them.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use super::frame::FrameRef;

/// An in-flight write: which buffer, and how far into it we are
#[derive(Debug)]
pub(crate) struct PendingWrite {
    buffer: FrameRef,
    offset: usize,
    /// The connection preamble does not count toward the frame cap
    is_preamble: bool,
}

/// Result of a single write attempt on a pending buffer
#[derive(Debug)]
pub(crate) enum WriteStep {
    /// Wrote some bytes; more remain
    Wrote(usize),
    /// Wrote the final bytes; the buffer is fully drained
    Done(usize),
    /// The socket could not take data right now; retry next pass
    Blocked,
    /// Unrecoverable socket error
    Failed(io::Error),
}

impl PendingWrite {
    fn new(buffer: FrameRef, is_preamble: bool) -> Self {
        Self {
            buffer,
            offset: 0,
            is_preamble,
        }
    }

    /// Attempt one non-blocking write of the unsent tail.
    ///
    /// `WouldBlock` (and an interrupted call) report `Blocked` rather than
    /// an error; everything else is fatal for the connection. A zero-byte
    /// write is treated like `Blocked` and retried.
    pub(crate) fn write_step<W: Write>(&mut self, writer: &mut W) -> WriteStep {
        debug_assert!(self.offset <= self.buffer.len());
        if self.offset >= self.buffer.len() {
            return WriteStep::Done(0);
        }

        match writer.write(&self.buffer.data()[self.offset..]) {
            Ok(0) => WriteStep::Blocked,
            Ok(n) => {
                self.offset += n;
                if self.offset == self.buffer.len() {
                    WriteStep::Done(n)
                } else {
                    WriteStep::Wrote(n)
                }
            }
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                WriteStep::Blocked
            }
            Err(e) => WriteStep::Failed(e),
        }
    }

    #[cfg(test)]
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }
}

/// Outcome of one flush attempt on a session
#[derive(Debug)]
pub(crate) enum FlushStatus {
    /// Nothing pending
    Idle,
    /// Partial write; the session keeps its buffer
    Progress(usize),
    /// The pending buffer fully drained and was released
    Completed(usize),
    /// Socket temporarily not writable
    WouldBlock,
    /// Fatal socket error; the session must be disconnected
    Failed(io::Error),
}

/// One connected stream viewer
#[derive(Debug)]
pub struct ClientSession {
    id: u64,
    socket: TcpStream,
    peer_addr: SocketAddr,
    pending: Option<PendingWrite>,
    frames_sent: u64,
    last_served: Option<Instant>,
}

impl ClientSession {
    /// Create a session pre-armed with the protocol preamble so the very
    /// first flush sends valid HTTP headers.
    pub(crate) fn new(id: u64, socket: TcpStream, peer_addr: SocketAddr, preamble: FrameRef) -> Self {
        Self {
            id,
            socket,
            peer_addr,
            pending: Some(PendingWrite::new(preamble, true)),
            frames_sent: 0,
            last_served: None,
        }
    }

    /// Session id, unique per engine
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remote peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Frames fully delivered to this viewer (excluding the preamble)
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// True when the session has no in-flight buffer and can take a new frame
    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Whether the throttle window has elapsed for this viewer.
    ///
    /// `interval` of `None` means unconstrained; a never-served session is
    /// always ready.
    pub(crate) fn ready_at(&self, interval: Option<Duration>, now: Instant) -> bool {
        match (interval, self.last_served) {
            (None, _) | (_, None) => true,
            (Some(iv), Some(last)) => now.saturating_duration_since(last) >= iv,
        }
    }

    /// Hand the session a shared frame buffer and stamp its serve time
    pub(crate) fn arm(&mut self, buffer: FrameRef, now: Instant) {
        debug_assert!(self.pending.is_none());
        self.pending = Some(PendingWrite::new(buffer, false));
        self.last_served = Some(now);
    }

    /// One write attempt toward the socket.
    ///
    /// On completion the buffer handle is released (freeing the buffer if
    /// this was the last holder) and `frames_sent` advances unless the
    /// buffer was the preamble.
    pub(crate) fn flush_once(&mut self) -> FlushStatus {
        let Some(pending) = self.pending.as_mut() else {
            return FlushStatus::Idle;
        };

        match pending.write_step(&mut self.socket) {
            WriteStep::Wrote(n) => FlushStatus::Progress(n),
            WriteStep::Done(n) => {
                let counts = !pending.is_preamble;
                self.pending = None;
                if counts {
                    self.frames_sent += 1;
                }
                FlushStatus::Completed(n)
            }
            WriteStep::Blocked => FlushStatus::WouldBlock,
            WriteStep::Failed(e) => FlushStatus::Failed(e),
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_buffer(&self) -> Option<&FrameRef> {
        self.pending.as_ref().map(|p| &p.buffer)
    }

    #[cfg(test)]
    pub(crate) fn pending_offset(&self) -> Option<usize> {
        self.pending.as_ref().map(|p| p.offset)
    }
}
