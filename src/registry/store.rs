//! Client registry: the set of connected viewers for one camera
//!
//! The registry owns every `ClientSession` and performs the two bulk walks
//! of the streaming core: `distribute`, which hands a freshly published
//! frame to every idle viewer whose throttle window has elapsed, and
//! `flush`, which drains pending writes and disconnects dead or capped
//! viewers in place.
//!
//! Sessions live in a plain `Vec`: push-at-end insert, O(1) `swap_remove`
//! during the flush walk. Both mutation sites (acceptor insert, flush
//! remove) run on the capture thread, so the collection needs no internal
//! locking.

use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use super::client::{ClientSession, FlushStatus};
use super::frame::FrameRef;

/// Counters produced by one `flush` call
#[derive(Debug, Clone, Copy, Default)]
pub struct FlushReport {
    /// Bytes successfully written across all sessions
    pub bytes_written: usize,
    /// Buffers (preamble or frame) fully drained
    pub buffers_completed: u64,
    /// Sessions removed (socket error or frame cap)
    pub disconnected: u64,
}

/// All connected viewers of one stream engine
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Vec<ClientSession>,
    next_id: u64,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connected viewers
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// True when no viewer is connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Connected sessions, in registry order
    pub fn sessions(&self) -> &[ClientSession] {
        &self.clients
    }

    /// Insert a new session pre-armed with the protocol preamble.
    ///
    /// Returns the id assigned to the session.
    pub(crate) fn add(&mut self, socket: TcpStream, peer_addr: SocketAddr, preamble: FrameRef) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.clients.push(ClientSession::new(id, socket, peer_addr, preamble));
        id
    }

    /// True when at least one viewer is idle and could take a new frame.
    ///
    /// The distributor uses this to skip frame wrapping entirely when every
    /// viewer is still mid-flight on an earlier buffer.
    pub fn has_idle(&self) -> bool {
        self.clients.iter().any(ClientSession::is_idle)
    }

    /// Hand `frame` to every idle session whose throttle window has elapsed.
    ///
    /// Eligible sessions share the same buffer; each gets its own handle and
    /// a fresh write offset, and has its serve time stamped with `now`.
    /// Returns the number of sessions armed. When zero, the caller's handle
    /// is the only one and the buffer dies with it.
    pub(crate) fn distribute(
        &mut self,
        frame: &FrameRef,
        max_rate: Option<u32>,
        now: Instant,
    ) -> usize {
        let interval = rate_interval(max_rate);
        let mut handed = 0;

        for client in &mut self.clients {
            if client.is_idle() && client.ready_at(interval, now) {
                client.arm(FrameRef::clone(frame), now);
                handed += 1;
            }
        }

        handed
    }

    /// Drain pending writes on every session.
    ///
    /// Each pass attempts one non-blocking write per session with pending
    /// data. Whenever a pass makes progress anywhere, a further full pass
    /// runs, so buffers completing early in the walk cascade-release within
    /// the same call instead of waiting a cycle.
    ///
    /// Sessions are removed in place on a fatal socket error, or — with a
    /// frame cap configured — once idle with `frames_sent` beyond the cap.
    /// Removal drops the session, which closes the socket and releases any
    /// held buffer handle exactly once.
    pub(crate) fn flush(&mut self, limit: Option<u64>) -> FlushReport {
        let mut report = FlushReport::default();

        loop {
            let mut workdone = false;
            let mut i = 0;

            while i < self.clients.len() {
                let client = &mut self.clients[i];
                let mut dead = false;

                match client.flush_once() {
                    FlushStatus::Idle | FlushStatus::WouldBlock => {}
                    FlushStatus::Progress(n) => {
                        workdone = true;
                        report.bytes_written += n;
                    }
                    FlushStatus::Completed(n) => {
                        workdone = true;
                        report.bytes_written += n;
                        report.buffers_completed += 1;
                    }
                    FlushStatus::Failed(e) => {
                        tracing::debug!(client = client.id(), error = %e, "viewer socket error");
                        dead = true;
                    }
                }

                if !dead {
                    if let Some(cap) = limit {
                        if client.is_idle() && client.frames_sent() > cap {
                            tracing::info!(
                                client = client.id(),
                                frames = client.frames_sent(),
                                cap,
                                "viewer reached stream frame cap"
                            );
                            dead = true;
                        }
                    }
                }

                if dead {
                    let client = self.clients.swap_remove(i);
                    report.disconnected += 1;
                    tracing::info!(
                        client = client.id(),
                        peer = %client.peer_addr(),
                        viewers = self.clients.len(),
                        "viewer disconnected"
                    );
                    // swap_remove moved an unvisited session into slot i;
                    // stay on i so it still gets its write this pass
                } else {
                    i += 1;
                }
            }

            if !workdone {
                break;
            }
        }

        report
    }

    /// Drop every session, closing all viewer sockets
    pub(crate) fn shutdown(&mut self) {
        self.clients.clear();
    }
}

fn rate_interval(max_rate: Option<u32>) -> Option<Duration> {
    match max_rate {
        None | Some(0) => None,
        Some(rate) => Some(Duration::from_micros(1_000_000 / u64::from(rate))),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::net::TcpListener;
    use std::sync::Arc;

    use bytes::Bytes;

    use super::*;
    use crate::registry::frame::FrameBuffer;

    fn pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        server.set_nonblocking(true).unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        (server, client)
    }

    fn buffer(bytes: &'static [u8]) -> FrameRef {
        Arc::new(FrameBuffer::new(Bytes::from_static(bytes)))
    }

    fn add_client(registry: &mut ClientRegistry) -> TcpStream {
        let (server, client) = pair();
        let peer = server.peer_addr().unwrap();
        registry.add(server, peer, buffer(b"PRE\r\n\r\n"));
        client
    }

    /// Flush the preamble and consume it on the client side
    fn drain_preamble(registry: &mut ClientRegistry, client: &mut TcpStream) {
        registry.flush(None);
        let mut preamble = [0u8; 7];
        client.read_exact(&mut preamble).unwrap();
        assert_eq!(&preamble, b"PRE\r\n\r\n");
    }

    #[test]
    fn test_new_session_arms_preamble() {
        let mut registry = ClientRegistry::new();
        let mut client = add_client(&mut registry);

        assert_eq!(registry.len(), 1);
        // busy with the preamble, so not yet eligible for frames
        assert!(!registry.has_idle());

        drain_preamble(&mut registry, &mut client);
        assert!(registry.has_idle());
        assert_eq!(registry.sessions()[0].frames_sent(), 0);
    }

    #[test]
    fn test_distribute_shares_one_buffer_across_viewers() {
        let mut registry = ClientRegistry::new();
        let mut viewers: Vec<TcpStream> = (0..3).map(|_| add_client(&mut registry)).collect();
        for viewer in &mut viewers {
            drain_preamble(&mut registry, viewer);
        }

        let frame = buffer(b"frame-bytes-0123");
        let weak = Arc::downgrade(&frame);
        let handed = registry.distribute(&frame, None, Instant::now());

        assert_eq!(handed, 3);
        // three session handles plus the caller's
        assert_eq!(Arc::strong_count(&frame), 4);
        for session in registry.sessions() {
            assert!(Arc::ptr_eq(session.pending_buffer().unwrap(), &frame));
        }

        drop(frame);
        let report = registry.flush(None);
        assert_eq!(report.buffers_completed, 3);
        assert_eq!(report.bytes_written, 16 * 3);

        // the buffer was freed within the flush cycle
        assert!(weak.upgrade().is_none());

        for viewer in &mut viewers {
            let mut got = [0u8; 16];
            viewer.read_exact(&mut got).unwrap();
            assert_eq!(&got, b"frame-bytes-0123");
        }
        for session in registry.sessions() {
            assert_eq!(session.frames_sent(), 1);
            assert!(session.is_idle());
        }
    }

    #[test]
    fn test_distribute_skips_busy_sessions() {
        let mut registry = ClientRegistry::new();
        let _client = add_client(&mut registry);

        // preamble never flushed: the session is mid-flight
        let frame = buffer(b"xxxx");
        assert_eq!(registry.distribute(&frame, None, Instant::now()), 0);
        assert_eq!(Arc::strong_count(&frame), 1);
    }

    #[test]
    fn test_throttle_window_is_honored() {
        let mut registry = ClientRegistry::new();
        let mut client = add_client(&mut registry);
        drain_preamble(&mut registry, &mut client);

        let t0 = Instant::now();
        // 2 fps -> 500ms window
        let rate = Some(2);

        assert_eq!(registry.distribute(&buffer(b"f1"), rate, t0), 1);
        registry.flush(None);

        // next frame arrives before the window elapses: skipped
        let early = buffer(b"f2");
        assert_eq!(
            registry.distribute(&early, rate, t0 + Duration::from_millis(200)),
            0
        );
        assert_eq!(Arc::strong_count(&early), 1);

        // exactly on the window: served
        assert_eq!(
            registry.distribute(&buffer(b"f3"), rate, t0 + Duration::from_millis(500)),
            1
        );
    }

    #[test]
    fn test_zero_rate_means_unconstrained() {
        let mut registry = ClientRegistry::new();
        let mut client = add_client(&mut registry);
        drain_preamble(&mut registry, &mut client);

        let t0 = Instant::now();
        for _ in 0..5 {
            assert_eq!(registry.distribute(&buffer(b"f"), Some(0), t0), 1);
            registry.flush(None);
        }
        assert_eq!(registry.sessions()[0].frames_sent(), 5);
    }

    #[test]
    fn test_frame_cap_disconnects_exactly_after_limit() {
        let mut registry = ClientRegistry::new();
        let mut client = add_client(&mut registry);
        drain_preamble(&mut registry, &mut client);

        let cap = Some(2u64);

        for expected in 1..=2 {
            registry.distribute(&buffer(b"frame"), None, Instant::now());
            registry.flush(cap);
            assert_eq!(registry.len(), 1, "disconnected before exceeding the cap");
            assert_eq!(registry.sessions()[0].frames_sent(), expected);
        }

        // the third frame pushes frames_sent past the cap
        registry.distribute(&buffer(b"frame"), None, Instant::now());
        let report = registry.flush(cap);
        assert_eq!(report.disconnected, 1);
        assert!(registry.is_empty());

        // viewer sees the final frame, then EOF
        let mut tail = Vec::new();
        client.read_to_end(&mut tail).unwrap();
        assert_eq!(tail.len(), 5 * 3);
    }

    #[test]
    fn test_fatal_write_error_removes_only_that_viewer() {
        let mut registry = ClientRegistry::new();
        let dead_client = add_client(&mut registry);
        let mut live_client = add_client(&mut registry);

        registry.flush(None);
        drop(dead_client);

        // keep publishing until the kernel reports the closed peer
        let mut disconnected = false;
        for _ in 0..200 {
            registry.distribute(&buffer(b"payload-payload-payload"), None, Instant::now());
            let report = registry.flush(None);
            if report.disconnected > 0 {
                disconnected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }

        assert!(disconnected, "closed peer never produced a write error");
        assert_eq!(registry.len(), 1);

        // the surviving viewer is still being served
        let mut probe = [0u8; 7];
        live_client.read_exact(&mut probe).unwrap();
        assert_eq!(&probe, b"PRE\r\n\r\n");
    }

    #[test]
    fn test_disconnect_releases_held_buffer_once() {
        let mut registry = ClientRegistry::new();
        let mut client = add_client(&mut registry);
        drain_preamble(&mut registry, &mut client);

        // arm a frame, then close the peer so that a write error and a cap
        // overrun race for the same removal
        let frame = buffer(b"stale-frame-bytes");
        registry.distribute(&frame, None, Instant::now());
        let weak = Arc::downgrade(&frame);
        drop(frame);
        drop(client);

        for _ in 0..200 {
            registry.distribute(&buffer(b"x"), None, Instant::now());
            if registry.flush(Some(1)).disconnected > 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }

        assert!(registry.is_empty());
        // the session's handle was released exactly once with its removal
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_partial_writes_resume_across_flush_calls() {
        let mut registry = ClientRegistry::new();
        let (server, mut client) = pair();
        // shrink both socket buffers so a large frame cannot drain in one cycle
        socket2::SockRef::from(&server)
            .set_send_buffer_size(4096)
            .unwrap();
        socket2::SockRef::from(&client)
            .set_recv_buffer_size(4096)
            .unwrap();
        let peer = server.peer_addr().unwrap();
        registry.add(server, peer, buffer(b"PRE\r\n\r\n"));
        drain_preamble(&mut registry, &mut client);

        let payload: &'static [u8] = Box::leak(vec![0x55u8; 1 << 20].into_boxed_slice());
        let frame = Arc::new(FrameBuffer::new(Bytes::from_static(payload)));
        registry.distribute(&frame, None, Instant::now());

        // the viewer is not reading yet: flush stalls mid-buffer
        registry.flush(None);
        let stalled = registry.sessions()[0].pending_offset().unwrap();
        assert!(stalled > 0, "nothing was written");
        assert!(stalled < payload.len(), "flush should have hit backpressure");

        // repeated flushes without a reader make no further progress
        registry.flush(None);
        let offset = registry.sessions()[0].pending_offset();
        assert!(offset.unwrap() >= stalled);

        // drain on a reader thread, then flush until the buffer completes
        let reader = std::thread::spawn(move || {
            let mut sink = Vec::with_capacity(payload.len());
            client.read_to_end(&mut sink).unwrap();
            sink.len()
        });

        let mut completed = false;
        for _ in 0..10_000 {
            let report = registry.flush(None);
            if report.buffers_completed > 0 {
                completed = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(completed, "buffer never finished draining");
        assert!(registry.sessions()[0].is_idle());

        registry.shutdown();
        assert_eq!(reader.join().unwrap(), payload.len());
    }
}
