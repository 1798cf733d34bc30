//! Per-camera stream socket setup
//!
//! Binds and listens on the camera's streaming port. A failure here is
//! returned to the caller, which logs it and runs the camera without a
//! stream — capture and detection are never taken down by an unusable
//! port.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener};

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::{Error, Result};
use crate::server::config::{StreamConfig, LISTEN_BACKLOG};

/// Bind and listen according to `config`.
///
/// IPv4 by default; with `ipv6` set, a dual-stack socket where the
/// platform allows it. `localhost_only` restricts the bind address to
/// loopback. The listener is returned non-blocking, ready for the
/// acceptor's zero-timeout polling.
pub fn bind_and_listen(config: &StreamConfig) -> Result<TcpListener> {
    let addr = listen_addr(config);

    let listener = bind_inner(addr).map_err(|source| Error::Bind {
        port: config.port,
        source,
    })?;

    tracing::info!(
        addr = %listener.local_addr().map(|a| a.to_string()).unwrap_or_default(),
        "stream socket listening"
    );

    Ok(listener)
}

fn listen_addr(config: &StreamConfig) -> SocketAddr {
    let ip: IpAddr = match (config.ipv6, config.localhost_only) {
        (false, true) => Ipv4Addr::LOCALHOST.into(),
        (false, false) => Ipv4Addr::UNSPECIFIED.into(),
        (true, true) => Ipv6Addr::LOCALHOST.into(),
        (true, false) => Ipv6Addr::UNSPECIFIED.into(),
    };
    SocketAddr::new(ip, config.port)
}

fn bind_inner(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;

    socket.set_reuse_address(true)?;
    if addr.is_ipv6() {
        // accept IPv4-mapped peers too; not every platform permits it
        if let Err(e) = socket.set_only_v6(false) {
            tracing::warn!(error = %e, "could not enable dual-stack listening");
        }
    }

    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG as i32)?;
    socket.set_nonblocking(true)?;

    Ok(socket.into())
}
