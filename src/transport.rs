//! src/transport.rs
//!
//! The node's single connectionless datagram endpoint (§6): bound to
//! `0.0.0.0:port` with `SO_REUSEADDR` and a 500 ms receive timeout so the
//! listener thread can observe shutdown between blocking calls.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use socket2::{Domain, Socket, Type};

use crate::error::Result;
use crate::wire::MSG_BUF_SIZE;

/// Receive timeout applied to the bound socket, per §5 ("blocks on recv
/// with a 500 ms timeout").
pub const RECV_TIMEOUT: Duration = Duration::from_millis(500);

pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Binds `0.0.0.0:port` with `SO_REUSEADDR` set and the standard
    /// 500 ms receive timeout.
    pub fn bind(port: u16) -> Result<Self> {
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, None)?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;

        Ok(Self {
            socket: socket.into(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn send_to(&self, bytes: &[u8], addr: SocketAddr) -> Result<()> {
        self.socket.send_to(bytes, addr)?;
        Ok(())
    }

    /// Blocks for up to [`RECV_TIMEOUT`] waiting for one datagram.
    /// `Ok(None)` on a timeout (the normal shutdown-polling path);
    /// `Err` only for a genuine I/O failure other than a timeout.
    pub fn recv(&self) -> Result<Option<(Vec<u8>, SocketAddr)>> {
        let mut buf = [0u8; MSG_BUF_SIZE];
        match self.socket.recv_from(&mut buf) {
            Ok((n, from)) => Ok(Some((buf[..n].to_vec(), from))),
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
