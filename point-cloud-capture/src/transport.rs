//! Outbound delivery of encoded batches.
//!
//! The core hands each encoded batch to a [`Transport`] exactly once and
//! never retries: delivery is best-effort and at-most-once. Ordering across
//! calls is the transport's concern.

use constants::wire::MAX_DATAGRAM_LEN;
use std::fs;
use std::net::{SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::TransportError;

pub type Result<T> = std::result::Result<T, TransportError>;

/// Sink for encoded batches.
pub trait Transport {
    fn publish(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn publish(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).publish(bytes)
    }
}

/// Sends each batch as one UDP datagram to a fixed remote endpoint.
///
/// A batch must fit in one datagram, so at most
/// [`constants::wire::MAX_POINTS_PER_DATAGRAM`] points; larger batches are
/// refused with [`TransportError::Oversized`].
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransport {
    /// Bind an ephemeral local port and send to `target`.
    pub fn connect(target: SocketAddr) -> Result<Self> {
        let bind_addr: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;

        // never stall the frame on a full send buffer
        socket.set_nonblocking(true)?;

        info!(
            "UDP transport bound to {} sending to {}",
            socket.local_addr()?,
            target
        );
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Transport for UdpTransport {
    fn publish(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > MAX_DATAGRAM_LEN {
            return Err(TransportError::Oversized {
                len: bytes.len(),
                max: MAX_DATAGRAM_LEN,
            });
        }
        let sent = self.socket.send_to(bytes, self.target)?;
        debug!("UDP sent {} bytes to {}", sent, self.target);
        Ok(())
    }
}

/// Writes each batch to `<dir>/batch_<n>.bin`, numbering from zero.
pub struct FileTransport {
    dir: PathBuf,
    next_index: usize,
}

impl FileTransport {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            next_index: 0,
        })
    }

    pub fn batch_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("batch_{:05}.bin", index))
    }

    /// Number of batches written so far.
    pub fn written(&self) -> usize {
        self.next_index
    }
}

impl Transport for FileTransport {
    fn publish(&mut self, bytes: &[u8]) -> Result<()> {
        let path = self.batch_path(self.next_index);
        fs::write(&path, bytes)?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        self.next_index += 1;
        Ok(())
    }
}

/// Keeps published batches in memory; optionally fails every publish.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    pub sent: Vec<Vec<u8>>,
    pub fail: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose every publish reports [`TransportError::Closed`].
    pub fn failing() -> Self {
        Self {
            sent: Vec::new(),
            fail: true,
        }
    }
}

impl Transport for MemoryTransport {
    fn publish(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail {
            return Err(TransportError::Closed);
        }
        self.sent.push(bytes.to_vec());
        Ok(())
    }
}
