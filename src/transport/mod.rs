//! Transport seam
//!
//! The session never touches sockets directly. A `Listener` yields
//! `Connection`s; both are polled without blocking. Production code uses
//! the `tcp` implementation, tests script their own.

pub mod tcp;

#[cfg(test)]
pub(crate) mod mock;

use std::io;
use std::net::Ipv4Addr;

/// One established byte stream (control or data)
pub trait Connection: Send {
    /// Whether the peer is still attached. Bytes still buffered count as connected.
    fn is_connected(&mut self) -> bool;

    /// Read one byte if one is already buffered
    fn read_byte(&mut self) -> Option<u8>;

    /// Number of bytes that can be read right now without blocking
    fn available(&mut self) -> usize;

    /// Read up to `buf.len()` bytes that are already available
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Local IPv4 address the peer reached us on
    fn local_ip(&self) -> Option<Ipv4Addr>;

    fn close(&mut self);
}

/// A listening endpoint on a fixed port
pub trait Listener: Send {
    /// Whether a connection is waiting to be accepted
    fn has_pending_accept(&mut self) -> bool;

    /// Take the next pending connection, if any
    fn accept(&mut self) -> Option<Box<dyn Connection>>;
}
