//! TCP transport
//!
//! Non-blocking `std::net` sockets. Accepts are probed into a one-slot
//! pending buffer so `has_pending_accept` can be asked without losing the
//! connection. Reads never block; writes switch the socket to blocking
//! mode under a write timeout.

use log::{debug, warn};
use std::io::{self, ErrorKind, Read, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::{Connection, Listener};

const WRITE_TIMEOUT: Duration = Duration::from_secs(5);
const PEEK_WINDOW: usize = 8192;

pub struct TcpEndpoint {
    listener: TcpListener,
    pending: Option<(TcpStream, SocketAddr)>,
}

impl TcpEndpoint {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            pending: None,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    fn probe(&mut self) {
        if self.pending.is_some() {
            return;
        }
        match self.listener.accept() {
            Ok(accepted) => self.pending = Some(accepted),
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => warn!("Accept failed: {}", e),
        }
    }
}

impl Listener for TcpEndpoint {
    fn has_pending_accept(&mut self) -> bool {
        self.probe();
        self.pending.is_some()
    }

    fn accept(&mut self) -> Option<Box<dyn Connection>> {
        self.probe();
        let (stream, peer) = self.pending.take()?;
        match TcpConnection::new(stream) {
            Ok(conn) => {
                debug!("Accepted connection from {}", peer);
                Some(Box::new(conn))
            }
            Err(e) => {
                warn!("Failed to configure connection from {}: {}", peer, e);
                None
            }
        }
    }
}

pub struct TcpConnection {
    stream: TcpStream,
    open: bool,
    scratch: Vec<u8>,
}

impl TcpConnection {
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        let _ = stream.set_nodelay(true);
        Ok(Self {
            stream,
            open: true,
            scratch: vec![0; PEEK_WINDOW],
        })
    }

    /// Bytes buffered in the kernel, or `None` once the peer has closed
    fn peek(&mut self) -> Option<usize> {
        if !self.open {
            return None;
        }
        match self.stream.peek(&mut self.scratch) {
            Ok(0) => {
                self.open = false;
                None
            }
            Ok(n) => Some(n),
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => Some(0),
            Err(ref e) if e.kind() == ErrorKind::Interrupted => Some(0),
            Err(_) => {
                self.open = false;
                None
            }
        }
    }
}

impl Connection for TcpConnection {
    fn is_connected(&mut self) -> bool {
        self.peek().is_some()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    fn available(&mut self) -> usize {
        self.peek().unwrap_or(0)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.open {
            return Ok(0);
        }
        match self.stream.read(buf) {
            Ok(0) if !buf.is_empty() => {
                self.open = false;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => {
                self.open = false;
                Err(e)
            }
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        if !self.open {
            return Err(io::Error::new(ErrorKind::NotConnected, "connection closed"));
        }
        self.stream.set_nonblocking(false)?;
        let result = self.stream.write_all(buf).and_then(|_| self.stream.flush());
        self.stream.set_nonblocking(true)?;
        if result.is_err() {
            self.open = false;
        }
        result
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        match self.stream.local_addr().ok()?.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(ip) => ip.to_ipv4_mapped(),
        }
    }

    fn close(&mut self) {
        if self.open {
            let _ = self.stream.shutdown(std::net::Shutdown::Both);
            self.open = false;
        }
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn wait_for_accept(endpoint: &mut TcpEndpoint) -> Box<dyn Connection> {
        for _ in 0..500 {
            if endpoint.has_pending_accept() {
                return endpoint.accept().unwrap();
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("no connection arrived");
    }

    #[test]
    fn reports_availability_and_disconnect() {
        let mut endpoint = TcpEndpoint::bind("127.0.0.1:0").unwrap();
        let addr = endpoint.local_addr().unwrap();
        assert!(!endpoint.has_pending_accept());

        let mut client = TcpStream::connect(addr).unwrap();
        let mut conn = wait_for_accept(&mut endpoint);
        assert!(conn.is_connected());
        assert_eq!(conn.read_byte(), None);

        client.write_all(b"NOOP\r\n").unwrap();
        for _ in 0..500 {
            if conn.available() == 6 {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(conn.read_byte(), Some(b'N'));
        assert_eq!(conn.local_ip(), Some(Ipv4Addr::LOCALHOST));

        drop(client);
        let mut rest = [0u8; 16];
        assert_eq!(conn.read(&mut rest).unwrap(), 5);
        for _ in 0..500 {
            if !conn.is_connected() {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert!(!conn.is_connected());
    }
}
