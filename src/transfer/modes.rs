//! FTP Transfer modes
//!
//! Passive and active data-connection modes and the negotiated endpoint.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

/// FTP transfer modes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataMode {
    /// Client dials the server's fixed data port
    Passive,
    /// Client announced an endpoint with PORT. Recorded only; the server
    /// never dials it.
    Active,
}

/// The data endpoint announced by PASV or received through PORT
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataEndpoint {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl DataEndpoint {
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }
}

impl From<SocketAddrV4> for DataEndpoint {
    fn from(addr: SocketAddrV4) -> Self {
        Self::new(*addr.ip(), addr.port())
    }
}

impl fmt::Display for DataEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}
