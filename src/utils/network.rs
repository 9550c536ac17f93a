//! Network utilities
//!
//! Encoding and decoding of the `h1,h2,h3,h4,p1,p2` host-port form used by
//! PASV replies and PORT arguments.

use crate::error::TransferError;
use std::net::{Ipv4Addr, SocketAddrV4};

/// Format an endpoint as `h1,h2,h3,h4,p1,p2`
pub fn format_host_port(ip: Ipv4Addr, port: u16) -> String {
    let [a, b, c, d] = ip.octets();
    format!("{},{},{},{},{},{}", a, b, c, d, port >> 8, port & 0xff)
}

/// Parse a PORT argument into an endpoint
pub fn parse_host_port(arg: &str) -> Result<SocketAddrV4, TransferError> {
    let fields: Vec<&str> = arg.trim().split(',').map(str::trim).collect();
    if fields.len() != 6 {
        return Err(TransferError::InvalidPortCommand(format!(
            "expected 6 fields, got {}",
            fields.len()
        )));
    }

    let mut bytes = [0u8; 6];
    for (slot, field) in bytes.iter_mut().zip(&fields) {
        *slot = field
            .parse::<u8>()
            .map_err(|_| TransferError::InvalidPortCommand(format!("bad field {:?}", field)))?;
    }

    let ip = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
    let port = (bytes[4] as u16) << 8 | bytes[5] as u16;
    Ok(SocketAddrV4::new(ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_pasv_tuple() {
        assert_eq!(
            format_host_port(Ipv4Addr::new(192, 168, 1, 20), 50009),
            "192,168,1,20,195,89"
        );
    }

    #[test]
    fn parses_port_argument() {
        let addr = parse_host_port("10,0,0,7,4,1").unwrap();
        assert_eq!(*addr.ip(), Ipv4Addr::new(10, 0, 0, 7));
        assert_eq!(addr.port(), 1025);
    }

    #[test]
    fn rejects_malformed_port_argument() {
        assert!(parse_host_port("10,0,0,7,4").is_err());
        assert!(parse_host_port("10,0,0,300,4,1").is_err());
        assert!(parse_host_port("").is_err());
        assert!(parse_host_port("a,b,c,d,e,f").is_err());
    }
}
