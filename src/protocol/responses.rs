//! FTP Response handling
//!
//! Reply formatting and the control channel replies are written to.

use log::{debug, warn};
use std::net::Ipv4Addr;

use crate::transport::Connection;

/// Standard FTP response codes
pub const DATA_OPENING: u16 = 150;
pub const OK: u16 = 200;
pub const FILE_STATUS: u16 = 213;
pub const FEATURES: u16 = 211;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const PASSIVE_MODE: u16 = 227;
pub const LOGIN_SUCCESS: u16 = 230;
pub const FILE_ACTION_OK: u16 = 250;
pub const PATH_CREATED: u16 = 257;
pub const PASSWORD_REQUIRED: u16 = 331;
pub const PENDING_FURTHER_INFO: u16 = 350;
pub const SERVICE_CLOSING: u16 = 421;
pub const NO_DATA_CONNECTION: u16 = 425;
pub const TRANSFER_ABORTED: u16 = 426;
pub const FILE_UNAVAILABLE: u16 = 450;
pub const LOCAL_ERROR: u16 = 451;
pub const SYNTAX_ERROR: u16 = 500;
pub const PARAMETER_ERROR: u16 = 501;
pub const BAD_SEQUENCE: u16 = 503;
pub const NOT_IMPLEMENTED_PARAM: u16 = 504;
pub const AUTH_FAILED: u16 = 530;
pub const FILE_NOT_FOUND: u16 = 550;
pub const NAME_NOT_ALLOWED: u16 = 553;

/// Format an FTP response message
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}

/// Format a multi-line reply: `code-` on every line but the last
pub fn format_multiline(code: u16, lines: &[&str]) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let sep = if i + 1 == lines.len() { ' ' } else { '-' };
        out.push_str(&format!("{}{}{}\r\n", code, sep, line));
    }
    out
}

/// The control connection of the current client, if any
#[derive(Default)]
pub struct ControlChannel {
    conn: Option<Box<dyn Connection>>,
}

impl ControlChannel {
    /// Adopt a freshly accepted connection, dropping the previous one
    pub fn attach(&mut self, conn: Box<dyn Connection>) {
        self.close();
        self.conn = Some(conn);
    }

    pub fn is_connected(&mut self) -> bool {
        self.conn.as_mut().is_some_and(|c| c.is_connected())
    }

    pub fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
        }
    }

    pub fn local_ip(&self) -> Option<Ipv4Addr> {
        self.conn.as_ref().and_then(|c| c.local_ip())
    }

    pub fn connection_mut(&mut self) -> Option<&mut (dyn Connection + 'static)> {
        self.conn.as_deref_mut()
    }

    /// Send one reply line; CRLF is appended
    pub fn reply(&mut self, code: u16, message: &str) {
        self.send_raw(&format_response(code, message));
    }

    pub fn reply_multiline(&mut self, code: u16, lines: &[&str]) {
        self.send_raw(&format_multiline(code, lines));
    }

    /// Send pre-formatted, CRLF-terminated text
    pub fn send_raw(&mut self, text: &str) {
        let Some(conn) = self.conn.as_mut() else {
            debug!("No control connection for reply {:?}", text.trim_end());
            return;
        };
        debug!("-> {}", text.trim_end());
        if let Err(e) = conn.write_all(text.as_bytes()) {
            warn!("Failed to send reply {:?}: {}", text.trim_end(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockPeer;

    #[test]
    fn formats_single_and_multiline_replies() {
        assert_eq!(format_response(200, "Zzz..."), "200 Zzz...\r\n");
        assert_eq!(
            format_multiline(211, &["Extensions supported:", " MLSD", "End."]),
            "211-Extensions supported:\r\n211- MLSD\r\n211 End.\r\n"
        );
    }

    #[test]
    fn attach_replaces_and_closes_previous() {
        let first = MockPeer::default();
        let second = MockPeer::default();
        let mut control = ControlChannel::default();

        control.reply(220, "nobody listening");
        control.attach(first.connection());
        control.reply(220, "hello");
        assert_eq!(first.take_output(), "220 hello\r\n");

        control.attach(second.connection());
        assert!(first.closed_locally());
        assert!(control.is_connected());
        control.close();
        assert!(!control.is_connected());
    }
}
