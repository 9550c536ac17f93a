//! Command-line reader
//!
//! Bytes are pulled from the control connection until a line completes or
//! nothing more is buffered. The completed line lives in a buffer allocated
//! once per session; `command()` and `params()` are views into it.

use std::borrow::Cow;

use crate::constants::{CMD_LINE_SIZE, MAX_COMMAND_TOKEN};
use crate::error::ProtocolError;
use crate::transport::Connection;

/// Result of one reader step
#[derive(Debug, PartialEq)]
pub enum ReadOutcome {
    /// Line not complete yet
    NoData,
    /// A bare CRLF
    EmptyLine,
    /// Framing violation; the accumulator has been reset
    SyntaxError(ProtocolError),
    /// A line of the given length is ready
    Line(usize),
}

pub struct LineReader {
    pending: Vec<u8>,
    capacity: usize,
    discarding: bool,
    line: String,
    command_end: usize,
    params_start: usize,
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new(CMD_LINE_SIZE)
    }
}

impl LineReader {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Vec::with_capacity(capacity),
            capacity,
            discarding: false,
            line: String::with_capacity(capacity),
            command_end: 0,
            params_start: 0,
        }
    }

    /// Drop any partial line and the last parsed command
    pub fn reset(&mut self) {
        self.pending.clear();
        self.discarding = false;
        self.line.clear();
        self.command_end = 0;
        self.params_start = 0;
    }

    /// Upper-cased command token of the last completed line
    pub fn command(&self) -> &str {
        &self.line[..self.command_end]
    }

    /// Parameters of the last completed line, leading spaces removed
    pub fn params(&self) -> &str {
        &self.line[self.params_start..]
    }

    /// Consume buffered bytes until a line completes or the connection runs dry.
    pub fn read_line(&mut self, conn: &mut dyn Connection) -> ReadOutcome {
        while let Some(byte) = conn.read_byte() {
            if let Some(outcome) = self.push_byte(byte) {
                return outcome;
            }
        }
        ReadOutcome::NoData
    }

    /// Feed one byte. Returns `Some` when the byte ends a line or breaks framing.
    pub fn push_byte(&mut self, byte: u8) -> Option<ReadOutcome> {
        match byte {
            b'\r' => None,
            b'\n' => {
                if self.discarding {
                    self.discarding = false;
                    return None;
                }
                Some(self.finish_line())
            }
            _ if self.discarding => None,
            _ => {
                if self.pending.len() >= self.capacity {
                    self.pending.clear();
                    self.discarding = true;
                    return Some(ReadOutcome::SyntaxError(ProtocolError::LineTooLong(
                        self.capacity,
                    )));
                }
                self.pending.push(if byte == b'\\' { b'/' } else { byte });
                None
            }
        }
    }

    fn finish_line(&mut self) -> ReadOutcome {
        self.line.clear();
        self.command_end = 0;
        self.params_start = 0;

        if self.pending.is_empty() {
            return ReadOutcome::EmptyLine;
        }

        let outcome = match split_line(&self.pending) {
            Ok((head, params, command_end)) => {
                let params_start = head.len();
                self.line.push_str(head);
                self.line.push_str(&params);
                self.line[..command_end].make_ascii_uppercase();
                self.command_end = command_end;
                self.params_start = params_start;
                ReadOutcome::Line(self.line.len())
            }
            Err(e) => ReadOutcome::SyntaxError(e),
        };
        self.pending.clear();
        outcome
    }
}

/// Split a line into its head (command token plus separating spaces) and
/// its parameters. The head must be UTF-8; parameters are decoded lossily
/// so names in other encodings still reach the handlers.
fn split_line(bytes: &[u8]) -> Result<(&str, Cow<'_, str>, usize), ProtocolError> {
    let (command_end, params_start) = match bytes.iter().position(|&b| b == b' ') {
        Some(space) if space > MAX_COMMAND_TOKEN => return Err(ProtocolError::CommandTooLong(space)),
        Some(space) => {
            let skipped = bytes[space + 1..].iter().take_while(|&&b| b == b' ').count();
            (space, space + 1 + skipped)
        }
        None if bytes.len() > MAX_COMMAND_TOKEN => {
            return Err(ProtocolError::CommandTooLong(bytes.len()));
        }
        None => (bytes.len(), bytes.len()),
    };

    let head = std::str::from_utf8(&bytes[..params_start]).map_err(|_| ProtocolError::InvalidEncoding)?;
    Ok((head, String::from_utf8_lossy(&bytes[params_start..]), command_end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockPeer;

    fn feed(reader: &mut LineReader, bytes: &[u8]) -> Vec<ReadOutcome> {
        bytes.iter().filter_map(|b| reader.push_byte(*b)).collect()
    }

    #[test]
    fn splits_command_and_params() {
        let mut reader = LineReader::default();
        assert_eq!(feed(&mut reader, b"retr   a file.txt\r\n"), vec![ReadOutcome::Line(17)]);
        assert_eq!(reader.command(), "RETR");
        assert_eq!(reader.params(), "a file.txt");
    }

    #[test]
    fn bare_commands_up_to_four_chars() {
        let mut reader = LineReader::default();
        assert_eq!(feed(&mut reader, b"pwd\r\n"), vec![ReadOutcome::Line(3)]);
        assert_eq!(reader.command(), "PWD");
        assert_eq!(reader.params(), "");

        assert_eq!(feed(&mut reader, b"NOOP\n"), vec![ReadOutcome::Line(4)]);
        assert_eq!(reader.command(), "NOOP");
    }

    #[test]
    fn long_tokens_are_syntax_errors() {
        let mut reader = LineReader::default();
        assert_eq!(
            feed(&mut reader, b"NOOPS\r\n"),
            vec![ReadOutcome::SyntaxError(ProtocolError::CommandTooLong(5))]
        );
        assert_eq!(
            feed(&mut reader, b"LOGOUT now\r\n"),
            vec![ReadOutcome::SyntaxError(ProtocolError::CommandTooLong(6))]
        );
        // accumulator was reset
        assert_eq!(feed(&mut reader, b"QUIT\r\n"), vec![ReadOutcome::Line(4)]);
    }

    #[test]
    fn empty_line_is_signalled() {
        let mut reader = LineReader::default();
        assert_eq!(feed(&mut reader, b"\r\n"), vec![ReadOutcome::EmptyLine]);
    }

    #[test]
    fn backslashes_become_slashes() {
        let mut reader = LineReader::default();
        feed(&mut reader, b"CWD \\dir\\sub\r\n");
        assert_eq!(reader.params(), "/dir/sub");
    }

    #[test]
    fn non_utf8_params_are_decoded_lossily() {
        let mut reader = LineReader::default();
        let outcomes = feed(&mut reader, b"retr caf\xe9.txt\r\n");
        assert!(matches!(outcomes.as_slice(), [ReadOutcome::Line(_)]));
        assert_eq!(reader.command(), "RETR");
        assert_eq!(reader.params(), "caf\u{FFFD}.txt");
    }

    #[test]
    fn non_utf8_command_token_is_a_syntax_error() {
        let mut reader = LineReader::default();
        assert_eq!(
            feed(&mut reader, b"RE\xffR x\r\n"),
            vec![ReadOutcome::SyntaxError(ProtocolError::InvalidEncoding)]
        );
        assert_eq!(feed(&mut reader, b"NOOP\r\n"), vec![ReadOutcome::Line(4)]);
    }

    #[test]
    fn overflow_resets_and_skips_rest_of_line() {
        let mut reader = LineReader::new(8);
        let outcomes = feed(&mut reader, b"STOR abcdefghij\r\nNOOP\r\n");
        assert_eq!(
            outcomes,
            vec![
                ReadOutcome::SyntaxError(ProtocolError::LineTooLong(8)),
                ReadOutcome::Line(4)
            ]
        );
        assert_eq!(reader.command(), "NOOP");
    }

    #[test]
    fn reads_at_most_one_line_per_call() {
        let peer = MockPeer::default();
        let mut conn = peer.connection();
        let mut reader = LineReader::default();

        assert_eq!(reader.read_line(conn.as_mut()), ReadOutcome::NoData);
        peer.send(b"USER bob\r\nPASS se");
        assert_eq!(reader.read_line(conn.as_mut()), ReadOutcome::Line(8));
        assert_eq!(reader.params(), "bob");
        assert_eq!(reader.read_line(conn.as_mut()), ReadOutcome::NoData);
        peer.send(b"cret\r\n");
        assert_eq!(reader.read_line(conn.as_mut()), ReadOutcome::Line(11));
        assert_eq!(reader.command(), "PASS");
        assert_eq!(reader.params(), "secret");
    }
}
