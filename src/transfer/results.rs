//! Transfer result types

use std::fmt;

/// Direction of an in-flight transfer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Direction {
    /// RETR: file to client
    Retrieve,
    /// STOR: client to file
    Store,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Retrieve => write!(f, "retrieve"),
            Direction::Store => write!(f, "store"),
        }
    }
}

/// Outcome of one pump step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PumpStatus {
    InProgress,
    Finished,
}

/// Figures reported when a transfer is finalised
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSummary {
    pub direction: Direction,
    pub bytes: u64,
    pub elapsed_ms: u64,
}

impl TransferSummary {
    /// Reply lines sent on the control connection
    pub fn reply_lines(&self) -> Vec<String> {
        if self.elapsed_ms > 0 && self.bytes > 0 {
            vec![
                "File successfully transferred".to_string(),
                format!(
                    "{} ms, {} kbytes/s",
                    self.elapsed_ms,
                    self.bytes / self.elapsed_ms
                ),
            ]
        } else {
            vec!["File successfully transferred".to_string()]
        }
    }
}
