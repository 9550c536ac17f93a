//! Error types
//!
//! Defines domain-specific error types for each module of the FTP server.

use std::fmt;
use std::io;

/// Authentication errors raised during the USER/PASS sequence
#[derive(Debug, PartialEq)]
pub enum AuthError {
    UnexpectedCommand { expected: &'static str, got: String },
    UserNotFound(String),
    InvalidPassword(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::UnexpectedCommand { expected, got } => {
                write!(f, "Expected {}, got {:?}", expected, got)
            }
            AuthError::UserNotFound(u) => write!(f, "User not found: {}", u),
            AuthError::InvalidPassword(u) => write!(f, "Invalid password for user: {}", u),
        }
    }
}

impl std::error::Error for AuthError {}

/// Command-line framing errors
#[derive(Debug, PartialEq)]
pub enum ProtocolError {
    LineTooLong(usize),
    CommandTooLong(usize),
    InvalidEncoding,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::LineTooLong(max) => write!(f, "Command line exceeds {} bytes", max),
            ProtocolError::CommandTooLong(len) => {
                write!(f, "Command token of {} characters exceeds 4", len)
            }
            ProtocolError::InvalidEncoding => write!(f, "Command line is not valid UTF-8"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Path resolution errors
#[derive(Debug, PartialEq)]
pub enum NavigateError {
    PathTooLong { len: usize, max: usize },
}

impl fmt::Display for NavigateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigateError::PathTooLong { len, max } => {
                write!(f, "Path of {} bytes reaches the {} byte limit", len, max)
            }
        }
    }
}

impl std::error::Error for NavigateError {}

/// Storage backend errors
#[derive(Debug)]
pub enum StorageError {
    FileNotFound(String),
    FileAlreadyExists(String),
    OpenFailed(String, io::Error),
    RemoveFailed(String, io::Error),
    RenameFailed(String, io::Error),
    IoError(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::FileNotFound(p) => write!(f, "File not found: {}", p),
            StorageError::FileAlreadyExists(p) => write!(f, "File already exists: {}", p),
            StorageError::OpenFailed(p, e) => write!(f, "Failed to open {}: {}", p, e),
            StorageError::RemoveFailed(p, e) => write!(f, "Failed to remove {}: {}", p, e),
            StorageError::RenameFailed(p, e) => write!(f, "Failed to rename {}: {}", p, e),
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

/// Data connection and pump errors
#[derive(Debug)]
pub enum TransferError {
    NoDataConnection { waited_ms: u64 },
    InvalidPortCommand(String),
    DataWriteFailed(io::Error),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::NoDataConnection { waited_ms } => {
                write!(f, "No data connection after {} ms", waited_ms)
            }
            TransferError::InvalidPortCommand(msg) => write!(f, "Invalid PORT command: {}", msg),
            TransferError::DataWriteFailed(e) => write!(f, "Data write failed: {}", e),
        }
    }
}

impl std::error::Error for TransferError {}

/// General FTP server error that encompasses all error types
#[derive(Debug)]
pub enum FtpServerError {
    Auth(AuthError),
    Protocol(ProtocolError),
    Navigate(NavigateError),
    Storage(StorageError),
    Transfer(TransferError),
    IoError(io::Error),
}

impl fmt::Display for FtpServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpServerError::Auth(e) => write!(f, "Authentication error: {}", e),
            FtpServerError::Protocol(e) => write!(f, "Protocol error: {}", e),
            FtpServerError::Navigate(e) => write!(f, "Navigate error: {}", e),
            FtpServerError::Storage(e) => write!(f, "Storage error: {}", e),
            FtpServerError::Transfer(e) => write!(f, "Transfer error: {}", e),
            FtpServerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for FtpServerError {}

impl From<AuthError> for FtpServerError {
    fn from(error: AuthError) -> Self {
        FtpServerError::Auth(error)
    }
}

impl From<ProtocolError> for FtpServerError {
    fn from(error: ProtocolError) -> Self {
        FtpServerError::Protocol(error)
    }
}

impl From<NavigateError> for FtpServerError {
    fn from(error: NavigateError) -> Self {
        FtpServerError::Navigate(error)
    }
}

impl From<StorageError> for FtpServerError {
    fn from(error: StorageError) -> Self {
        FtpServerError::Storage(error)
    }
}

impl From<TransferError> for FtpServerError {
    fn from(error: TransferError) -> Self {
        FtpServerError::Transfer(error)
    }
}

impl From<io::Error> for FtpServerError {
    fn from(error: io::Error) -> Self {
        FtpServerError::IoError(error)
    }
}
