//! Error handlers
//!
//! Maps server errors onto the status codes reported to the client.

use crate::error::types::{FtpServerError, StorageError, TransferError};
use log::error;

/// Handle an FTP server error
pub fn handle_error(err: &FtpServerError) {
    error!("FTP Server Error: {}", err);
}

/// Convert error to FTP response code
pub fn error_to_ftp_code(err: &FtpServerError) -> u16 {
    match err {
        FtpServerError::Auth(_) => 530,
        FtpServerError::Protocol(_) => 500,
        FtpServerError::Navigate(_) => 500,
        FtpServerError::Storage(e) => match e {
            StorageError::FileNotFound(_) => 550,
            StorageError::FileAlreadyExists(_) => 553,
            StorageError::OpenFailed(..) | StorageError::RemoveFailed(..) => 450,
            StorageError::RenameFailed(..) | StorageError::IoError(_) => 451,
        },
        FtpServerError::Transfer(e) => match e {
            TransferError::NoDataConnection { .. } => 425,
            TransferError::InvalidPortCommand(_) => 501,
            TransferError::DataWriteFailed(_) => 426,
        },
        FtpServerError::IoError(_) => 451,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthError, NavigateError, ProtocolError};

    #[test]
    fn maps_domain_errors_to_reply_codes() {
        let cases: Vec<(FtpServerError, u16)> = vec![
            (AuthError::UserNotFound("eve".into()).into(), 530),
            (ProtocolError::CommandTooLong(6).into(), 500),
            (NavigateError::PathTooLong { len: 300, max: 263 }.into(), 500),
            (StorageError::FileNotFound("/a".into()).into(), 550),
            (StorageError::FileAlreadyExists("/a".into()).into(), 553),
            (TransferError::NoDataConnection { waited_ms: 5000 }.into(), 425),
        ];
        for (err, code) in cases {
            assert_eq!(error_to_ftp_code(&err), code, "{}", err);
        }
    }
}
