//! Module `file_ops`
//!
//! The retrieve and store pumps. Each call moves at most one chunk between
//! the open file and the data connection.

use log::{debug, error, warn};

use crate::constants::STORE_QUIET_MS;
use crate::storage::FileHandle;
use crate::transfer::data_channel::DataChannel;
use crate::transfer::results::{Direction, PumpStatus};

/// A transfer in flight
pub struct Transfer {
    pub direction: Direction,
    pub file: Box<dyn FileHandle>,
    pub started_at: u64,
    pub bytes: u64,
}

impl Transfer {
    pub fn new(direction: Direction, file: Box<dyn FileHandle>, started_at: u64) -> Self {
        Self {
            direction,
            file,
            started_at,
            bytes: 0,
        }
    }
}

/// One retrieve step: file chunk out to the data connection.
///
/// Finishes on end of file, on a dead data connection, or when either side errors.
pub fn retrieve_step(transfer: &mut Transfer, data: &mut DataChannel, buf: &mut [u8]) -> PumpStatus {
    if !data.is_live() {
        debug!("Data connection gone during retrieve");
        return PumpStatus::Finished;
    }

    let n = match transfer.file.read_chunk(buf) {
        Ok(0) => return PumpStatus::Finished,
        Ok(n) => n,
        Err(e) => {
            error!("Read error during retrieve: {}", e);
            return PumpStatus::Finished;
        }
    };

    if let Err(e) = data.write_all(&buf[..n]) {
        warn!("{}", e);
        return PumpStatus::Finished;
    }

    transfer.bytes += n as u64;
    debug!("Sent {} bytes ({} total)", n, transfer.bytes);
    PumpStatus::InProgress
}

/// One store step: whatever the data connection has buffered, up to one
/// chunk, appended to the file.
///
/// Finishes only once the connection is gone, nothing was available this
/// step and the transfer has run for at least the quiet interval.
pub fn store_step(
    transfer: &mut Transfer,
    data: &mut DataChannel,
    buf: &mut [u8],
    now: u64,
) -> Result<PumpStatus, std::io::Error> {
    let available = data.available().min(buf.len());
    if available > 0 {
        let n = data.read(&mut buf[..available])?;
        if n > 0 {
            transfer.file.write_chunk(&buf[..n])?;
            transfer.bytes += n as u64;
            debug!("Stored {} bytes ({} total)", n, transfer.bytes);
        }
    }

    if !data.is_live() && available == 0 && now.saturating_sub(transfer.started_at) > STORE_QUIET_MS {
        Ok(PumpStatus::Finished)
    } else {
        Ok(PumpStatus::InProgress)
    }
}
