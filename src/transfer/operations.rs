//! Transfer engine
//!
//! Owns the data channel and at most one transfer. The session hands it an
//! open file once RETR or STOR has been accepted, then calls `step` once
//! per poll until it reports the transfer finished.

use log::{error, info, warn};
use std::net::Ipv4Addr;

use crate::constants::DATA_CONNECT_TIMEOUT_MS;
use crate::error::TransferError;
use crate::protocol::responses::{ControlChannel, TRANSFER_ABORTED, TRANSFER_COMPLETE};
use crate::storage::FileHandle;
use crate::transfer::data_channel::DataChannel;
use crate::transfer::file_ops::{Transfer, retrieve_step, store_step};
use crate::transfer::modes::DataEndpoint;
use crate::transfer::results::{Direction, PumpStatus, TransferSummary};
use crate::transport::Listener;
use crate::utils::Clock;

pub struct TransferEngine {
    data: DataChannel,
    active: Option<Transfer>,
    buffer: Vec<u8>,
    last_bytes: u64,
}

impl TransferEngine {
    pub fn new(buffer_size: usize, data_port: u16) -> Self {
        Self {
            data: DataChannel::new(data_port),
            active: None,
            buffer: vec![0; buffer_size],
            last_bytes: 0,
        }
    }

    pub fn data(&self) -> &DataChannel {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataChannel {
        &mut self.data
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn direction(&self) -> Option<Direction> {
        self.active.as_ref().map(|t| t.direction)
    }

    /// Bytes moved by the current transfer, or by the last one once finalised
    pub fn bytes_transferred(&self) -> u64 {
        self.active.as_ref().map_or(self.last_bytes, |t| t.bytes)
    }

    /// Establish the data connection within the fixed bound
    pub fn connect(&mut self, listener: &mut dyn Listener, clock: &dyn Clock) -> Result<(), TransferError> {
        self.data.connect(listener, clock, DATA_CONNECT_TIMEOUT_MS)
    }

    /// Arm a pump for `file`; the data connection must already be up
    pub fn begin(&mut self, direction: Direction, file: Box<dyn FileHandle>, now: u64) {
        if let Some(mut previous) = self.active.take() {
            warn!("Replacing unfinished {} transfer", previous.direction);
            previous.file.close();
        }
        self.last_bytes = 0;
        self.active = Some(Transfer::new(direction, file, now));
        info!("Starting {} transfer", direction);
    }

    /// Advance the active transfer by one chunk. Returns whether it is still in progress.
    pub fn step(&mut self, control: &mut ControlChannel, clock: &dyn Clock) -> bool {
        let Some(transfer) = self.active.as_mut() else {
            return false;
        };

        let status = match transfer.direction {
            Direction::Retrieve => retrieve_step(transfer, &mut self.data, &mut self.buffer),
            Direction::Store => {
                match store_step(transfer, &mut self.data, &mut self.buffer, clock.now_millis()) {
                    Ok(status) => status,
                    Err(e) => {
                        error!("Store failed: {}", e);
                        self.abort(control);
                        return false;
                    }
                }
            }
        };

        match status {
            PumpStatus::InProgress => true,
            PumpStatus::Finished => {
                self.close_transfer(control, clock.now_millis());
                false
            }
        }
    }

    /// Finalise the active transfer: close both ends and report the summary.
    /// Bytes already moved are kept.
    pub fn close_transfer(&mut self, control: &mut ControlChannel, now: u64) -> Option<TransferSummary> {
        let mut transfer = self.active.take()?;
        transfer.file.close();
        self.data.close();
        self.last_bytes = transfer.bytes;

        let summary = TransferSummary {
            direction: transfer.direction,
            bytes: transfer.bytes,
            elapsed_ms: now.saturating_sub(transfer.started_at),
        };
        let lines = summary.reply_lines();
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        control.reply_multiline(TRANSFER_COMPLETE, &lines);
        info!(
            "Transfer finished: {} {} bytes in {} ms",
            summary.direction, summary.bytes, summary.elapsed_ms
        );
        Some(summary)
    }

    /// Abort the active transfer, if any. A no-op otherwise.
    pub fn abort(&mut self, control: &mut ControlChannel) {
        if let Some(mut transfer) = self.active.take() {
            transfer.file.close();
            self.data.close();
            self.last_bytes = transfer.bytes;
            control.reply(TRANSFER_ABORTED, "Transfer aborted");
            warn!(
                "Transfer aborted: {} after {} bytes",
                transfer.direction, transfer.bytes
            );
        }
    }

    /// Back to defaults for a new client. Call `abort` first.
    pub fn reset(&mut self, data_port: u16) {
        self.active = None;
        self.last_bytes = 0;
        self.data.set_passive(DataEndpoint::new(Ipv4Addr::UNSPECIFIED, data_port));
    }
}
