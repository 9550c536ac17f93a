//! Module `data_channel`
//!
//! Owns the single data connection. Connections always arrive on the
//! passive listener; active mode only changes what was negotiated.

use log::{debug, info, warn};
use std::io;
use std::net::Ipv4Addr;

use crate::error::TransferError;
use crate::transfer::modes::{DataEndpoint, DataMode};
use crate::transport::{Connection, Listener};
use crate::utils::Clock;

pub struct DataChannel {
    mode: DataMode,
    endpoint: DataEndpoint,
    conn: Option<Box<dyn Connection>>,
}

impl DataChannel {
    pub fn new(data_port: u16) -> Self {
        Self {
            mode: DataMode::Passive,
            endpoint: DataEndpoint::new(Ipv4Addr::UNSPECIFIED, data_port),
            conn: None,
        }
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn endpoint(&self) -> DataEndpoint {
        self.endpoint
    }

    /// Switch to passive mode, announcing `endpoint`
    pub fn set_passive(&mut self, endpoint: DataEndpoint) {
        self.close();
        self.mode = DataMode::Passive;
        self.endpoint = endpoint;
        debug!("Data connection set to passive on {}", endpoint);
    }

    /// Record an active-mode endpoint. Nothing is dialed.
    pub fn set_active(&mut self, endpoint: DataEndpoint) {
        self.close();
        self.mode = DataMode::Active;
        self.endpoint = endpoint;
        debug!("Data connection set to active, client endpoint {}", endpoint);
    }

    pub fn is_live(&mut self) -> bool {
        self.conn.as_mut().is_some_and(|c| c.is_connected())
    }

    /// Make sure a data connection exists, waiting up to `timeout_ms` for the
    /// client to open one. The wait pauses cooperatively through `clock`.
    pub fn connect(
        &mut self,
        listener: &mut dyn Listener,
        clock: &dyn Clock,
        timeout_ms: u64,
    ) -> Result<(), TransferError> {
        if self.is_live() {
            debug!("Reusing established data connection");
            return Ok(());
        }

        if self.mode == DataMode::Active {
            warn!(
                "Active mode endpoint {} is not dialed; waiting for the client on the data port",
                self.endpoint
            );
        }

        let start = clock.now_millis();
        while !listener.has_pending_accept() && clock.now_millis() - start < timeout_ms {
            clock.pause();
        }

        match listener.accept() {
            Some(conn) => {
                self.close();
                self.conn = Some(conn);
                info!(
                    "Data connection accepted after {} ms",
                    clock.now_millis() - start
                );
                Ok(())
            }
            None => {
                let waited_ms = clock.now_millis() - start;
                warn!("No data connection after {} ms", waited_ms);
                Err(TransferError::NoDataConnection { waited_ms })
            }
        }
    }

    pub fn available(&mut self) -> usize {
        self.conn.as_mut().map_or(0, |c| c.available())
    }

    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.conn.as_mut() {
            Some(conn) => conn.read(buf),
            None => Ok(0),
        }
    }

    pub fn write_all(&mut self, buf: &[u8]) -> Result<(), TransferError> {
        match self.conn.as_mut() {
            Some(conn) => conn.write_all(buf).map_err(TransferError::DataWriteFailed),
            None => Err(TransferError::DataWriteFailed(io::Error::new(
                io::ErrorKind::NotConnected,
                "no data connection",
            ))),
        }
    }

    pub fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
            debug!("Data connection closed");
        }
    }
}
