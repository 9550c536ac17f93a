//! Client session management
//!
//! The single session: control channel, line reader, phase, idle deadline
//! and the transfer engine. Re-initialised for every new client.

use log::debug;

use crate::client::state::{Phase, SessionState};
use crate::config::ServerConfig;
use crate::protocol::parser::LineReader;
use crate::protocol::responses::ControlChannel;
use crate::transfer::TransferEngine;

pub struct Session {
    pub phase: Phase,
    pub control: ControlChannel,
    pub reader: LineReader,
    pub state: SessionState,
    pub transfer: TransferEngine,
    /// Clock value after which the client is dropped
    pub idle_deadline: u64,
}

impl Session {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            phase: Phase::Init,
            control: ControlChannel::default(),
            reader: LineReader::default(),
            state: SessionState::default(),
            transfer: TransferEngine::new(config.buffer_size, config.data_port),
            idle_deadline: 0,
        }
    }

    /// Session variables back to defaults. Any transfer must be aborted first.
    pub fn reset(&mut self, config: &ServerConfig) {
        self.reader.reset();
        self.state.reset();
        self.transfer.reset(config.data_port);
        self.idle_deadline = 0;
        debug!("Session reset");
    }

    pub fn arm_deadline(&mut self, now: u64, millis: u64) {
        self.idle_deadline = now.saturating_add(millis);
    }

    pub fn deadline_passed(&self, now: u64) -> bool {
        now >= self.idle_deadline
    }
}
