//! Scripted in-memory transport for unit tests

use std::collections::VecDeque;
use std::io;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use super::{Connection, Listener};

#[derive(Default)]
pub struct PeerState {
    pub inbound: VecDeque<u8>,
    pub outbound: Vec<u8>,
    pub peer_closed: bool,
    pub closed_locally: bool,
}

/// Test-side handle onto a mock connection
#[derive(Clone, Default)]
pub struct MockPeer {
    state: Arc<Mutex<PeerState>>,
}

impl MockPeer {
    pub fn send(&self, bytes: &[u8]) {
        self.state.lock().unwrap().inbound.extend(bytes.iter().copied());
    }

    pub fn send_line(&self, line: &str) {
        self.send(format!("{line}\r\n").as_bytes());
    }

    pub fn hang_up(&self) {
        self.state.lock().unwrap().peer_closed = true;
    }

    /// Everything written so far, drained
    pub fn take_output(&self) -> String {
        let mut state = self.state.lock().unwrap();
        let out = String::from_utf8_lossy(&state.outbound).into_owned();
        state.outbound.clear();
        out
    }

    pub fn output_bytes(&self) -> Vec<u8> {
        self.state.lock().unwrap().outbound.clone()
    }

    pub fn closed_locally(&self) -> bool {
        self.state.lock().unwrap().closed_locally
    }

    pub fn connection(&self) -> Box<dyn Connection> {
        Box::new(MockConnection {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct MockConnection {
    state: Arc<Mutex<PeerState>>,
}

impl Connection for MockConnection {
    fn is_connected(&mut self) -> bool {
        let state = self.state.lock().unwrap();
        !state.closed_locally && (!state.peer_closed || !state.inbound.is_empty())
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut state = self.state.lock().unwrap();
        if state.closed_locally {
            return None;
        }
        state.inbound.pop_front()
    }

    fn available(&mut self) -> usize {
        let state = self.state.lock().unwrap();
        if state.closed_locally { 0 } else { state.inbound.len() }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        let n = buf.len().min(state.inbound.len());
        for slot in buf.iter_mut().take(n) {
            *slot = state.inbound.pop_front().unwrap_or_default();
        }
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.closed_locally || state.peer_closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock closed"));
        }
        state.outbound.extend_from_slice(buf);
        Ok(())
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::new(192, 168, 4, 1))
    }

    fn close(&mut self) {
        self.state.lock().unwrap().closed_locally = true;
    }
}

/// Listener whose pending connections are queued by the test
#[derive(Clone, Default)]
pub struct MockListener {
    queue: Arc<Mutex<VecDeque<MockPeer>>>,
}

impl MockListener {
    /// Queue a new inbound connection and return the client side of it
    pub fn connect(&self) -> MockPeer {
        let peer = MockPeer::default();
        self.queue.lock().unwrap().push_back(peer.clone());
        peer
    }
}

impl Listener for MockListener {
    fn has_pending_accept(&mut self) -> bool {
        !self.queue.lock().unwrap().is_empty()
    }

    fn accept(&mut self) -> Option<Box<dyn Connection>> {
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .map(|peer| peer.connection())
    }
}
