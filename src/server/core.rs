//! Session controller
//!
//! `Server::handle_ftp` is the single poll step the host calls repeatedly.
//! Each call swaps in a newly accepted control connection, advances the
//! phase machine by at most one command line, moves at most one chunk of
//! an active transfer and enforces the idle deadline.

use log::{debug, info, warn};
use std::io;

use crate::auth::Credentials;
use crate::client::{Phase, Session};
use crate::config::ServerConfig;
use crate::constants::{LOGIN_TIMEOUT_MS, SERVER_NAME, SERVER_VERSION};
use crate::error::{FtpServerError, error_to_ftp_code};
use crate::protocol::commands::CommandStatus;
use crate::protocol::handlers::{
    CommandContext, disconnect_client, handle_cmd_pass, handle_cmd_user, handle_command,
};
use crate::protocol::parser::ReadOutcome;
use crate::protocol::responses::{AUTH_FAILED, READY, SERVICE_CLOSING};
use crate::storage::{Filesystem, LocalFilesystem};
use crate::transport::Listener;
use crate::transport::tcp::TcpEndpoint;
use crate::utils::{Clock, SystemClock};

pub struct Server {
    config: ServerConfig,
    credentials: Credentials,
    control_listener: Box<dyn Listener>,
    data_listener: Box<dyn Listener>,
    fs: Box<dyn Filesystem>,
    clock: Box<dyn Clock>,
    session: Session,
}

impl Server {
    pub fn new(
        config: ServerConfig,
        control_listener: Box<dyn Listener>,
        data_listener: Box<dyn Listener>,
        fs: Box<dyn Filesystem>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let credentials = Credentials::from_config(&config);
        let session = Session::new(&config);
        Self {
            config,
            credentials,
            control_listener,
            data_listener,
            fs,
            clock,
            session,
        }
    }

    /// Bind both TCP endpoints and serve files below `server_root`.
    pub fn bind(config: ServerConfig) -> io::Result<Self> {
        let control = TcpEndpoint::bind(config.control_socket())?;
        info!("Control endpoint bound to {}", control.local_addr()?);
        let data = TcpEndpoint::bind(config.data_socket())?;
        info!("Data endpoint bound to {}", data.local_addr()?);

        let fs = LocalFilesystem::new(config.server_root_path());
        info!("Serving files from {}", config.server_root);

        Ok(Self::new(
            config,
            Box::new(control),
            Box::new(data),
            Box::new(fs),
            Box::new(SystemClock::new()),
        ))
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// One poll step. Returns whether a transfer is still in progress.
    pub fn handle_ftp(&mut self) -> bool {
        self.accept_control();

        let mut line_received = false;
        match self.session.phase {
            Phase::Init => {
                if self.session.control.is_connected() {
                    disconnect_client(&mut self.session.control, &mut self.session.transfer);
                }
                self.session.phase = Phase::Wait;
            }
            Phase::Wait => {
                self.session.transfer.abort(&mut self.session.control);
                self.session.reset(&self.config);
                info!(
                    "Waiting for a client on port {}",
                    self.config.control_port
                );
                self.session.phase = Phase::Check;
            }
            Phase::Check => {
                if self.session.control.is_connected() {
                    self.client_connected();
                }
            }
            Phase::UserId | Phase::Password | Phase::LoginOk => {
                line_received = self.poll_client();
            }
        }

        let now = self.clock.now_millis();
        if self.session.transfer.is_active() {
            let in_progress = self
                .session
                .transfer
                .step(&mut self.session.control, self.clock.as_ref());
            if self.session.phase == Phase::LoginOk {
                self.session
                    .arm_deadline(now, self.config.idle_timeout_millis());
            }
            return in_progress;
        }

        if self.session.phase.is_timed() && !line_received && self.session.deadline_passed(now) {
            warn!("Session timed out in phase {}", self.session.phase);
            self.session.control.reply(AUTH_FAILED, "Timeout");
            self.session.phase = Phase::Init;
        }
        false
    }

    /// Tear the session down for process shutdown.
    pub fn shutdown(&mut self) {
        if self.session.control.is_connected() {
            self.session.transfer.abort(&mut self.session.control);
            self.session
                .control
                .reply(SERVICE_CLOSING, "Service closing control connection");
        }
        self.session.control.close();
        self.session.transfer.data_mut().close();
        self.session.phase = Phase::Init;
        info!("Server shut down");
    }

    /// A newly accepted control connection replaces the current one and
    /// always starts from a fresh session.
    fn accept_control(&mut self) {
        if !self.control_listener.has_pending_accept() {
            return;
        }
        let Some(conn) = self.control_listener.accept() else {
            return;
        };

        info!("Client connected");
        if self.session.phase != Phase::Check {
            self.session.transfer.abort(&mut self.session.control);
            self.session.phase = Phase::Wait;
        }
        self.session.control.attach(conn);
    }

    fn client_connected(&mut self) {
        let welcome = format!("--- Welcome to {} ---", SERVER_NAME);
        let version = format!("--- Version {} ---", SERVER_VERSION);
        self.session
            .control
            .reply_multiline(READY, &[welcome.as_str(), version.as_str()]);

        self.session.reader.reset();
        let now = self.clock.now_millis();
        self.session.arm_deadline(now, LOGIN_TIMEOUT_MS);
        self.session.phase = Phase::UserId;
    }

    /// Read from the client and act on at most one complete line. Returns
    /// whether a line was processed.
    fn poll_client(&mut self) -> bool {
        let outcome = match self.session.control.connection_mut() {
            Some(conn) => self.session.reader.read_line(conn),
            None => ReadOutcome::NoData,
        };

        match outcome {
            ReadOutcome::Line(_) => {
                self.process_line();
                return true;
            }
            ReadOutcome::SyntaxError(e) => {
                warn!("{}", e);
                let code = error_to_ftp_code(&FtpServerError::from(e));
                self.session.control.reply(code, "Syntax error");
            }
            ReadOutcome::EmptyLine | ReadOutcome::NoData => {}
        }

        if !self.session.control.is_connected() {
            info!("Client disconnected");
            self.session.control.close();
            self.session.phase = Phase::Wait;
        }
        false
    }

    fn process_line(&mut self) {
        let command = self.session.reader.command();
        let params = self.session.reader.params();
        let now = self.clock.now_millis();

        match self.session.phase {
            Phase::UserId => {
                let result = handle_cmd_user(command, params, &self.credentials);
                if let Some(message) = &result.message {
                    self.session.control.send_raw(message);
                }
                self.session.phase = match result.status {
                    CommandStatus::Success => Phase::Password,
                    _ => Phase::Init,
                };
            }
            Phase::Password => {
                let result = handle_cmd_pass(command, params, &self.credentials);
                if let Some(message) = &result.message {
                    self.session.control.send_raw(message);
                }
                if result.status == CommandStatus::Success {
                    self.session.phase = Phase::LoginOk;
                    self.session
                        .arm_deadline(now, self.config.idle_timeout_millis());
                } else {
                    self.session.phase = Phase::Init;
                }
            }
            Phase::LoginOk => {
                let mut ctx = CommandContext {
                    control: &mut self.session.control,
                    state: &mut self.session.state,
                    transfer: &mut self.session.transfer,
                    fs: self.fs.as_ref(),
                    data_listener: self.data_listener.as_mut(),
                    clock: self.clock.as_ref(),
                    config: &self.config,
                };
                if handle_command(&mut ctx, command, params) {
                    // handlers may have waited on the data connection
                    let now = self.clock.now_millis();
                    self.session
                        .arm_deadline(now, self.config.idle_timeout_millis());
                } else {
                    self.session.phase = Phase::Init;
                }
            }
            phase => debug!("Line ignored in phase {}", phase),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{MockListener, MockPeer};
    use crate::utils::ManualClock;
    use std::fs;

    struct Harness {
        root: tempfile::TempDir,
        server: Server,
        control: MockListener,
        data: MockListener,
        clock: ManualClock,
    }

    impl Harness {
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            let config = ServerConfig {
                username: "bob".into(),
                password: "secret".into(),
                ..ServerConfig::default()
            };
            let control = MockListener::default();
            let data = MockListener::default();
            let clock = ManualClock::new(100);
            let server = Server::new(
                config,
                Box::new(control.clone()),
                Box::new(data.clone()),
                Box::new(LocalFilesystem::new(root.path())),
                Box::new(clock.clone()),
            );
            let mut harness = Self {
                root,
                server,
                control,
                data,
                clock,
            };
            // Init -> Wait -> Check
            harness.steps(3);
            assert_eq!(harness.server.phase(), Phase::Check);
            harness
        }

        fn steps(&mut self, n: usize) {
            for _ in 0..n {
                self.server.handle_ftp();
            }
        }

        /// Connect a client and return it with the banner drained
        fn connect(&mut self) -> MockPeer {
            let peer = self.control.connect();
            self.server.handle_ftp();
            assert_eq!(self.server.phase(), Phase::UserId);
            assert!(peer.take_output().starts_with("220-"));
            peer
        }

        /// Send one line, run one step and return the replies
        fn send(&mut self, peer: &MockPeer, line: &str) -> String {
            peer.send_line(line);
            self.server.handle_ftp();
            peer.take_output()
        }

        fn login(&mut self) -> MockPeer {
            let peer = self.connect();
            assert_eq!(self.send(&peer, "USER bob"), "331 OK. Password required\r\n");
            assert_eq!(self.send(&peer, "PASS secret"), "230 OK.\r\n");
            assert_eq!(self.server.phase(), Phase::LoginOk);
            peer
        }
    }

    #[test]
    fn banner_carries_name_and_version() {
        let mut h = Harness::new();
        let peer = h.control.connect();
        h.server.handle_ftp();
        assert_eq!(
            peer.take_output(),
            format!(
                "220---- Welcome to {} ---\r\n220 --- Version {} ---\r\n",
                SERVER_NAME, SERVER_VERSION
            )
        );
    }

    #[test]
    fn login_pwd_and_store() {
        let mut h = Harness::new();
        let peer = h.login();
        assert_eq!(
            h.send(&peer, "PWD"),
            "257 \"/\" is your current directory\r\n"
        );

        let data = h.data.connect();
        data.send(b"0123456789");
        data.hang_up();
        assert_eq!(h.send(&peer, "STOR a.txt"), "150 Connected to port 50009\r\n");

        let mut steps = 0;
        h.clock.advance(200);
        while h.server.handle_ftp() {
            steps += 1;
            assert!(steps < 10);
        }
        let replies = peer.take_output();
        assert!(replies.starts_with("226"), "{}", replies);
        assert_eq!(fs::read(h.root.path().join("a.txt")).unwrap(), b"0123456789");
        assert_eq!(h.server.session().transfer.bytes_transferred(), 10);
    }

    #[test]
    fn retrieve_streams_file_and_reports_summary() {
        let mut h = Harness::new();
        fs::write(h.root.path().join("a.txt"), b"hello").unwrap();
        let peer = h.login();

        let data = h.data.connect();
        peer.send_line("RETR a.txt");
        assert!(h.server.handle_ftp());
        assert_eq!(
            peer.take_output(),
            "150-Connected to port 50009\r\n150 5 bytes to download\r\n"
        );
        h.clock.advance(10);
        assert!(!h.server.handle_ftp());
        assert_eq!(data.output_bytes(), b"hello");
        assert!(data.closed_locally());
        assert_eq!(
            peer.take_output(),
            "226-File successfully transferred\r\n226 10 ms, 0 kbytes/s\r\n"
        );
    }

    #[test]
    fn retr_missing_file() {
        let mut h = Harness::new();
        let peer = h.login();
        let replies = h.send(&peer, "RETR missing.txt");
        assert!(replies.contains("550 "));
        assert!(replies.contains("450 "));
        assert_eq!(h.clock.now_millis(), 0);
    }

    #[test]
    fn no_data_connection_within_five_seconds() {
        let mut h = Harness::new();
        let peer = h.login();
        assert_eq!(h.send(&peer, "STOR a.txt"), "425 No data connection\r\n");
        assert_eq!(h.clock.now_millis(), 5000);
        assert_eq!(h.server.phase(), Phase::LoginOk);
    }

    #[test]
    fn idle_timeout_resets_session() {
        let mut h = Harness::new();
        let peer = h.login();

        h.clock.advance(5 * 60 * 1000 - 1);
        h.server.handle_ftp();
        assert_eq!(peer.take_output(), "");

        h.clock.advance(1);
        h.server.handle_ftp();
        assert_eq!(peer.take_output(), "530 Timeout\r\n");
        assert_eq!(h.server.phase(), Phase::Init);

        h.server.handle_ftp();
        assert_eq!(peer.take_output(), "221 Goodbye\r\n");
        assert!(peer.closed_locally());
        assert_eq!(h.server.phase(), Phase::Wait);
    }

    #[test]
    fn login_must_complete_within_ten_seconds() {
        let mut h = Harness::new();
        let peer = h.connect();
        h.clock.advance(LOGIN_TIMEOUT_MS);
        h.server.handle_ftp();
        assert_eq!(peer.take_output(), "530 Timeout\r\n");
        assert_eq!(h.server.phase(), Phase::Init);
    }

    #[test]
    fn wrong_credentials_return_to_init() {
        let mut h = Harness::new();
        let peer = h.connect();
        assert_eq!(h.send(&peer, "USER eve"), "530 user not found\r\n");
        assert_eq!(h.server.phase(), Phase::Init);
        h.server.handle_ftp();
        assert!(peer.closed_locally());

        h.steps(2);
        let peer = h.connect();
        h.send(&peer, "USER bob");
        assert_eq!(h.send(&peer, "PASS guess"), "530 Wrong password\r\n");
        assert_eq!(h.server.phase(), Phase::Init);

        h.steps(3);
        let peer = h.connect();
        assert_eq!(h.send(&peer, "PASS secret"), "500 Syntax error\r\n");
        assert_eq!(h.server.phase(), Phase::Init);
    }

    #[test]
    fn rnto_without_rnfr() {
        let mut h = Harness::new();
        let peer = h.login();
        assert_eq!(h.send(&peer, "RNTO b.txt"), "503 Need RNFR before RNTO\r\n");
        assert!(!h.server.session().state.is_rename_pending());
    }

    #[test]
    fn syntax_errors_keep_session() {
        let mut h = Harness::new();
        let peer = h.login();
        assert_eq!(h.send(&peer, "NOOPS"), "500 Syntax error\r\n");
        assert_eq!(h.server.phase(), Phase::LoginOk);
        assert_eq!(h.send(&peer, "noop"), "200 Zzz...\r\n");
    }

    #[test]
    fn commands_renew_idle_deadline() {
        let mut h = Harness::new();
        let peer = h.login();
        h.clock.advance(4 * 60 * 1000);
        assert_eq!(h.send(&peer, "NOOP"), "200 Zzz...\r\n");
        h.clock.advance(4 * 60 * 1000);
        h.server.handle_ftp();
        assert_eq!(peer.take_output(), "");
        assert_eq!(h.server.phase(), Phase::LoginOk);
    }

    #[test]
    fn quit_returns_to_init() {
        let mut h = Harness::new();
        let peer = h.login();
        assert_eq!(h.send(&peer, "QUIT"), "221 Goodbye\r\n");
        assert!(peer.closed_locally());
        assert_eq!(h.server.phase(), Phase::Init);
        h.steps(2);
        assert_eq!(h.server.phase(), Phase::Check);
    }

    #[test]
    fn client_hang_up_returns_to_wait() {
        let mut h = Harness::new();
        let peer = h.login();
        peer.hang_up();
        h.server.handle_ftp();
        assert_eq!(h.server.phase(), Phase::Wait);
    }

    #[test]
    fn new_client_replaces_authenticated_one() {
        let mut h = Harness::new();
        let first = h.login();
        let second = h.control.connect();

        h.server.handle_ftp();
        assert!(first.closed_locally());
        assert_eq!(h.server.phase(), Phase::Check);
        h.server.handle_ftp();
        assert!(second.take_output().starts_with("220-"));
        assert_eq!(h.server.phase(), Phase::UserId);
    }

    #[test]
    fn shutdown_notifies_client() {
        let mut h = Harness::new();
        let peer = h.login();
        h.server.shutdown();
        assert_eq!(peer.take_output(), "421 Service closing control connection\r\n");
        assert!(peer.closed_locally());
        assert_eq!(h.server.phase(), Phase::Init);
    }
}
