//! Module `state`
//!
//! Session phases and the per-client state reset on every new connection.

use std::fmt;

/// Phase of the control-connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Drop any stale connection
    Init,
    /// Abort transfers and reset session variables
    Wait,
    /// Waiting for a client to connect
    Check,
    /// Expecting `USER`
    UserId,
    /// Expecting `PASS`
    Password,
    /// Authenticated
    LoginOk,
}

impl Phase {
    /// Phases in which the idle deadline is enforced.
    pub fn is_timed(self) -> bool {
        matches!(self, Phase::UserId | Phase::Password | Phase::LoginOk)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::Wait => "wait",
            Phase::Check => "check",
            Phase::UserId => "user-id",
            Phase::Password => "password",
            Phase::LoginOk => "login-ok",
        };
        f.write_str(name)
    }
}

/// Directory and rename bookkeeping of the current client.
#[derive(Debug)]
pub struct SessionState {
    cwd: String,
    rename_from: String,
    rename_pending: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            cwd: "/".to_string(),
            rename_from: String::new(),
            rename_pending: false,
        }
    }
}

impl SessionState {
    /// Back to root with no rename pending
    pub fn reset(&mut self) {
        self.cwd.clear();
        self.cwd.push('/');
        self.clear_rename();
    }

    // --------------------
    // Getter methods
    // --------------------

    /// Current working directory, always absolute
    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    /// Source path recorded by the last successful RNFR
    pub fn rename_from(&self) -> Option<&str> {
        self.rename_pending.then_some(self.rename_from.as_str())
    }

    pub fn is_rename_pending(&self) -> bool {
        self.rename_pending
    }

    // --------------------
    // Setter methods
    // --------------------

    /// Record a validated rename source.
    pub fn set_rename_from(&mut self, path: &str) {
        self.rename_from.clear();
        self.rename_from.push_str(path);
        self.rename_pending = true;
    }

    pub fn clear_rename(&mut self) {
        self.rename_from.clear();
        self.rename_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_source_only_visible_while_pending() {
        let mut state = SessionState::default();
        assert_eq!(state.rename_from(), None);

        state.set_rename_from("/a.txt");
        assert_eq!(state.rename_from(), Some("/a.txt"));

        state.reset();
        assert!(!state.is_rename_pending());
        assert_eq!(state.rename_from(), None);
        assert_eq!(state.cwd(), "/");
    }

    #[test]
    fn only_client_phases_are_timed() {
        assert!(!Phase::Init.is_timed());
        assert!(!Phase::Wait.is_timed());
        assert!(!Phase::Check.is_timed());
        assert!(Phase::UserId.is_timed());
        assert!(Phase::LoginOk.is_timed());
    }
}
