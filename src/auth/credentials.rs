//! Credential storage
//!
//! The server accepts exactly one username/password pair, fixed at start-up.

use crate::config::ServerConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.username.clone(), config.password.clone())
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}
