//! Solo FTP Server
//!
//! A single-client FTP server built around a cooperative poll step:
//! `Server::handle_ftp` advances the session by one unit of work per call.

pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod navigate;
pub mod protocol;
pub mod server;
pub mod storage;
pub mod transfer;
pub mod transport;
pub mod utils;

pub use config::ServerConfig;
pub use server::Server;
