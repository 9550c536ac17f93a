//! Server core functionality
//!
//! The session controller driven by the host loop.

pub mod core;

pub use core::Server;
