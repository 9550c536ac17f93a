//! Utility functions
//!
//! Provides the clock, logging and host-port helpers.

pub mod clock;
pub mod logging;
pub mod network;

pub use clock::{Clock, ManualClock, SystemClock};
