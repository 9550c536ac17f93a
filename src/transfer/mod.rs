//! Transfer module for FTP server
//!
//! Handles the data channel and the chunked retrieve/store pumps.

pub mod data_channel;
pub mod file_ops;
pub mod modes;
pub mod operations;
pub mod results;

pub use data_channel::DataChannel;
pub use file_ops::Transfer;
pub use modes::{DataEndpoint, DataMode};
pub use operations::TransferEngine;
pub use results::{Direction, PumpStatus, TransferSummary};
