//! FTP Protocol implementation
//!
//! Command-line framing, the command table, handlers and reply formatting.

pub mod commands;
pub mod handlers;
pub mod listing;
pub mod parser;
pub mod responses;

pub use commands::{Command, CommandResult, CommandStatus};
pub use handlers::{CommandContext, disconnect_client, handle_command};
pub use parser::{LineReader, ReadOutcome};
pub use responses::ControlChannel;
