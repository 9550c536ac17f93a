//! Protocol constants that are not exposed through configuration

/// Capacity of the command-line accumulator, in bytes
pub const CMD_LINE_SIZE: usize = 255 + 8;

/// Capacity of a resolved path, in bytes. A path must stay strictly shorter.
pub const PATH_SIZE: usize = 255 + 8;

/// Longest accepted command token
pub const MAX_COMMAND_TOKEN: usize = 4;

/// Time a new client gets to complete USER/PASS
pub const LOGIN_TIMEOUT_MS: u64 = 10 * 1000;

/// Bound on waiting for the client to open the data connection
pub const DATA_CONNECT_TIMEOUT_MS: u64 = 5 * 1000;

/// A store is only finalised once it has been running at least this long
pub const STORE_QUIET_MS: u64 = 100;

/// MLSD timestamp used when the backend cannot report one
pub const FALLBACK_MODIFY_TIME: &str = "20000101000000";

pub const SERVER_NAME: &str = "Solo FTP Server";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
