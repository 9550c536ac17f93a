//! Client session
//!
//! Phase machine state and the per-client session object.

pub mod session;
pub mod state;

pub use session::Session;
pub use state::{Phase, SessionState};
