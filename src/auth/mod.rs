//! Authentication
//!
//! Single fixed credential pair checked during the login sequence.

pub mod credentials;
pub mod validator;

pub use credentials::Credentials;
pub use validator::{validate_password, validate_user};
