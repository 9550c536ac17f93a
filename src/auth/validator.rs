//! Authentication validator
//!
//! Checks the USER and PASS lines of the login sequence against the
//! configured credential pair. Comparisons are exact and case-sensitive.

use super::credentials::Credentials;
use crate::error::AuthError;

/// Validate the line expected while waiting for the user identity.
pub fn validate_user(command: &str, username: &str, creds: &Credentials) -> Result<(), AuthError> {
    if command != "USER" {
        return Err(AuthError::UnexpectedCommand {
            expected: "USER",
            got: command.to_string(),
        });
    }

    if username == creds.username() {
        Ok(())
    } else {
        Err(AuthError::UserNotFound(username.to_string()))
    }
}

/// Validate the line expected while waiting for the password.
pub fn validate_password(
    command: &str,
    password: &str,
    creds: &Credentials,
) -> Result<(), AuthError> {
    if command != "PASS" {
        return Err(AuthError::UnexpectedCommand {
            expected: "PASS",
            got: command.to_string(),
        });
    }

    if password == creds.password() {
        Ok(())
    } else {
        Err(AuthError::InvalidPassword(creds.username().to_string()))
    }
}
