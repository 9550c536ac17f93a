//! FTP command table
//!
//! Maps the upper-cased command token onto the supported command set and
//! defines the result every handler returns.

/// Every command the session understands after login
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Command {
    // access control
    Cdup,
    Cwd,
    Pwd,
    Quit,
    // transfer parameters
    Mode,
    Stru,
    Type,
    Pasv,
    Port,
    // service
    Abor,
    Dele,
    List,
    Mlsd,
    Nlst,
    Noop,
    Retr,
    Stor,
    Mkd,
    Rmd,
    Rnfr,
    Rnto,
    // extensions
    Feat,
    Mdtm,
    Size,
    Site,
    Unknown,
}

impl Command {
    pub fn from_token(token: &str) -> Command {
        match token {
            "CDUP" => Command::Cdup,
            "CWD" => Command::Cwd,
            "PWD" => Command::Pwd,
            "QUIT" => Command::Quit,
            "MODE" => Command::Mode,
            "STRU" => Command::Stru,
            "TYPE" => Command::Type,
            "PASV" => Command::Pasv,
            "PORT" => Command::Port,
            "ABOR" => Command::Abor,
            "DELE" => Command::Dele,
            "LIST" => Command::List,
            "MLSD" => Command::Mlsd,
            "NLST" => Command::Nlst,
            "NOOP" => Command::Noop,
            "RETR" => Command::Retr,
            "STOR" => Command::Stor,
            "MKD" => Command::Mkd,
            "RMD" => Command::Rmd,
            "RNFR" => Command::Rnfr,
            "RNTO" => Command::Rnto,
            "FEAT" => Command::Feat,
            "MDTM" => Command::Mdtm,
            "SIZE" => Command::Size,
            "SITE" => Command::Site,
            _ => Command::Unknown,
        }
    }
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    /// CRLF-terminated reply text, possibly several lines
    pub message: Option<String>,
}

impl CommandResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Success,
            message: Some(message.into()),
        }
    }

    pub fn failure(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Failure(reason.into()),
            message: Some(message.into()),
        }
    }

    pub fn close() -> Self {
        Self {
            status: CommandStatus::CloseConnection,
            message: None,
        }
    }
}
