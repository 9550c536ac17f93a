//! Command handlers module for the Solo FTP server.
//!
//! One handler per supported command. Handlers return a `CommandResult`
//! whose message is written to the control connection by `handle_command`;
//! commands that stream over the data connection also write their
//! preliminary 150 reply directly.

use log::{debug, info, warn};
use std::net::Ipv4Addr;

use crate::auth::{self, Credentials};
use crate::client::SessionState;
use crate::config::ServerConfig;
use crate::constants::PATH_SIZE;
use crate::error::handlers::handle_error;
use crate::error::{AuthError, FtpServerError, StorageError};
use crate::navigate::resolve_path;
use crate::protocol::commands::{Command, CommandResult, CommandStatus};
use crate::protocol::listing::{ListingFormat, render_listing};
use crate::protocol::responses::*;
use crate::storage::Filesystem;
use crate::transfer::{DataEndpoint, Direction, TransferEngine};
use crate::transport::Listener;
use crate::utils::Clock;
use crate::utils::network::{format_host_port, parse_host_port};

/// Everything a command handler may touch.
pub struct CommandContext<'a> {
    pub control: &'a mut ControlChannel,
    pub state: &'a mut SessionState,
    pub transfer: &'a mut TransferEngine,
    pub fs: &'a dyn Filesystem,
    pub data_listener: &'a mut dyn Listener,
    pub clock: &'a dyn Clock,
    pub config: &'a ServerConfig,
}

/// Dispatches a received FTP command to its corresponding handler and
/// sends the reply.
///
/// # Returns
///
/// * `false` only when the command ended the session (QUIT).
pub fn handle_command(ctx: &mut CommandContext<'_>, token: &str, params: &str) -> bool {
    let command = Command::from_token(token);
    debug!("Command {:?} {:?}", command, params);

    let result = match command {
        Command::Cdup => handle_cmd_cdup(ctx),
        Command::Cwd => handle_cmd_cwd(ctx, params),
        Command::Pwd => handle_cmd_pwd(ctx),
        Command::Quit => handle_cmd_quit(ctx),
        Command::Mode => handle_cmd_mode(params),
        Command::Stru => handle_cmd_stru(params),
        Command::Type => handle_cmd_type(params),
        Command::Pasv => handle_cmd_pasv(ctx),
        Command::Port => handle_cmd_port(ctx, params),
        Command::Abor => handle_cmd_abor(ctx),
        Command::Dele => handle_cmd_dele(ctx, params),
        Command::List => handle_cmd_listing(ctx, ListingFormat::List),
        Command::Mlsd => handle_cmd_listing(ctx, ListingFormat::Mlsd),
        Command::Nlst => handle_cmd_listing(ctx, ListingFormat::Nlst),
        Command::Noop => CommandResult::success(format_response(OK, "Zzz...")),
        Command::Retr => handle_cmd_retr(ctx, params),
        Command::Stor => handle_cmd_stor(ctx, params),
        Command::Mkd => CommandResult::failure(
            "Directory creation unsupported",
            format_response(FILE_NOT_FOUND, &format!("Can't create \"{}\"", params)),
        ),
        Command::Rmd => CommandResult::failure(
            "Directory removal unsupported",
            format_response(PARAMETER_ERROR, &format!("Can't delete \"{}\"", params)),
        ),
        Command::Rnfr => handle_cmd_rnfr(ctx, params),
        Command::Rnto => handle_cmd_rnto(ctx, params),
        Command::Feat => CommandResult::success(format_multiline(
            FEATURES,
            &["Extensions supported:", " MLSD", "End."],
        )),
        Command::Mdtm => CommandResult::failure(
            "MDTM unsupported",
            format_response(FILE_NOT_FOUND, "Unable to retrieve time"),
        ),
        Command::Size => handle_cmd_size(ctx, params),
        Command::Site => CommandResult::failure(
            "SITE unsupported",
            format_response(SYNTAX_ERROR, &format!("Unknown SITE command {}", params)),
        ),
        Command::Unknown => CommandResult::failure(
            format!("Unknown command {}", token),
            format_response(SYNTAX_ERROR, "Unknown command"),
        ),
    };

    if let CommandStatus::Failure(reason) = &result.status {
        debug!("{} failed: {}", token, reason);
    }
    if let Some(message) = &result.message {
        ctx.control.send_raw(message);
    }
    result.status != CommandStatus::CloseConnection
}

/// Abort any transfer, say goodbye and drop the control connection.
pub fn disconnect_client(control: &mut ControlChannel, transfer: &mut TransferEngine) {
    info!("Disconnecting client");
    transfer.abort(control);
    control.reply(GOODBYE, "Goodbye");
    control.close();
}

// ═══ LOGIN ═══

/// Handles the line received while expecting USER.
pub fn handle_cmd_user(command: &str, username: &str, creds: &Credentials) -> CommandResult {
    match auth::validate_user(command, username, creds) {
        Ok(()) => {
            info!("User {} accepted, waiting for password", username);
            CommandResult::success(format_response(PASSWORD_REQUIRED, "OK. Password required"))
        }
        Err(e @ AuthError::UnexpectedCommand { .. }) => {
            CommandResult::failure(e.to_string(), format_response(SYNTAX_ERROR, "Syntax error"))
        }
        Err(e) => {
            CommandResult::failure(e.to_string(), format_response(AUTH_FAILED, "user not found"))
        }
    }
}

/// Handles the line received while expecting PASS.
pub fn handle_cmd_pass(command: &str, password: &str, creds: &Credentials) -> CommandResult {
    match auth::validate_password(command, password, creds) {
        Ok(()) => {
            info!("User {} logged in", creds.username());
            CommandResult::success(format_response(LOGIN_SUCCESS, "OK."))
        }
        Err(e @ AuthError::UnexpectedCommand { .. }) => {
            CommandResult::failure(e.to_string(), format_response(SYNTAX_ERROR, "Syntax error"))
        }
        Err(e) => {
            CommandResult::failure(e.to_string(), format_response(AUTH_FAILED, "Wrong password"))
        }
    }
}

// ═══ ACCESS CONTROL ═══

/// Directory tracking stays at the root: CDUP is acknowledged without moving.
fn handle_cmd_cdup(ctx: &mut CommandContext<'_>) -> CommandResult {
    CommandResult::success(format_response(
        FILE_ACTION_OK,
        &format!("Ok. Current directory is {}", ctx.state.cwd()),
    ))
}

/// `CWD .` behaves like PWD; any other target is acknowledged without moving.
fn handle_cmd_cwd(ctx: &mut CommandContext<'_>, params: &str) -> CommandResult {
    if params == "." {
        return handle_cmd_pwd(ctx);
    }
    CommandResult::success(format_response(
        FILE_ACTION_OK,
        &format!("Ok. Current directory is {}", ctx.state.cwd()),
    ))
}

fn handle_cmd_pwd(ctx: &mut CommandContext<'_>) -> CommandResult {
    CommandResult::success(format_response(
        PATH_CREATED,
        &format!("\"{}\" is your current directory", ctx.state.cwd()),
    ))
}

fn handle_cmd_quit(ctx: &mut CommandContext<'_>) -> CommandResult {
    disconnect_client(ctx.control, ctx.transfer);
    CommandResult::close()
}

// ═══ TRANSFER PARAMETERS ═══

fn handle_cmd_mode(params: &str) -> CommandResult {
    if params == "S" {
        CommandResult::success(format_response(OK, "S Ok"))
    } else {
        CommandResult::failure(
            format!("Unsupported mode {}", params),
            format_response(NOT_IMPLEMENTED_PARAM, "Only S(tream) is supported"),
        )
    }
}

fn handle_cmd_stru(params: &str) -> CommandResult {
    if params == "F" {
        CommandResult::success(format_response(OK, "F Ok"))
    } else {
        CommandResult::failure(
            format!("Unsupported structure {}", params),
            format_response(NOT_IMPLEMENTED_PARAM, "Only F(ile) is supported"),
        )
    }
}

/// Informational only; both types transfer bytes unchanged.
fn handle_cmd_type(params: &str) -> CommandResult {
    match params {
        "A" => CommandResult::success(format_response(OK, "TYPE is now ASCII")),
        "I" => CommandResult::success(format_response(OK, "TYPE is now 8-bit binary")),
        _ => CommandResult::failure(
            format!("Unknown type {}", params),
            format_response(NOT_IMPLEMENTED_PARAM, "Unknown TYPE"),
        ),
    }
}

/// Switch to passive mode on the fixed data port.
///
/// The announced address is `pasv_address` when configured, otherwise the
/// local address the client reached the control connection on.
fn handle_cmd_pasv(ctx: &mut CommandContext<'_>) -> CommandResult {
    let ip = ctx
        .config
        .pasv_ip()
        .or_else(|| ctx.control.local_ip())
        .unwrap_or(Ipv4Addr::UNSPECIFIED);
    let port = ctx.config.data_port;

    ctx.transfer
        .data_mut()
        .set_passive(DataEndpoint::new(ip, port));
    info!("Passive mode on {}:{}", ip, port);

    CommandResult::success(format_response(
        PASSIVE_MODE,
        &format!("Entering Passive Mode ({}).", format_host_port(ip, port)),
    ))
}

/// Record an active-mode endpoint. The server never dials it; data
/// connections are still accepted on the passive port.
fn handle_cmd_port(ctx: &mut CommandContext<'_>, params: &str) -> CommandResult {
    match parse_host_port(params) {
        Ok(addr) => {
            ctx.transfer.data_mut().set_active(DataEndpoint::from(addr));
            CommandResult::success(format_response(OK, "PORT command successful"))
        }
        Err(e) => CommandResult::failure(
            e.to_string(),
            format_response(PARAMETER_ERROR, "Can't interpret parameters"),
        ),
    }
}

// ═══ SERVICE ═══

fn handle_cmd_abor(ctx: &mut CommandContext<'_>) -> CommandResult {
    ctx.transfer.abort(ctx.control);
    CommandResult::success(format_response(TRANSFER_COMPLETE, "Data connection closed"))
}

fn handle_cmd_dele(ctx: &mut CommandContext<'_>, params: &str) -> CommandResult {
    let path = match require_path(ctx.state, params) {
        Ok(path) => path,
        Err(result) => return result,
    };

    if !ctx.fs.exists(&path) {
        return not_found(params);
    }

    match ctx.fs.remove(&path) {
        Ok(()) => {
            info!("Deleted {}", path);
            CommandResult::success(format_response(FILE_ACTION_OK, &format!("Deleted {}", params)))
        }
        Err(e) => CommandResult::failure(
            StorageError::RemoveFailed(path, e).to_string(),
            format_response(FILE_UNAVAILABLE, &format!("Can't delete {}", params)),
        ),
    }
}

/// LIST, MLSD and NLST: stream the current directory over the data connection.
fn handle_cmd_listing(ctx: &mut CommandContext<'_>, format: ListingFormat) -> CommandResult {
    if let Some(busy) = reject_if_busy(ctx.transfer) {
        return busy;
    }

    if let Err(e) = ctx.transfer.connect(ctx.data_listener, ctx.clock) {
        return CommandResult::failure(
            e.to_string(),
            format_response(NO_DATA_CONNECTION, "No data connection"),
        );
    }
    ctx.control.reply(DATA_OPENING, "Accepted data connection");

    let cwd = ctx.state.cwd().to_string();
    let result = match ctx.fs.list_entries(&cwd) {
        Ok(entries) => {
            let body = render_listing(&entries, format);
            if let Err(e) = ctx.transfer.data_mut().write_all(body.as_bytes()) {
                warn!("Listing of {} cut short: {}", cwd, e);
            }

            let files = entries.iter().filter(|e| !e.is_dir).count();
            let count = format!("{} matches total", files);
            let message = match format {
                ListingFormat::Mlsd => {
                    format_multiline(TRANSFER_COMPLETE, &["options: -a -l", count.as_str()])
                }
                _ => format_response(TRANSFER_COMPLETE, &count),
            };
            CommandResult::success(message)
        }
        Err(e) => {
            handle_error(&FtpServerError::from(StorageError::IoError(e)));
            CommandResult::failure(
                format!("Can't list {}", cwd),
                format_response(FILE_NOT_FOUND, &format!("Can't open directory {}", cwd)),
            )
        }
    };

    ctx.transfer.data_mut().close();
    result
}

/// Open the file, wait for the data connection and arm the retrieve pump.
fn handle_cmd_retr(ctx: &mut CommandContext<'_>, params: &str) -> CommandResult {
    if let Some(busy) = reject_if_busy(ctx.transfer) {
        return busy;
    }
    let path = match require_path(ctx.state, params) {
        Ok(path) => path,
        Err(result) => return result,
    };

    let mut file = match ctx.fs.open_read(&path) {
        Ok(file) => file,
        Err(e) => return cannot_open(params, StorageError::OpenFailed(path, e)),
    };

    if let Err(e) = ctx.transfer.connect(ctx.data_listener, ctx.clock) {
        file.close();
        return CommandResult::failure(
            e.to_string(),
            format_response(NO_DATA_CONNECTION, "No data connection"),
        );
    }

    let size = file.size();
    info!("Sending {} ({} bytes)", path, size);
    ctx.transfer
        .begin(Direction::Retrieve, file, ctx.clock.now_millis());

    let port_line = format!("Connected to port {}", ctx.config.data_port);
    let size_line = format!("{} bytes to download", size);
    CommandResult::success(format_multiline(
        DATA_OPENING,
        &[port_line.as_str(), size_line.as_str()],
    ))
}

/// Create or truncate the file, wait for the data connection and arm the store pump.
fn handle_cmd_stor(ctx: &mut CommandContext<'_>, params: &str) -> CommandResult {
    if let Some(busy) = reject_if_busy(ctx.transfer) {
        return busy;
    }
    let path = match require_path(ctx.state, params) {
        Ok(path) => path,
        Err(result) => return result,
    };

    let mut file = match ctx.fs.open_write(&path) {
        Ok(file) => file,
        Err(e) => return cannot_open(params, StorageError::OpenFailed(path, e)),
    };

    if let Err(e) = ctx.transfer.connect(ctx.data_listener, ctx.clock) {
        file.close();
        return CommandResult::failure(
            e.to_string(),
            format_response(NO_DATA_CONNECTION, "No data connection"),
        );
    }

    info!("Receiving {}", path);
    ctx.transfer
        .begin(Direction::Store, file, ctx.clock.now_millis());

    CommandResult::success(format_response(
        DATA_OPENING,
        &format!("Connected to port {}", ctx.config.data_port),
    ))
}

/// Every RNFR forgets the previous source, so only a validated one can be renamed.
fn handle_cmd_rnfr(ctx: &mut CommandContext<'_>, params: &str) -> CommandResult {
    ctx.state.clear_rename();
    let path = match require_path(ctx.state, params) {
        Ok(path) => path,
        Err(result) => return result,
    };

    if !ctx.fs.exists(&path) {
        return not_found(params);
    }

    debug!("Rename source {}", path);
    ctx.state.set_rename_from(&path);
    CommandResult::success(format_response(
        PENDING_FURTHER_INFO,
        "RNFR accepted - file exists, ready for destination",
    ))
}

/// Complete a rename. The pending flag is cleared whatever the outcome.
fn handle_cmd_rnto(ctx: &mut CommandContext<'_>, params: &str) -> CommandResult {
    let from = ctx.state.rename_from().map(str::to_string);
    ctx.state.clear_rename();

    let Some(from) = from else {
        return CommandResult::failure(
            "RNTO without RNFR",
            format_response(BAD_SEQUENCE, "Need RNFR before RNTO"),
        );
    };

    let to = match require_path(ctx.state, params) {
        Ok(path) => path,
        Err(result) => return result,
    };

    if ctx.fs.exists(&to) {
        return CommandResult::failure(
            StorageError::FileAlreadyExists(to).to_string(),
            format_response(NAME_NOT_ALLOWED, &format!("{} already exists", params)),
        );
    }

    match ctx.fs.rename(&from, &to) {
        Ok(()) => {
            info!("Renamed {} to {}", from, to);
            CommandResult::success(format_response(
                FILE_ACTION_OK,
                "File successfully renamed or moved",
            ))
        }
        Err(e) => CommandResult::failure(
            StorageError::RenameFailed(from, e).to_string(),
            format_response(LOCAL_ERROR, "Rename/move failure"),
        ),
    }
}

// ═══ EXTENSIONS ═══

fn handle_cmd_size(ctx: &mut CommandContext<'_>, params: &str) -> CommandResult {
    let path = match require_path(ctx.state, params) {
        Ok(path) => path,
        Err(result) => return result,
    };

    match ctx.fs.open_read(&path) {
        Ok(mut file) => {
            let size = file.size();
            file.close();
            CommandResult::success(format_response(FILE_STATUS, &size.to_string()))
        }
        Err(e) => CommandResult::failure(
            StorageError::OpenFailed(path, e).to_string(),
            format_response(FILE_UNAVAILABLE, &format!("Can't open {}", params)),
        ),
    }
}

// ═══ HELPERS ═══

/// Resolve a mandatory file-name parameter against the working directory.
fn require_path(state: &SessionState, params: &str) -> Result<String, CommandResult> {
    if params.is_empty() {
        return Err(CommandResult::failure(
            "Missing file name",
            format_response(PARAMETER_ERROR, "No file name"),
        ));
    }

    resolve_path(state.cwd(), params, PATH_SIZE).map_err(|e| {
        CommandResult::failure(
            e.to_string(),
            format_response(SYNTAX_ERROR, "Command line too long"),
        )
    })
}

/// Only one transfer may be in flight.
fn reject_if_busy(transfer: &TransferEngine) -> Option<CommandResult> {
    transfer.is_active().then(|| {
        CommandResult::failure(
            "Transfer already in progress",
            format_response(NO_DATA_CONNECTION, "Transfer in progress"),
        )
    })
}

fn not_found(params: &str) -> CommandResult {
    CommandResult::failure(
        StorageError::FileNotFound(params.to_string()).to_string(),
        format_response(FILE_NOT_FOUND, &format!("File {} not found", params)),
    )
}

/// RETR and STOR report an open failure as 550 followed by 450.
fn cannot_open(params: &str, err: StorageError) -> CommandResult {
    let mut message = format_response(FILE_NOT_FOUND, &format!("File {} not found", params));
    message.push_str(&format_response(
        FILE_UNAVAILABLE,
        &format!("Can't open {}", params),
    ));
    CommandResult::failure(err.to_string(), message)
}
