//! Solo FTP Server - Entry Point
//!
//! Loads configuration, binds the control and data endpoints and drives the
//! session controller until Ctrl-C.

use log::{error, info};
use std::process;

use solo_ftp_server::config::ServerConfig;
use solo_ftp_server::utils::logging::setup_logging;
use solo_ftp_server::Server;

#[tokio::main]
async fn main() {
    setup_logging();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = std::fs::create_dir_all(&config.server_root) {
        error!("Failed to create server root {}: {}", config.server_root, e);
        process::exit(1);
    }

    let mut server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            process::exit(1);
        }
    };

    info!("Launching FTP server...");

    tokio::select! {
        _ = serve(&mut server) => {}
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("Ctrl-C received, shutting down"),
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        },
    }

    server.shutdown();
}

/// Poll the session forever. A step may wait a few seconds for a data
/// connection, so it runs on a blocking-capable worker.
async fn serve(server: &mut Server) {
    let idle = server.config().poll_interval();
    loop {
        let in_progress = tokio::task::block_in_place(|| server.handle_ftp());
        if in_progress {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(idle).await;
        }
    }
}
