mod jsonrpc;
mod logging;
mod lsp;
mod syntax;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use jsonrpc::{Server, ShutdownSignal};
use logging::{LogConfig, init_logging};
use lsp::LanguageHandler;

use std::path::PathBuf;
use tokio::io::{stdin, stdout};
use tracing::{error, info};

/// CLI arguments for the DLiteScript language server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (overrides RUST_LOG env var)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log file path (overrides DLITE_LSP_LOG_FILE env var)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Emit logs as JSON lines (same as DLITE_LSP_LOG_JSON=true)
    #[arg(long)]
    log_json: bool,

    /// Shortcut for --log-level debug
    #[arg(long, conflicts_with = "log_level")]
    debug: bool,
}

impl Args {
    fn log_config(&self) -> LogConfig {
        let level = if self.debug {
            Some("debug".to_string())
        } else {
            self.log_level.clone()
        };

        LogConfig::from_env().with_overrides(level, self.log_file.clone(), self.log_json)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Err(e) = init_logging(args.log_config()) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    info!(
        "Starting DLiteScript language server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = ShutdownSignal::new();

    // Terminates the process once `exit` arms the signal
    let terminator = shutdown.clone();
    tokio::spawn(async move {
        terminator.wait().await;
        let code = terminator.exit_code();
        info!("Server shutdown, exiting with status {}", code);
        std::process::exit(code);
    });

    let handler = LanguageHandler::new(shutdown.clone());
    let mut server = Server::new(handler, stdin(), stdout(), shutdown.clone());

    info!("DLiteScript language server ready and listening on stdio");

    if let Err(e) = server.run().await {
        error!("Server stopped: {}", e);
        return Err(e.into());
    }

    // The loop stops right after `exit`; report the same status as the terminator
    if shutdown.is_triggered() {
        std::process::exit(shutdown.exit_code());
    }

    info!("Input closed before exit, shutting down");
    Ok(())
}
