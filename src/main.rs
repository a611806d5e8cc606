//! Binary entry point for the GARM Linode provider.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use garm_provider_linode::cli::Cli;
use garm_provider_linode::execution::{self, EXIT_CODE_FAILURE, ExecutionError};

/// Variable holding the log filter directive.
const LOG_ENV: &str = "GARM_PROVIDER_LOG";

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let outcome = tokio::select! {
        result = execution::run(&cli, io::stdin().lock(), cancel.clone()) => result,
        () = cancel.cancelled() => Err(ExecutionError::Interrupted),
    };

    let exit_code = match outcome {
        Ok(payload) => emit(&payload),
        Err(err) => {
            report_error(&err);
            err.exit_code()
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn cancel_on_signal(cancel: CancellationToken) {
    wait_for_signal().await;
    debug!("shutdown signal received");
    cancel.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(err) => {
            warn!(error = %err, "cannot listen for SIGTERM");
            if let Err(ctrl_c_err) = tokio::signal::ctrl_c().await {
                warn!(error = %ctrl_c_err, "cannot listen for SIGINT");
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for interrupts");
        std::future::pending::<()>().await;
    }
}

fn emit(payload: &str) -> i32 {
    if payload.is_empty() {
        return 0;
    }
    let mut stdout = io::stdout();
    match write!(stdout, "{payload}").and_then(|()| stdout.flush()) {
        Ok(()) => 0,
        Err(err) => {
            report_line(&format!("failed to write result: {err}"));
            EXIT_CODE_FAILURE
        }
    }
}

fn report_error(err: &ExecutionError) {
    report_line(&format!("failed to run command: {err}"));
}

fn report_line(message: &str) {
    write_line(io::stderr(), message);
}

fn write_line(mut target: impl Write, message: &str) {
    writeln!(target, "{message}").ok();
}
