//! This file defines the ensemble-transposer binary entry point.

use ensemble_transposer::app;
use ensemble_transposer::app_state::AppState;
use ensemble_transposer::cli;
use ensemble_transposer::error::TransposeError;
use ensemble_transposer::metrics;
use ensemble_transposer::server;
use ensemble_transposer::tracing;

use std::error::Error;
use std::process::exit;
use std::sync::Arc;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing(&args);
    ::tracing::debug!(?args, "parsed arguments");
    metrics::register_metrics();
    let state = match AppState::new(&args) {
        Ok(state) => Arc::new(state),
        Err(error) => fail("failed to start", error),
    };
    let service = app::service(state);
    if let Err(error) = server::serve(&args, service).await {
        fail("failed to serve", error)
    }
    tracing::shutdown_tracing();
}

/// Log an error with its cause chain, then exit.
fn fail(context: &str, error: TransposeError) -> ! {
    ::tracing::error!("{}: {}", context, error);
    let mut current = error.source();
    while let Some(source) = current {
        ::tracing::error!("Caused by: {}", source);
        current = source.source();
    }
    tracing::shutdown_tracing();
    exit(1)
}
