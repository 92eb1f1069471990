//! HTTP and HTTPS serving

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::ServiceExt;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use expanduser::expanduser;
use tokio::signal;

use crate::app::Service;
use crate::cli::CommandLineArgs;
use crate::error::TransposeError;

/// Serve reports until a shutdown signal is received.
///
/// The listen address and any TLS files are resolved before binding, so a bad configuration is
/// reported as an error rather than a panic.
///
/// # Arguments
///
/// * `args`: Command line arguments
/// * `service`: The [crate::app::Service] to serve
pub async fn serve(args: &CommandLineArgs, service: Service) -> Result<(), TransposeError> {
    let addr = listen_address(args)?;
    let tls = if args.https {
        Some(tls_config(args).await?)
    } else {
        None
    };

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(
        handle.clone(),
        Duration::from_secs(args.graceful_shutdown_timeout),
    ));

    let make_service = service.into_make_service();
    let result = match tls {
        Some(config) => {
            tracing::info!(%addr, "serving reports over HTTPS");
            axum_server::bind_rustls(addr, config)
                .handle(handle)
                .serve(make_service)
                .await
        }
        None => {
            tracing::info!(%addr, "serving reports over HTTP");
            axum_server::bind(addr)
                .handle(handle)
                .serve(make_service)
                .await
        }
    };
    result.map_err(TransposeError::Serve)
}

fn listen_address(args: &CommandLineArgs) -> Result<SocketAddr, TransposeError> {
    let address = format!("{}:{}", args.host, args.port);
    address
        .parse()
        .map_err(|source| TransposeError::ListenAddress { address, source })
}

/// Expand `~` in a TLS file path and resolve it to an absolute path.
fn tls_path(kind: &'static str, path: &str) -> Result<PathBuf, TransposeError> {
    let file_error = |source| TransposeError::TlsFile {
        kind,
        path: path.to_string(),
        source,
    };
    expanduser(path)
        .map_err(file_error)?
        .canonicalize()
        .map_err(file_error)
}

async fn tls_config(args: &CommandLineArgs) -> Result<RustlsConfig, TransposeError> {
    let cert_file = tls_path("certificate", &args.cert_file)?;
    let key_file = tls_path("key", &args.key_file)?;
    tracing::debug!(cert_file = %cert_file.display(), key_file = %key_file.display(), "loading TLS files");
    RustlsConfig::from_pem_file(cert_file, key_file)
        .await
        .map_err(TransposeError::TlsConfig)
}

/// Wait for Ctrl-C or SIGTERM, then shut down gracefully.
///
/// Connections still open after `timeout` are closed.
async fn shutdown_signal(handle: Handle, timeout: Duration) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!(?timeout, "shutting down");
    handle.graceful_shutdown(Some(timeout));
}
