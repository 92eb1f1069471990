//! Command Line Interface (CLI) arguments.

use clap::Parser;

/// Ensemble transposer command line interface
#[derive(Clone, Debug, Parser)]
#[command(version)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "ENSEMBLE_TRANSPOSER_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 8080, env = "ENSEMBLE_TRANSPOSER_PORT")]
    pub port: u16,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "ENSEMBLE_TRANSPOSER_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/ensemble-transposer/certs/cert.pem",
        env = "ENSEMBLE_TRANSPOSER_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/ensemble-transposer/certs/key.pem",
        env = "ENSEMBLE_TRANSPOSER_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "ENSEMBLE_TRANSPOSER_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Whether to enable sending traces to Jaeger.
    #[arg(long, default_value_t = false, env = "ENSEMBLE_TRANSPOSER_ENABLE_JAEGER")]
    pub enable_jaeger: bool,
    /// Path to a report manifest. May be given more than once; each report is served at
    /// `/<manifest file stem>`.
    #[arg(
        long = "manifest",
        default_value = "manifests/firefox-hardware-report.json",
        env = "ENSEMBLE_TRANSPOSER_MANIFESTS",
        value_delimiter = ','
    )]
    pub manifests: Vec<String>,
    /// Timeout in seconds for fetching remote source data. No timeout if unset.
    #[arg(long, env = "ENSEMBLE_TRANSPOSER_SOURCE_TIMEOUT")]
    pub source_timeout: Option<u64>,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
