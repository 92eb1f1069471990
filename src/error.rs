//! Error handling.

use axum::{
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{event, Level};

/// Ensemble transposer error type
///
/// This type encapsulates the various errors that may occur while loading manifests, fetching
/// source data and building a report.
/// Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum TransposeError {
    /// A chart, report or section was built from a value of the wrong shape
    #[error("invalid {field}: {reason}")]
    Construction {
        field: &'static str,
        reason: &'static str,
    },

    /// Two sections normalise to the same key
    #[error("section with key '{key}' already exists")]
    DuplicateKey { key: String },

    /// Two populations with the same name were added to one chart
    #[error("population '{population}' already exists in chart '{chart}'")]
    DuplicatePopulation { chart: String, population: String },

    /// Two manifests would be served under the same report name
    #[error("report '{name}' is defined by more than one manifest")]
    DuplicateReport { name: String },

    /// A point is not a 2-element array
    #[error("a point must be a 2-element array, got {value}")]
    PointShape { value: serde_json::Value },

    /// Error building the HTTP client used to fetch source data
    #[error("failed to build source data HTTP client")]
    SourceClient(#[source] reqwest::Error),

    /// Error retrieving source data over HTTP
    #[error("error retrieving source data from {url}")]
    SourceRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Error reading source data from a local file
    #[error("error reading source data from {}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source data is not valid JSON or does not have the expected structure
    #[error("source data is not valid")]
    SourceParse(#[source] serde_json::Error),

    /// Error reading a manifest file
    #[error("error reading manifest {}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error deserialising a manifest file
    #[error("manifest {} is not valid", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Error validating a manifest file
    #[error("manifest {} is not valid", path.display())]
    ManifestValidation {
        path: PathBuf,
        #[source]
        source: validator::ValidationErrors,
    },

    /// No manifest is registered for the requested report
    #[error("no report named {name}")]
    UnknownReport { name: String },

    /// The configured host and port do not form a socket address
    #[error("invalid listen address {address}")]
    ListenAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A TLS certificate or key file cannot be located
    #[error("TLS {kind} file {path} cannot be accessed")]
    TlsFile {
        kind: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The TLS certificate and key cannot be loaded
    #[error("failed to load TLS certificate and key")]
    TlsConfig(#[source] std::io::Error),

    /// The server stopped with an error
    #[error("server failed")]
    Serve(#[source] std::io::Error),
}

impl IntoResponse for TransposeError {
    /// Convert from a `TransposeError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut caused_by = None;
        let mut current = error.source();
        while let Some(source) = current {
            let mut causes: Vec<String> = caused_by.unwrap_or_default();
            causes.push(source.to_string());
            caused_by = Some(causes);
            current = source.source();
        }
        // Remove duplicate entries.
        if let Some(caused_by) = caused_by.as_mut() {
            caused_by.dedup()
        }
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }

    /// Return a 404 not found ErrorResponse
    fn not_found<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<TransposeError> for ErrorResponse {
    /// Convert from a `TransposeError` into an `ErrorResponse`.
    fn from(error: TransposeError) -> Self {
        let response = match &error {
            // Not found
            TransposeError::UnknownReport { name: _ } => Self::not_found(&error),

            // Internal server error. A report is either built in full or not at all, so a bad
            // manifest or a bad source document is a failure of the service, not of the request.
            TransposeError::Construction {
                field: _,
                reason: _,
            }
            | TransposeError::DuplicateKey { key: _ }
            | TransposeError::DuplicatePopulation {
                chart: _,
                population: _,
            }
            | TransposeError::DuplicateReport { name: _ }
            | TransposeError::PointShape { value: _ }
            | TransposeError::SourceClient(_)
            | TransposeError::SourceRequest { url: _, source: _ }
            | TransposeError::SourceRead { path: _, source: _ }
            | TransposeError::SourceParse(_)
            | TransposeError::ManifestRead { path: _, source: _ }
            | TransposeError::ManifestParse { path: _, source: _ }
            | TransposeError::ManifestValidation { path: _, source: _ }
            | TransposeError::ListenAddress {
                address: _,
                source: _,
            }
            | TransposeError::TlsFile {
                kind: _,
                path: _,
                source: _,
            }
            | TransposeError::TlsConfig(_)
            | TransposeError::Serve(_) => {
                Self::internal_server_error(&error)
            }
        };

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}
