//! HTTP application: routes and handlers.

use crate::app_state::SharedAppState;
use crate::error::TransposeError;
use crate::metrics::{self, Outcome};
use crate::transposer;

use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower::Layer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// Build information returned by the version endpoint.
#[derive(Debug, Serialize)]
struct Version {
    name: &'static str,
    version: &'static str,
}

/// Returns a [axum::Router] with all routes.
///
/// * `/{report}`: the transposed report for each loaded manifest
/// * `/__heartbeat__` and `/__lbheartbeat__`: liveness checks
/// * `/__version__`: build information
/// * `/metrics`: Prometheus metrics
pub fn router(state: SharedAppState) -> Router {
    Router::new()
        .route("/__heartbeat__", get(heartbeat))
        .route("/__lbheartbeat__", get(heartbeat))
        .route("/__version__", get(version))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/:report", get(report))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .on_request(metrics::request_counter)
                        .on_response(metrics::record_response_metrics),
                )
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET]),
                ),
        )
        .with_state(state)
}

/// Service type returned by [service].
pub type Service = NormalizePath<Router>;

/// Returns a [crate::app::Service] with all routes and trailing slashes trimmed from request
/// paths.
pub fn service(state: SharedAppState) -> Service {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

async fn heartbeat() -> StatusCode {
    StatusCode::OK
}

async fn version() -> Json<Version> {
    Json(Version {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Fetch and transpose the source data of a report, returning the rendered document.
#[tracing::instrument(level = "INFO", skip_all, fields(report = %name))]
async fn report(
    State(state): State<SharedAppState>,
    Path(name): Path<String>,
) -> Result<Response, TransposeError> {
    let manifest = state
        .manifests
        .get(&name)
        .ok_or_else(|| TransposeError::UnknownReport { name: name.clone() })?;
    let start = Instant::now();
    let result = transposer::transpose_manifest(&state.fetcher, manifest).await;
    let outcome = match result {
        Ok(_) => Outcome::Success,
        Err(_) => Outcome::Failure,
    };
    metrics::record_transpose(&name, outcome, start.elapsed());
    let report = result?;
    Ok(Json(report.render()).into_response())
}
