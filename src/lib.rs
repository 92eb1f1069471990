//! This crate provides the Ensemble transposer. It converts a daily metrics feed, keyed by
//! arbitrary metric and population names, into the versioned report document consumed by the
//! [Ensemble](https://github.com/mozilla/ensemble) charting front end, and serves the result over
//! HTTP.
//!
//! A [manifest](manifest::Manifest) names the source of a report's data and supplies titles,
//! descriptions, sections and units. On each request the source is fetched afresh and
//! [transposed](transposer::transpose): every metric becomes a [chart](models::Chart), every
//! population of a metric becomes a [population](models::Population) of that chart, and every
//! day contributes one [point](models::Point) to each of its populations.
//!
//! The transposer is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [Serde](serde) performs (de)serialisation of manifests, source data and reports.
//! * [reqwest] fetches remote source data.

pub mod app;
pub mod app_state;
pub mod cli;
pub mod error;
pub mod manifest;
pub mod metrics;
pub mod models;
pub mod server;
pub mod source;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod transposer;
pub mod types;
