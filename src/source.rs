//! Source data
//!
//! Source data is a daily metrics feed. Two layouts are accepted:
//!
//! * Nested: `{"data": [{"date": ..., "metrics": {<metric>: <value>}}]}`, where each value is
//!   either a number or an object mapping population names to numbers.
//! * Flat: `[{"date": ..., "<metric>_<population>": <number>}]`, converted to the nested layout
//!   by splitting each key on its first underscore.

use std::path::PathBuf;
use std::time::Duration;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use strum_macros::Display;
use url::Url;

use crate::error::TransposeError;

/// Name of the population used when a metric value is not broken down by population.
pub const DEFAULT_POPULATION: &str = "default";

/// Source data in either supported layout.
///
/// The layout is chosen by the top-level JSON type, so a malformed document reports the error
/// of the layout it was meant to be.
#[derive(Debug, PartialEq)]
pub enum SourceData {
    /// Nested layout
    Nested { data: Vec<DayRecord> },
    /// Flat layout
    Flat(Vec<Map<String, Value>>),
}

#[derive(Deserialize)]
struct NestedLayout {
    data: Vec<DayRecord>,
}

impl<'de> Deserialize<'de> for SourceData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let layout = match value {
            Value::Object(_) => serde_json::from_value::<NestedLayout>(value)
                .map(|layout| Self::Nested { data: layout.data }),
            Value::Array(_) => serde_json::from_value(value).map(Self::Flat),
            _ => {
                return Err(D::Error::custom(
                    "source data must be an object or an array",
                ))
            }
        };
        layout.map_err(D::Error::custom)
    }
}

/// Metrics reported on a single day.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DayRecord {
    pub date: Value,
    pub metrics: Map<String, Value>,
}

impl SourceData {
    /// Returns the day records of the source data, converting from the flat layout if necessary.
    pub fn into_records(self) -> Result<Vec<DayRecord>, TransposeError> {
        match self {
            Self::Nested { data } => Ok(data),
            Self::Flat(days) => days
                .into_iter()
                .enumerate()
                .map(|(index, day)| flat_to_record(index, day))
                .collect(),
        }
    }
}

/// Convert a day of the flat layout to a [DayRecord].
///
/// Keys without an underscore are metadata; only `date` is kept.
fn flat_to_record(index: usize, day: Map<String, Value>) -> Result<DayRecord, TransposeError> {
    let mut date = None;
    let mut metrics = Map::new();
    for (key, value) in day {
        match key.split_once('_') {
            None if key == "date" => date = Some(value),
            None => (),
            Some((metric_name, population_name)) => {
                let populations = metrics
                    .entry(metric_name)
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(populations) = populations {
                    populations.insert(population_name.to_string(), value);
                }
            }
        }
    }
    let date = date.ok_or_else(|| {
        TransposeError::SourceParse(serde_json::Error::custom(format!(
            "record {index} has no date"
        )))
    })?;
    Ok(DayRecord { date, metrics })
}

/// The value of one metric on one day.
#[derive(Clone, Debug, PartialEq)]
pub enum MetricValue {
    /// A single value for the implicit default population
    Scalar(Value),
    /// Values by population name
    Grouped(Map<String, Value>),
}

impl From<Value> for MetricValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(populations) => Self::Grouped(populations),
            value => Self::Scalar(value),
        }
    }
}

impl MetricValue {
    /// Returns (population name, value) pairs in source order.
    pub fn into_populations(self) -> Vec<(String, Value)> {
        match self {
            Self::Scalar(value) => vec![(DEFAULT_POPULATION.to_string(), value)],
            Self::Grouped(populations) => populations.into_iter().collect(),
        }
    }
}

/// Where source data is fetched from.
#[derive(Clone, Debug, Display, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum SourceLocation {
    /// An HTTP(S) URL
    Remote(Url),
    /// A path on the local file system
    Local(PathBuf),
}

impl SourceLocation {
    /// Interpret a manifest source as a URL if it has an HTTP(S) scheme, otherwise as a path.
    /// `file` URLs are converted to paths.
    pub fn parse(source: &str) -> Self {
        match Url::parse(source) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Self::Local(path),
                Err(()) => Self::Local(PathBuf::from(source)),
            },
            _ => Self::Local(PathBuf::from(source)),
        }
    }
}

/// Fetches source data over HTTP or from the local file system.
///
/// Data is fetched afresh on every call.
#[derive(Clone, Debug)]
pub struct SourceFetcher {
    client: reqwest::Client,
}

impl SourceFetcher {
    /// Create a new source fetcher.
    ///
    /// # Arguments
    ///
    /// * `timeout`: Optional timeout for remote requests. Local reads are not limited.
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransposeError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransposeError::SourceClient)?;
        Ok(Self { client })
    }

    /// Fetch and parse source data.
    #[tracing::instrument(level = "DEBUG", skip(self))]
    pub async fn fetch(&self, source: &str) -> Result<SourceData, TransposeError> {
        let location = SourceLocation::parse(source);
        tracing::debug!(%location, "fetching source data");
        let body = match location {
            SourceLocation::Remote(url) => self.fetch_remote(url).await?,
            SourceLocation::Local(path) => {
                tokio::fs::read(&path)
                    .await
                    .map_err(|source| TransposeError::SourceRead { path, source })?
            }
        };
        serde_json::from_slice(&body).map_err(TransposeError::SourceParse)
    }

    async fn fetch_remote(&self, url: Url) -> Result<Vec<u8>, TransposeError> {
        let url_string = url.to_string();
        let request_error = |source| TransposeError::SourceRequest {
            url: url_string.clone(),
            source,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(request_error)?;
        let body = response.bytes().await.map_err(request_error)?;
        Ok(body.to_vec())
    }
}
