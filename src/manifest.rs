//! Report manifests
//!
//! A manifest names the source of a report's data and supplies the display and grouping metadata
//! used when transposing it.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::error::TransposeError;
use crate::types::{get_key, Labels, Units};

/// A report manifest.
#[derive(Clone, Debug, Deserialize, PartialEq, Validate)]
pub struct Manifest {
    /// URL or local path of the source data
    #[validate(length(min = 1, message = "source must not be empty"))]
    pub source: String,
    /// Report metadata
    #[validate]
    pub extra_metadata: ExtraMetadata,
}

/// Report metadata supplied by a manifest.
#[derive(Clone, Debug, Deserialize, PartialEq, Validate)]
#[validate(schema(function = "validate_extra_metadata"))]
pub struct ExtraMetadata {
    pub title: String,
    pub description: String,
    #[validate]
    pub sections: Vec<SectionMetadata>,
    /// Units applied verbatim to every chart
    #[serde(default)]
    pub units: Option<Value>,
    /// Chart titles by metric name
    #[serde(default)]
    pub chart_titles: HashMap<String, String>,
    /// Chart descriptions by metric name
    #[serde(default)]
    pub chart_descriptions: HashMap<String, String>,
    /// Chart axis labels by metric name
    #[serde(default)]
    pub chart_labels: HashMap<String, Value>,
    /// Metrics to leave out of the report
    #[serde(default)]
    pub excluded_metrics: Vec<String>,
}

impl ExtraMetadata {
    /// Returns the key of the first section listing `metric_name`, or an empty string if no
    /// section does.
    pub fn section_key(&self, metric_name: &str) -> String {
        self.sections
            .iter()
            .find(|section| section.charts.iter().any(|chart| chart == metric_name))
            .map(|section| get_key(&section.title))
            .unwrap_or_default()
    }

    /// Returns whether `metric_name` should be left out of the report.
    pub fn is_excluded(&self, metric_name: &str) -> bool {
        self.excluded_metrics.iter().any(|m| m == metric_name)
    }
}

/// A section declared by a manifest.
#[derive(Clone, Debug, Deserialize, PartialEq, Validate)]
pub struct SectionMetadata {
    #[validate(length(min = 1, message = "section title must not be empty"))]
    pub title: String,
    /// Metric names of the charts in this section
    pub charts: Vec<String>,
}

/// Validate the parts of the metadata that are otherwise only checked when a chart is built:
/// no two section titles may normalise to the same key, and units and chart labels must have
/// the accepted shapes.
fn validate_extra_metadata(extra_metadata: &ExtraMetadata) -> Result<(), ValidationError> {
    let mut keys = HashSet::new();
    for section in &extra_metadata.sections {
        let key = get_key(&section.title);
        if !keys.insert(key.clone()) {
            let mut error = ValidationError::new("Section titles must have unique keys");
            error.add_param("key".into(), &key);
            return Err(error);
        }
    }
    if let Some(units) = &extra_metadata.units {
        Units::try_from(units).map_err(|error| axis_error("Invalid units", error))?;
    }
    for (metric_name, labels) in &extra_metadata.chart_labels {
        Labels::try_from(labels).map_err(|error| {
            let mut error = axis_error("Invalid chart labels", error);
            error.add_param("metric".into(), metric_name);
            error
        })?;
    }
    Ok(())
}

fn axis_error(code: &'static str, error: TransposeError) -> ValidationError {
    let mut validation_error = ValidationError::new(code);
    validation_error.message = Some(error.to_string().into());
    validation_error
}

impl Manifest {
    /// Load and validate a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self, TransposeError> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            TransposeError::ManifestRead {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let manifest: Manifest =
            serde_json::from_str(&contents).map_err(|source| TransposeError::ManifestParse {
                path: path.to_path_buf(),
                source,
            })?;
        manifest
            .validate()
            .map_err(|source| TransposeError::ManifestValidation {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(manifest)
    }
}
