use crate::manifest::{ExtraMetadata, Manifest, SectionMetadata};
use crate::models::Report;

use axum::response::Response;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// Returns the path of a file under the test data directory.
pub(crate) fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Create a Manifest with a single "Hardware" section containing the "cpu" chart.
pub(crate) fn get_test_manifest(source: &str) -> Manifest {
    Manifest {
        source: source.to_string(),
        extra_metadata: ExtraMetadata {
            title: "Hardware Report".to_string(),
            description: "Hardware across the population".to_string(),
            sections: vec![SectionMetadata {
                title: "Hardware".to_string(),
                charts: vec!["cpu".to_string()],
            }],
            units: None,
            chart_titles: HashMap::new(),
            chart_descriptions: HashMap::new(),
            chart_labels: HashMap::new(),
            excluded_metrics: vec![],
        },
    }
}

/// Render a report to a JSON value.
pub(crate) fn render_json(report: &Report) -> Value {
    serde_json::to_value(report.render()).unwrap()
}

// Jump through the hoops to get the body as a string.
pub(crate) async fn body_string(response: Response) -> String {
    String::from_utf8(
        hyper::body::to_bytes(response.into_body())
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap()
}
