//! Transposition of source data into a report
//!
//! Source data is organised by day, then by metric, then by population. A report is organised by
//! chart (one per metric), then by population, then by day. Transposition is a single pass over
//! the source records that creates charts and populations as they are first seen.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde_json::{Number, Value};

use crate::error::TransposeError;
use crate::manifest::{ExtraMetadata, Manifest};
use crate::models::{Chart, Point, Report};
use crate::source::{MetricValue, SourceData, SourceFetcher};

/// Fetch a manifest's source data and transpose it into a report.
#[tracing::instrument(level = "INFO", skip_all, fields(source = %manifest.source))]
pub async fn transpose_manifest(
    fetcher: &SourceFetcher,
    manifest: &Manifest,
) -> Result<Report, TransposeError> {
    let source = fetcher.fetch(&manifest.source).await?;
    transpose(&manifest.extra_metadata, source)
}

/// Transpose source data into a report.
///
/// Charts appear in the order their metrics are first seen, populations in the order they are
/// first seen within their metric, and points in source record order.
pub fn transpose(
    metadata: &ExtraMetadata,
    source: SourceData,
) -> Result<Report, TransposeError> {
    let mut report = Report::new(
        metadata.title.as_str(),
        metadata.description.as_str(),
        metadata.sections.iter().map(|section| section.title.as_str()),
    )?;
    // Index into the report's charts by metric name.
    let mut charts: HashMap<String, usize> = HashMap::new();

    for record in source.into_records()? {
        for (metric_name, value) in record.metrics {
            if metadata.is_excluded(&metric_name) {
                continue;
            }
            let index = match charts.entry(metric_name) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let chart = new_chart(metadata, entry.key())?;
                    *entry.insert(report.add_chart(chart))
                }
            };
            let chart = &mut report.charts_mut()[index];
            for (population_name, y) in MetricValue::from(value).into_populations() {
                chart
                    .population_entry(&population_name)
                    .add_point(Point::new(record.date.clone(), scale(y)));
            }
        }
    }

    tracing::debug!(charts = report.charts().len(), "transposed report");
    Ok(report)
}

/// Build the chart for a metric from the manifest metadata.
fn new_chart(metadata: &ExtraMetadata, metric_name: &str) -> Result<Chart, TransposeError> {
    tracing::debug!(metric = metric_name, "new chart");
    let title = metadata
        .chart_titles
        .get(metric_name)
        .map_or(metric_name, String::as_str);
    Chart::new(
        title,
        metadata.chart_descriptions.get(metric_name).cloned(),
        metadata.section_key(metric_name),
        metadata.units.as_ref(),
        metadata.chart_labels.get(metric_name),
    )
}

/// Scale a floating point value from a fraction to a percentage.
///
/// Integers and non-numeric values are returned unchanged, as are floats whose percentage is not
/// finite. Negative zero is returned as the integer `0`.
pub fn scale(value: Value) -> Value {
    match value.as_f64() {
        // serde_json parses the integer literal `-0` as a float.
        Some(v) if value.is_f64() && v == 0.0 && v.is_sign_negative() => Value::from(0),
        Some(v) if value.is_f64() => match Number::from_f64(v * 100.0) {
            Some(scaled) => Value::Number(scaled),
            None => value,
        },
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::source::DayRecord;
    use crate::test_utils::{data_path, get_test_manifest, render_json};

    use serde_json::json;
    use std::path::Path;

    fn source(value: Value) -> SourceData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn scale_float() {
        assert_eq!(json!(50.0), scale(json!(0.5)));
        assert_eq!(json!(100.0), scale(json!(1.0)));
    }

    #[test]
    fn scale_integer() {
        assert_eq!(json!(1), scale(json!(1)));
        assert_eq!(json!(-3), scale(json!(-3)));
    }

    #[test]
    fn scale_other() {
        assert_eq!(json!("0.5"), scale(json!("0.5")));
        assert_eq!(json!(null), scale(json!(null)));
    }

    #[test]
    fn scale_negative_zero() {
        let negative_zero: Value = serde_json::from_str("-0").unwrap();
        assert_eq!(json!(0), scale(negative_zero));
        assert_eq!(json!(0), scale(json!(0)));
        assert_eq!(json!(0.0), scale(json!(0.0)));
    }

    #[test]
    fn transpose_negative_zero_not_scaled() {
        let manifest = get_test_manifest("unused");
        let data: SourceData =
            serde_json::from_str(r#"{"data": [{"date": "d", "metrics": {"a": -0}}]}"#).unwrap();
        let rendered = render_json(&transpose(&manifest.extra_metadata, data).unwrap());
        assert_eq!(
            json!([{"x": "d", "y": 0}]),
            rendered["charts"][0]["populations"]["default"]
        );
    }

    #[test]
    fn scale_overflow() {
        assert_eq!(json!(f64::MAX), scale(json!(f64::MAX)));
    }

    #[test]
    fn transpose_grouped() {
        let manifest = get_test_manifest("unused");
        let data = source(json!({
            "data": [{"date": "2020-01-01", "metrics": {"cpu": {"win": 0.5, "mac": 0.25}}}]
        }));
        let report = transpose(&manifest.extra_metadata, data).unwrap();
        assert_eq!(
            json!({
                "title": "Hardware Report",
                "version": "0.0.2",
                "description": "Hardware across the population",
                "sections": [
                    {"key": "hardware", "title": "Hardware"},
                ],
                "charts": [{
                    "title": "cpu",
                    "section": "hardware",
                    "populations": {
                        "win": [{"x": "2020-01-01", "y": 50.0}],
                        "mac": [{"x": "2020-01-01", "y": 25.0}],
                    },
                }],
            }),
            render_json(&report)
        );
        let names: Vec<&str> = report.charts()[0]
            .populations()
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(vec!["win", "mac"], names);
    }

    #[test]
    fn transpose_scalar_default_population() {
        let manifest = get_test_manifest("unused");
        let data = source(json!({
            "data": [
                {"date": "2020-01-01", "metrics": {"ram": 0.5}},
                {"date": "2020-01-02", "metrics": {"ram": 0.75}},
            ]
        }));
        let report = transpose(&manifest.extra_metadata, data).unwrap();
        assert_eq!(
            json!({
                "title": "ram",
                "populations": {
                    "default": [
                        {"x": "2020-01-01", "y": 50.0},
                        {"x": "2020-01-02", "y": 75.0},
                    ],
                },
            }),
            render_json(&report)["charts"][0]
        );
    }

    #[test]
    fn transpose_integer_not_scaled() {
        let manifest = get_test_manifest("unused");
        let data = source(json!({
            "data": [
                {"date": "2020-01-01", "metrics": {"cores": 1, "share": 1.0}},
            ]
        }));
        let rendered = render_json(&transpose(&manifest.extra_metadata, data).unwrap());
        assert_eq!(json!(1), rendered["charts"][0]["populations"]["default"][0]["y"]);
        assert_eq!(json!(100.0), rendered["charts"][1]["populations"]["default"][0]["y"]);
    }

    #[test]
    fn transpose_first_seen_order() {
        let manifest = get_test_manifest("unused");
        let data = source(json!({
            "data": [
                {"date": "2020-01-01", "metrics": {"b": {"y": 1}}},
                {"date": "2020-01-02", "metrics": {"a": {"z": 2}, "b": {"x": 3, "y": 4}}},
                {"date": "2020-01-03", "metrics": {"b": {"y": 5}}},
            ]
        }));
        let report = transpose(&manifest.extra_metadata, data).unwrap();
        let titles: Vec<&str> = report.charts().iter().map(Chart::title).collect();
        assert_eq!(vec!["b", "a"], titles);
        let chart = &report.charts()[0];
        let names: Vec<&str> = chart.populations().iter().map(|p| p.name()).collect();
        assert_eq!(vec!["y", "x"], names);
        assert_eq!(
            json!([
                {"x": "2020-01-01", "y": 1},
                {"x": "2020-01-02", "y": 4},
                {"x": "2020-01-03", "y": 5},
            ]),
            serde_json::to_value(chart.populations()[0].render()).unwrap()
        );
    }

    #[test]
    fn transpose_chart_metadata() {
        let mut manifest = get_test_manifest("unused");
        let metadata = &mut manifest.extra_metadata;
        metadata.units = Some(json!({"y": "%"}));
        metadata
            .chart_titles
            .insert("cpu".to_string(), "CPU Vendor".to_string());
        metadata
            .chart_descriptions
            .insert("cpu".to_string(), "Share of CPU vendors".to_string());
        metadata
            .chart_labels
            .insert("cpu".to_string(), json!({"x": "Date", "y": "Share"}));
        let data = source(json!({
            "data": [{"date": "2020-01-01", "metrics": {"cpu": {"intel": 0.5}, "gpu": 1}}]
        }));
        let rendered = render_json(&transpose(metadata, data).unwrap());
        assert_eq!(
            json!({
                "title": "CPU Vendor",
                "description": "Share of CPU vendors",
                "section": "hardware",
                "units": {"y": "%"},
                "labels": {"x": "Date", "y": "Share"},
                "populations": {"intel": [{"x": "2020-01-01", "y": 50.0}]},
            }),
            rendered["charts"][0]
        );
        // Units apply to every chart, titles and descriptions only where given.
        assert_eq!(
            json!({
                "title": "gpu",
                "units": {"y": "%"},
                "populations": {"default": [{"x": "2020-01-01", "y": 1}]},
            }),
            rendered["charts"][1]
        );
    }

    #[test]
    fn transpose_invalid_units() {
        let mut manifest = get_test_manifest("unused");
        manifest.extra_metadata.units = Some(json!({"z": "foo"}));
        let data = source(json!({"data": [{"date": "2020-01-01", "metrics": {"cpu": 1}}]}));
        let error = transpose(&manifest.extra_metadata, data).unwrap_err();
        assert!(matches!(error, TransposeError::Construction { field: "units", .. }));
    }

    #[test]
    fn transpose_invalid_units_unused_without_charts() {
        let mut manifest = get_test_manifest("unused");
        manifest.extra_metadata.units = Some(json!({"z": "foo"}));
        let data = source(json!({"data": []}));
        assert!(transpose(&manifest.extra_metadata, data).is_ok());
    }

    #[test]
    fn transpose_duplicate_section_keys() {
        let mut manifest = get_test_manifest("unused");
        manifest.extra_metadata.sections[0].title = "General".to_string();
        manifest.extra_metadata.sections.push(crate::manifest::SectionMetadata {
            title: "gen eral".to_string(),
            charts: vec![],
        });
        let error = transpose(&manifest.extra_metadata, source(json!({"data": []}))).unwrap_err();
        assert!(matches!(error, TransposeError::DuplicateKey { .. }));
    }

    #[test]
    fn transpose_excluded_metrics() {
        let mut manifest = get_test_manifest("unused");
        manifest.extra_metadata.excluded_metrics = vec!["cpuCoresSpeed".to_string()];
        let data = source(json!([
            {"date": "2020-01-01", "cpuCoresSpeed_1.0": 0.5, "cpuCores_2": 0.5},
        ]));
        let report = transpose(&manifest.extra_metadata, data).unwrap();
        let titles: Vec<&str> = report.charts().iter().map(Chart::title).collect();
        assert_eq!(vec!["cpuCores"], titles);
    }

    #[test]
    fn transpose_flat_source() {
        let manifest = get_test_manifest("unused");
        let data = source(json!([
            {"date": "2020-01-01", "os_Windows_10": 0.75, "os_Linux": 0.25},
            {"date": "2020-01-08", "os_Windows_10": 0.5, "os_Linux": 0.5},
        ]));
        let rendered = render_json(&transpose(&manifest.extra_metadata, data).unwrap());
        assert_eq!(
            json!({
                "Windows_10": [
                    {"x": "2020-01-01", "y": 75.0},
                    {"x": "2020-01-08", "y": 50.0},
                ],
                "Linux": [
                    {"x": "2020-01-01", "y": 25.0},
                    {"x": "2020-01-08", "y": 50.0},
                ],
            }),
            rendered["charts"][0]["populations"]
        );
    }

    #[test]
    fn transpose_matches_records_built_directly() {
        let manifest = get_test_manifest("unused");
        let nested = SourceData::Nested {
            data: vec![DayRecord {
                date: json!("2020-01-01"),
                metrics: serde_json::from_value(json!({"os": {"Linux": 0.25}})).unwrap(),
            }],
        };
        let flat = source(json!([{"date": "2020-01-01", "os_Linux": 0.25}]));
        assert_eq!(
            transpose(&manifest.extra_metadata, nested).unwrap(),
            transpose(&manifest.extra_metadata, flat).unwrap()
        );
    }

    #[tokio::test]
    async fn transpose_manifest_local_source() {
        let path = data_path("hardware-source.json");
        let manifest = get_test_manifest(path.to_str().unwrap());
        let fetcher = SourceFetcher::new(None).unwrap();
        let report = transpose_manifest(&fetcher, &manifest).await.unwrap();
        let titles: Vec<&str> = report.charts().iter().map(Chart::title).collect();
        assert_eq!(vec!["cpu", "ram"], titles);
        assert_eq!(3, report.charts()[0].populations()[0].render().len());
    }

    #[tokio::test]
    async fn transpose_manifest_flat_source() {
        let mut manifest = Manifest::load(&data_path("manifests/hardware-report.json")).unwrap();
        manifest.source = data_path("flat-source.json").to_str().unwrap().to_string();
        let fetcher = SourceFetcher::new(None).unwrap();
        let report = transpose_manifest(&fetcher, &manifest).await.unwrap();
        assert_eq!(
            json!([{
                "title": "CPU Cores",
                "section": "processor",
                "units": {"y": "%"},
                "populations": {
                    "2": [{"x": "2020-01-01", "y": 40.0}, {"x": "2020-01-08", "y": 35.0}],
                    "4": [{"x": "2020-01-01", "y": 60.0}, {"x": "2020-01-08", "y": 65.0}],
                },
            }]),
            render_json(&report)["charts"]
        );
    }

    #[tokio::test]
    async fn transpose_manifest_default() {
        let manifest =
            Manifest::load(Path::new("manifests/firefox-hardware-report.json")).unwrap();
        let fetcher = SourceFetcher::new(None).unwrap();
        let report = transpose_manifest(&fetcher, &manifest).await.unwrap();
        let rendered = render_json(&report);
        let titles: Vec<&str> = report.charts().iter().map(Chart::title).collect();
        assert_eq!(
            vec!["CPU Vendor", "CPU Cores", "GPU Vendor", "Operating System", "Flash Installed"],
            titles
        );
        assert_eq!(json!("operatingsystem"), rendered["charts"][3]["section"]);
        assert_eq!(
            json!([{"x": "2020-01-05", "y": 50.0}, {"x": "2020-01-12", "y": 37.5}]),
            rendered["charts"][4]["populations"]["default"]
        );
    }

    #[tokio::test]
    async fn transpose_manifest_missing_source() {
        let path = data_path("missing.json");
        let manifest = get_test_manifest(path.to_str().unwrap());
        let fetcher = SourceFetcher::new(None).unwrap();
        let error = transpose_manifest(&fetcher, &manifest).await.unwrap_err();
        assert!(matches!(error, TransposeError::SourceRead { .. }));
    }
}
