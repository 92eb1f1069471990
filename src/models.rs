//! Report model
//!
//! A [Report] owns [Chart]s, which own [Population]s, which own [Point]s. Each level accumulates
//! its children in insertion order and renders itself to the Ensemble document format.

use std::collections::HashMap;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::TransposeError;
use crate::types::{Labels, Section, Units};

/// Version of the Ensemble document format produced by [Report::render].
pub const FORMAT_VERSION: &str = "0.0.2";

/// A single observation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Point {
    /// Typically a date string
    pub x: Value,
    pub y: Value,
}

impl Point {
    /// Return a new Point object.
    pub fn new(x: impl Into<Value>, y: impl Into<Value>) -> Self {
        Point {
            x: x.into(),
            y: y.into(),
        }
    }
}

impl TryFrom<Value> for Point {
    type Error = TransposeError;

    /// Accepts exactly a 2-element array `[x, y]`.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(pair) => match <[Value; 2]>::try_from(pair) {
                Ok([x, y]) => Ok(Point { x, y }),
                Err(pair) => Err(TransposeError::PointShape {
                    value: Value::Array(pair),
                }),
            },
            value => Err(TransposeError::PointShape { value }),
        }
    }
}

/// A named series of points within a chart.
#[derive(Clone, Debug, PartialEq)]
pub struct Population {
    name: String,
    points: Vec<Point>,
}

impl Population {
    /// Return a new, empty Population object.
    pub fn new(name: impl Into<String>) -> Self {
        Population {
            name: name.into(),
            points: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a point. Points are neither sorted nor deduplicated.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Render the points in insertion order.
    pub fn render(&self) -> &[Point] {
        &self.points
    }
}

/// A chart of a single metric.
#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
    title: String,
    description: Option<String>,
    section: String,
    units: Option<Units>,
    labels: Option<Labels>,
    populations: Vec<Population>,
    // Index into `populations` by name.
    population_index: HashMap<String, usize>,
}

impl Chart {
    /// Return a new Chart object.
    ///
    /// # Arguments
    ///
    /// * `title`: Chart title
    /// * `description`: Optional chart description
    /// * `section`: Key of the section this chart belongs to, or an empty string
    /// * `units`: Optional units, validated as by [Chart::set_units]
    /// * `labels`: Optional axis labels, validated as by [Chart::set_labels]
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        section: impl Into<String>,
        units: Option<&Value>,
        labels: Option<&Value>,
    ) -> Result<Self, TransposeError> {
        let mut chart = Chart {
            title: title.into(),
            description,
            section: section.into(),
            units: None,
            labels: None,
            populations: vec![],
            population_index: HashMap::new(),
        };
        if let Some(units) = units {
            chart.set_units(units)?;
        }
        if let Some(labels) = labels {
            chart.set_labels(labels)?;
        }
        Ok(chart)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn populations(&self) -> &[Population] {
        &self.populations
    }

    /// Set the units from an object with an `x` key, a `y` key, or both, with string values.
    pub fn set_units(&mut self, units: &Value) -> Result<(), TransposeError> {
        self.units = Some(Units::try_from(units)?);
        Ok(())
    }

    /// Set the labels from an object with exactly the keys `x` and `y`, with string values.
    pub fn set_labels(&mut self, labels: &Value) -> Result<(), TransposeError> {
        self.labels = Some(Labels::try_from(labels)?);
        Ok(())
    }

    /// Add a population to this chart.
    ///
    /// Returns a [TransposeError::DuplicatePopulation] if a population with the same name has
    /// already been added.
    pub fn add_population(
        &mut self,
        population: Population,
    ) -> Result<&mut Population, TransposeError> {
        if self.population_index.contains_key(population.name()) {
            return Err(TransposeError::DuplicatePopulation {
                chart: self.title.clone(),
                population: population.name,
            });
        }
        let index = self.populations.len();
        self.population_index
            .insert(population.name().to_string(), index);
        self.populations.push(population);
        Ok(&mut self.populations[index])
    }

    /// Return the population with the given name, creating and adding it if necessary.
    pub fn population_entry(&mut self, name: &str) -> &mut Population {
        let index = match self.population_index.get(name).copied() {
            Some(index) => index,
            None => {
                tracing::debug!(chart = %self.title, population = name, "new population");
                let index = self.populations.len();
                self.population_index.insert(name.to_string(), index);
                self.populations.push(Population::new(name));
                index
            }
        };
        &mut self.populations[index]
    }

    /// Render the chart.
    ///
    /// The description, section, units and labels are omitted when empty.
    pub fn render(&self) -> RenderedChart<'_> {
        RenderedChart {
            title: &self.title,
            description: self.description.as_deref().filter(|d| !d.is_empty()),
            section: Some(self.section.as_str()).filter(|s| !s.is_empty()),
            units: self.units.as_ref(),
            labels: self.labels.as_ref(),
            populations: RenderedPopulations(&self.populations),
        }
    }
}

/// A report: a collection of charts grouped into sections.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    title: String,
    description: String,
    sections: Vec<Section>,
    charts: Vec<Chart>,
}

impl Report {
    /// Return a new Report object.
    ///
    /// # Arguments
    ///
    /// * `title`: Report title
    /// * `description`: Report description
    /// * `section_titles`: Titles of the report's sections. The key of each section is derived
    ///   from its title, and must be unique.
    pub fn new<I>(
        title: impl Into<String>,
        description: impl Into<String>,
        section_titles: I,
    ) -> Result<Self, TransposeError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut report = Report {
            title: title.into(),
            description: description.into(),
            sections: vec![],
            charts: vec![],
        };
        report.set_sections(section_titles)?;
        Ok(report)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    pub(crate) fn charts_mut(&mut self) -> &mut [Chart] {
        &mut self.charts
    }

    /// Add a section to this report.
    ///
    /// Returns a [TransposeError::DuplicateKey] if a section with the same key already exists.
    pub fn add_section(&mut self, section: Section) -> Result<(), TransposeError> {
        // Sections are few, so a linear scan is fine.
        if self.sections.iter().any(|s| s.key == section.key) {
            return Err(TransposeError::DuplicateKey { key: section.key });
        }
        self.sections.push(section);
        Ok(())
    }

    /// Add a section for each title, deriving its key with [get_key](crate::types::get_key).
    pub fn set_sections<I>(&mut self, section_titles: I) -> Result<(), TransposeError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for title in section_titles {
            self.add_section(Section::from_title(title.as_ref()))?;
        }
        Ok(())
    }

    /// Add a chart to this report and return its index.
    pub fn add_chart(&mut self, chart: Chart) -> usize {
        self.charts.push(chart);
        self.charts.len() - 1
    }

    /// Render the report.
    ///
    /// The description and sections are omitted when empty.
    pub fn render(&self) -> RenderedReport<'_> {
        RenderedReport {
            title: &self.title,
            version: FORMAT_VERSION,
            description: Some(self.description.as_str()).filter(|d| !d.is_empty()),
            sections: Some(self.sections.as_slice()).filter(|s| !s.is_empty()),
            charts: self.charts.iter().map(Chart::render).collect(),
        }
    }
}

/// A rendered [Report], serialisable as an Ensemble document.
#[derive(Debug, Serialize)]
pub struct RenderedReport<'a> {
    pub title: &'a str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<&'a [Section]>,
    pub charts: Vec<RenderedChart<'a>>,
}

/// A rendered [Chart].
#[derive(Debug, Serialize)]
pub struct RenderedChart<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<&'a Units>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<&'a Labels>,
    pub populations: RenderedPopulations<'a>,
}

/// Populations of a rendered chart, serialised as an object mapping each population name to its
/// points, in the order the populations were added.
#[derive(Debug)]
pub struct RenderedPopulations<'a>(&'a [Population]);

impl Serialize for RenderedPopulations<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|p| (p.name(), p.render())))
    }
}
