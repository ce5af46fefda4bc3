//! Display-unit contract and the data-driven [`Panel`].

use crate::augment::AxisAugmenter;
use anyhow::{Result, anyhow, bail};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sleigh_types::{Dataset, TimeRange, Values};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

/// What a consumer obtained from one source for the current range.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceData {
    Slice(Arc<Dataset>),
    /// Nothing has been loaded for this source yet
    NoData,
    Failed(String),
}

impl SourceData {
    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            SourceData::Slice(dataset) => Some(dataset),
            SourceData::NoData | SourceData::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SourceData::Failed(_))
    }
}

/// Per-range view handed to display units: source name → data.
///
/// Keys are base source names; dataset contents carry augmented names when
/// the owning consumer is a comparison view, see [`DataMap::axis_name`].
#[derive(Debug, Clone, PartialEq)]
pub struct DataMap {
    range: TimeRange,
    augmenter: Option<AxisAugmenter>,
    entries: BTreeMap<String, SourceData>,
}

impl DataMap {
    pub fn new(
        range: TimeRange,
        augmenter: Option<AxisAugmenter>,
        entries: BTreeMap<String, SourceData>,
    ) -> Self {
        Self {
            range,
            augmenter,
            entries,
        }
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn augmenter(&self) -> Option<&AxisAugmenter> {
        self.augmenter.as_ref()
    }

    pub fn get(&self, source: &str) -> Option<&SourceData> {
        self.entries.get(source)
    }

    /// Name of `base` as it appears inside this map's datasets.
    pub fn axis_name(&self, base: &str) -> String {
        match &self.augmenter {
            Some(augmenter) => augmenter.name(base),
            None => base.to_string(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceData)> {
        self.entries.iter().map(|(name, data)| (name.as_str(), data))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Anything a consumer can push data into.
///
/// `update` may fail for any reason, including a [`SourceData::Failed`]
/// entry; the consumer records the failure and keeps updating other units.
pub trait DisplayUnit: Send {
    fn title(&self) -> &str;
    fn update(&mut self, data: &DataMap) -> Result<()>;
    fn render(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    /// One value per x position
    #[default]
    Line,
    Scatter,
    /// Two-dimensional field over x and a second axis
    Mesh,
}

impl PanelKind {
    fn name(&self) -> &'static str {
        match self {
            PanelKind::Line => "line",
            PanelKind::Scatter => "scatter",
            PanelKind::Mesh => "mesh",
        }
    }
}

fn default_x() -> String {
    "time".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSpec {
    pub title: String,
    pub source: String,
    #[serde(default = "default_x")]
    pub x: String,
    pub variables: Vec<String>,
    #[serde(default)]
    pub kind: PanelKind,
}

impl PanelSpec {
    pub fn new<I, S>(title: impl Into<String>, source: impl Into<String>, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            source: source.into(),
            x: default_x(),
            variables: variables.into_iter().map(Into::into).collect(),
            kind: PanelKind::Line,
        }
    }

    pub fn with_kind(mut self, kind: PanelKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_x(mut self, x: impl Into<String>) -> Self {
        self.x = x.into();
        self
    }
}

/// Finite-value summary of one plotted variable.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub name: String,
    pub points: usize,
    pub valid: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl SeriesSummary {
    fn from_values(name: &str, values: &Values) -> Result<Self> {
        let numbers: Vec<f64> = match values {
            Values::Float(v) => v.clone(),
            Values::Int(v) => v.iter().map(|&x| x as f64).collect(),
            other => bail!("'{}' holds {} values, not numbers", name, other.kind()),
        };
        let finite: Vec<f64> = numbers.iter().copied().filter(|x| x.is_finite()).collect();
        Ok(Self {
            name: name.to_string(),
            points: numbers.len(),
            valid: finite.len(),
            min: finite.iter().copied().reduce(f64::min),
            max: finite.iter().copied().reduce(f64::max),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PanelState {
    Pending,
    NoData,
    Ready {
        x: String,
        extent: Option<(NaiveDateTime, NaiveDateTime)>,
        series: Vec<SeriesSummary>,
    },
}

/// A plot described by data: which source, which x axis, which variables.
#[derive(Debug, Clone)]
pub struct Panel {
    spec: PanelSpec,
    state: PanelState,
}

impl Panel {
    pub fn new(spec: PanelSpec) -> Self {
        Self {
            spec,
            state: PanelState::Pending,
        }
    }

    pub fn spec(&self) -> &PanelSpec {
        &self.spec
    }

    pub fn series(&self) -> &[SeriesSummary] {
        match &self.state {
            PanelState::Ready { series, .. } => series,
            PanelState::Pending | PanelState::NoData => &[],
        }
    }

    fn summarize(&self, data: &DataMap, dataset: &Dataset) -> Result<PanelState> {
        let x = data.axis_name(&self.spec.x);
        let axis = dataset
            .variable(&x)
            .ok_or_else(|| anyhow!("missing x axis '{}'", x))?;

        let mut series = Vec::with_capacity(self.spec.variables.len());
        for base in &self.spec.variables {
            let name = data.axis_name(base);
            let variable = dataset
                .variable(&name)
                .ok_or_else(|| anyhow!("missing variable '{}'", name))?;
            if variable.axis(&x).is_none() {
                bail!("'{}' does not vary along '{}'", name, x);
            }
            match (self.spec.kind, variable.dims.len()) {
                (PanelKind::Line | PanelKind::Scatter, 1) | (PanelKind::Mesh, 2) => {}
                (kind, n) => {
                    let needed = if kind == PanelKind::Mesh { 2 } else { 1 };
                    bail!(
                        "'{}' has {} dimension(s), a {} panel needs {}",
                        name,
                        n,
                        kind.name(),
                        needed
                    )
                }
            }
            series.push(SeriesSummary::from_values(&name, &variable.values)?);
        }

        Ok(PanelState::Ready {
            x,
            extent: axis.values.time_extent(),
            series,
        })
    }
}

impl DisplayUnit for Panel {
    fn title(&self) -> &str {
        &self.spec.title
    }

    fn update(&mut self, data: &DataMap) -> Result<()> {
        self.state = PanelState::Pending;
        let dataset = match data.get(&self.spec.source) {
            None => bail!("source '{}' is not part of this view", self.spec.source),
            Some(SourceData::Failed(reason)) => {
                bail!("source '{}' failed: {}", self.spec.source, reason)
            }
            Some(SourceData::NoData) => {
                self.state = PanelState::NoData;
                return Ok(());
            }
            Some(SourceData::Slice(dataset)) => dataset,
        };
        self.state = self.summarize(data, dataset)?;
        Ok(())
    }

    fn render(&self) -> String {
        let mut out = format!("[{}] {}", self.spec.kind.name(), self.spec.title);
        match &self.state {
            PanelState::Pending => out.push_str(": pending"),
            PanelState::NoData => out.push_str(": no data"),
            PanelState::Ready { x, extent, series } => {
                match extent {
                    Some((first, last)) => {
                        let _ = write!(out, "\n  {}: {} .. {}", x, first, last);
                    }
                    None => {
                        let _ = write!(out, "\n  {}: empty", x);
                    }
                }
                for s in series {
                    let _ = write!(out, "\n  {}: {}/{} valid", s.name, s.valid, s.points);
                    if let (Some(min), Some(max)) = (s.min, s.max) {
                        let _ = write!(out, ", min {:.2}, max {:.2}", min, max);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleigh_testing::fixtures::{day, hourly, profile, range};

    fn map(entries: Vec<(&str, SourceData)>, augmenter: Option<AxisAugmenter>) -> DataMap {
        DataMap::new(
            range("2024-05-09", "2024-05-10"),
            augmenter,
            entries
                .into_iter()
                .map(|(name, data)| (name.to_string(), data))
                .collect(),
        )
    }

    #[test]
    fn test_line_panel_summary() {
        let ds = hourly(day("2024-05-09"), &[0, 1, 2], "temp");
        let mut panel = Panel::new(PanelSpec::new("Air temperature", "asfs", ["temp"]));
        panel
            .update(&map(vec![("asfs", SourceData::Slice(Arc::new(ds)))], None))
            .unwrap();

        insta::assert_snapshot!(panel.render(), @r"
        [line] Air temperature
          time: 2024-05-09 00:00:00 .. 2024-05-09 02:00:00
          temp: 3/3 valid, min 900.00, max 902.00
        ");
    }

    #[test]
    fn test_mesh_panel_reads_augmented_names() {
        let augmenter = AxisAugmenter::default();
        let ds = augmenter.apply(&profile(day("2024-05-09"), &[0, 1], &[100.0, 200.0]));
        let mut panel = Panel::new(
            PanelSpec::new("Backscatter", "cl61", ["beta"]).with_kind(PanelKind::Mesh),
        );
        panel
            .update(&map(
                vec![("cl61", SourceData::Slice(Arc::new(ds)))],
                Some(augmenter),
            ))
            .unwrap();
        assert_eq!(panel.series()[0].name, "beta_");
        assert_eq!(panel.series()[0].points, 4);
    }

    #[test]
    fn test_line_panel_rejects_2d_variable() {
        let ds = profile(day("2024-05-09"), &[0], &[100.0, 200.0]);
        let mut panel = Panel::new(PanelSpec::new("Backscatter", "cl61", ["beta"]));
        let err = panel
            .update(&map(vec![("cl61", SourceData::Slice(Arc::new(ds)))], None))
            .unwrap_err();
        assert!(err.to_string().contains("a line panel needs 1"));
    }

    #[test]
    fn test_failed_source_is_an_error() {
        let mut panel = Panel::new(PanelSpec::new("Wind", "asfs", ["wspd"]));
        let err = panel
            .update(&map(vec![("asfs", SourceData::Failed("boom".into()))], None))
            .unwrap_err();
        assert_eq!(err.to_string(), "source 'asfs' failed: boom");
    }

    #[test]
    fn test_no_data_renders_placeholder() {
        let mut panel = Panel::new(PanelSpec::new("Wind", "asfs", ["wspd"]));
        panel.update(&map(vec![("asfs", SourceData::NoData)], None)).unwrap();
        assert_eq!(panel.render(), "[line] Wind: no data");
    }
}
