use crate::augment::{AxisAugmenter, DEFAULT_SUFFIX};
use crate::consumer::{ConsumerSpec, DEFAULT_DAYS};
use crate::control::RangeBounds;
use crate::preprocess::{PreprocessStep, pipeline};
use crate::registry::SourceRegistry;
use crate::source::SourceSpec;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sleigh_core::{expand_tilde, resolve_config_path};
use sleigh_formats::FormatKind;
use sleigh_types::{TimeRange, midnight};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A `[[tabs]]` entry is a consumer description.
pub type TabConfig = ConsumerSpec;

fn default_initial_days() -> u32 {
    DEFAULT_DAYS
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

fn default_sort_dim() -> String {
    "time".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeConfig {
    /// Lower bound of the global range picker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest: Option<NaiveDate>,
    #[serde(default = "default_initial_days")]
    pub initial_days: u32,
    #[serde(default = "default_suffix")]
    pub compare_suffix: String,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            earliest: None,
            initial_days: default_initial_days(),
            compare_suffix: default_suffix(),
        }
    }
}

impl RangeConfig {
    pub fn bounds(&self) -> RangeBounds {
        RangeBounds::new(self.earliest.map(midnight), None)
    }

    /// The last `initial_days` days through `today`, clipped to `earliest`.
    pub fn initial_range(&self, today: NaiveDate) -> Result<TimeRange> {
        let range = TimeRange::trailing_days(today, self.initial_days)?;
        match self.earliest.map(midnight) {
            Some(earliest) if range.start() < earliest => {
                Ok(TimeRange::new(earliest, range.end().max(earliest))?)
            }
            _ => Ok(range),
        }
    }

    pub fn augmenter(&self) -> Result<AxisAugmenter> {
        AxisAugmenter::new(self.compare_suffix.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub dir: String,
    pub template: String,
    #[serde(default = "default_sort_dim")]
    pub sort_dim: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concat_dim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preprocess: Vec<PreprocessStep>,
}

impl SourceConfig {
    pub fn new(dir: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            template: template.into(),
            sort_dim: default_sort_dim(),
            concat_dim: None,
            format: None,
            run_tags: Vec::new(),
            preprocess: Vec::new(),
        }
    }

    pub fn to_spec(&self, name: &str) -> SourceSpec {
        let mut spec = SourceSpec::new(name, expand_tilde(&self.dir), self.template.clone())
            .with_sort_dim(self.sort_dim.clone())
            .with_run_tags(self.run_tags.iter().cloned());
        if let Some(dim) = &self.concat_dim {
            spec = spec.with_concat_dim(dim.clone());
        }
        if let Some(format) = self.format {
            spec = spec.with_format(format);
        }
        if !self.preprocess.is_empty() {
            let run = pipeline(self.preprocess.clone());
            spec = spec.with_preprocess(move |dataset| run(dataset));
        }
        spec
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub range: RangeConfig,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
    #[serde(default)]
    pub tabs: Vec<TabConfig>,
}

impl DashboardConfig {
    /// Load from `--config`, `SLEIGH_CONFIG` or the default location.
    pub fn load(explicit_path: Option<&str>) -> Result<Self> {
        let path = Self::resolve_path(explicit_path)?;
        Self::load_from(&path)
    }

    pub fn resolve_path(explicit_path: Option<&str>) -> Result<PathBuf> {
        Ok(resolve_config_path(explicit_path)?)
    }

    /// A missing file yields the default (empty) config.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: DashboardConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn set_source(&mut self, name: impl Into<String>, source: SourceConfig) {
        self.sources.insert(name.into(), source);
    }

    pub fn source_specs(&self) -> Vec<SourceSpec> {
        self.sources
            .iter()
            .map(|(name, source)| source.to_spec(name))
            .collect()
    }

    /// One cache per configured source.
    pub fn registry(&self) -> Result<SourceRegistry> {
        SourceRegistry::from_specs(self.source_specs())
    }

    /// Check that every tab only reads configured sources.
    pub fn validate(&self) -> Result<()> {
        for tab in &self.tabs {
            if let Some(missing) = tab
                .required_sources()
                .into_iter()
                .find(|name| !self.sources.contains_key(name))
            {
                return Err(Error::UnknownSource(format!(
                    "{} (required by '{}')",
                    missing, tab.name
                )));
            }
        }
        self.range.augmenter()?;
        Ok(())
    }
}
