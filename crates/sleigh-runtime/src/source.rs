//! Incremental, date-partitioned source cache.
//!
//! A [`SourceCache`] remembers which day files it has merged. A query only
//! reads files it has never merged successfully, so re-querying a range that
//! is already covered costs a slice and no I/O. Nothing is ever evicted.

use crate::consumer::panic_message;
use crate::{Error, Result};
use sleigh_core::FileNamer;
use sleigh_formats::{DatasetReader, FormatKind, detect_format, ensure_readable, list_files, reader_for};
use sleigh_types::{Dataset, TimeRange};
use std::collections::BTreeSet;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-file transformation run right after a file is parsed.
pub type Preprocess = Arc<dyn Fn(Dataset) -> anyhow::Result<Dataset> + Send + Sync>;

fn identity(dataset: Dataset) -> anyhow::Result<Dataset> {
    Ok(dataset)
}

/// Immutable description of one data source.
#[derive(Clone)]
pub struct SourceSpec {
    name: String,
    dir: PathBuf,
    template: String,
    run_tags: Vec<String>,
    sort_dim: String,
    concat_dim: Option<String>,
    format: Option<FormatKind>,
    preprocess: Preprocess,
}

impl SourceSpec {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            template: template.into(),
            run_tags: Vec::new(),
            sort_dim: "time".to_string(),
            concat_dim: None,
            format: None,
            preprocess: Arc::new(identity),
        }
    }

    pub fn with_run_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sort_dim(mut self, dim: impl Into<String>) -> Self {
        self.sort_dim = dim.into();
        self
    }

    pub fn with_concat_dim(mut self, dim: impl Into<String>) -> Self {
        self.concat_dim = Some(dim.into());
        self
    }

    pub fn with_format(mut self, format: FormatKind) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_preprocess<F>(mut self, preprocess: F) -> Self
    where
        F: Fn(Dataset) -> anyhow::Result<Dataset> + Send + Sync + 'static,
    {
        self.preprocess = Arc::new(preprocess);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn run_tags(&self) -> &[String] {
        &self.run_tags
    }

    pub fn sort_dim(&self) -> &str {
        &self.sort_dim
    }

    /// Dimension files are joined along; the sort dimension unless set.
    pub fn concat_dim(&self) -> &str {
        self.concat_dim.as_deref().unwrap_or(&self.sort_dim)
    }

    /// Explicit format, else the one implied by the template extension.
    pub fn format(&self) -> Result<FormatKind> {
        match self.format {
            Some(kind) => Ok(kind),
            None => detect_format(Path::new(&self.template))
                .map_err(|e| Error::Config(format!("source '{}': {}", self.name, e))),
        }
    }
}

impl fmt::Debug for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSpec")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("template", &self.template)
            .field("run_tags", &self.run_tags)
            .field("sort_dim", &self.sort_dim)
            .field("concat_dim", &self.concat_dim())
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Counters that make the cache's I/O observable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub queries: u64,
    /// Storage directory listings
    pub listings: u64,
    /// Files opened for reading, successful or not
    pub files_read: u64,
    pub load_failures: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: String,
    pub reason: String,
}

/// Outcome of one load cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Files merged into the store, in merge order
    pub loaded: Vec<String>,
    /// Files that exist but could not be merged; retried on the next query
    pub failed: Vec<FileFailure>,
    /// Candidate files not present in storage
    pub missing: Vec<String>,
}

impl LoadReport {
    /// True when the cycle neither merged nor attempted anything.
    pub fn is_noop(&self) -> bool {
        self.loaded.is_empty() && self.failed.is_empty() && self.missing.is_empty()
    }
}

pub struct SourceCache {
    spec: SourceSpec,
    namer: FileNamer,
    reader: Arc<dyn DatasetReader>,
    loaded: BTreeSet<String>,
    store: Option<Dataset>,
    stats: CacheStats,
}

impl SourceCache {
    /// Validate `spec` and check its storage directory.
    ///
    /// A bad template or format is a configuration error; a missing or
    /// unreadable directory is [`Error::StorageUnavailable`].
    pub fn new(spec: SourceSpec) -> Result<Self> {
        let namer = FileNamer::new(spec.template(), spec.run_tags().iter().cloned())
            .map_err(|e| Error::Config(format!("source '{}': {}", spec.name(), e)))?;
        let format = spec.format()?;
        ensure_readable(spec.dir()).map_err(|e| {
            Error::StorageUnavailable(format!(
                "source '{}' at {}: {}",
                spec.name(),
                spec.dir().display(),
                e
            ))
        })?;
        let reader = reader_for(format, spec.sort_dim());

        Ok(Self {
            spec,
            namer,
            reader,
            loaded: BTreeSet::new(),
            store: None,
            stats: CacheStats::default(),
        })
    }

    pub fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn namer(&self) -> &FileNamer {
        &self.namer
    }

    pub fn loaded_files(&self) -> &BTreeSet<String> {
        &self.loaded
    }

    pub fn is_loaded(&self, file: &str) -> bool {
        self.loaded.contains(file)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Everything merged so far, sorted along the sort dimension.
    pub fn store(&self) -> Option<&Dataset> {
        self.store.as_ref()
    }

    /// Load `range` (if needed) and return its slice.
    ///
    /// `Ok(None)` means nothing has ever been merged.
    pub fn query(&mut self, range: &TimeRange) -> Result<Option<Dataset>> {
        self.stats.queries += 1;
        self.update(range)?;
        self.slice(range)
    }

    /// Merge every not-yet-loaded file that covers `range`.
    ///
    /// Per-file failures are logged and reported, never returned; only a
    /// storage listing failure or a broken store is an error.
    pub fn update(&mut self, range: &TimeRange) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        let delta: BTreeSet<String> = self
            .namer
            .candidates(range)
            .into_iter()
            .filter(|name| !self.loaded.contains(name))
            .collect();
        if delta.is_empty() {
            log::debug!("{}: {} already loaded", self.name(), range);
            return Ok(report);
        }

        let present = list_files(self.spec.dir()).map_err(|e| {
            Error::StorageUnavailable(format!("source '{}': {}", self.name(), e))
        })?;
        self.stats.listings += 1;
        log::debug!(
            "{}: {} candidate(s) not loaded for {}",
            self.name(),
            delta.len(),
            range
        );

        let concat_dim = self.spec.concat_dim().to_string();
        let mut store = self.store.clone();
        for file in delta {
            if !present.contains(&file) {
                report.missing.push(file);
                continue;
            }
            self.stats.files_read += 1;
            // A panicking reader or preprocess must not poison the handle.
            let merged = catch_unwind(AssertUnwindSafe(|| {
                let dataset = self.load_file(&file)?;
                match store.as_ref() {
                    Some(current) => current
                        .concat(&dataset, &concat_dim)
                        .map_err(|e| format!("cannot merge: {}", e)),
                    None => Ok(dataset),
                }
            }))
            .unwrap_or_else(|panic| Err(format!("panicked: {}", panic_message(panic.as_ref()))));
            match merged {
                Ok(next) => {
                    log::info!("{}: merged {}", self.spec.name(), file);
                    store = Some(next);
                    report.loaded.push(file);
                }
                Err(reason) => {
                    log::warn!("{}: skipping {}: {}", self.spec.name(), file, reason);
                    self.stats.load_failures += 1;
                    report.failed.push(FileFailure { file, reason });
                }
            }
        }
        if !report.loaded.is_empty()
            && let Some(store) = store.as_mut()
        {
            store.sort_along(self.spec.sort_dim())?;
        }
        self.store = store;
        self.loaded.extend(report.loaded.iter().cloned());
        Ok(report)
    }

    /// Slice the store to `start <= t < end` along the sort dimension.
    pub fn slice(&self, range: &TimeRange) -> Result<Option<Dataset>> {
        let Some(store) = self.store.as_ref() else {
            return Ok(None);
        };
        let slice = store.time_slice(self.spec.sort_dim(), range.start(), range.end())?;
        Ok(Some(slice))
    }

    fn load_file(&self, file: &str) -> std::result::Result<Dataset, String> {
        let path = self.spec.dir().join(file);
        let dataset = self.reader.read(&path).map_err(|e| e.to_string())?;
        let dataset = (self.spec.preprocess)(dataset).map_err(|e| format!("preprocess: {:#}", e))?;
        dataset
            .validate()
            .map_err(|e| format!("preprocess produced an invalid dataset: {}", e))?;

        let sort_dim = self.spec.sort_dim();
        for dim in [sort_dim, self.spec.concat_dim()] {
            if dataset.dim_size(dim).is_none() {
                return Err(format!("missing dimension '{}'", dim));
            }
        }
        let index = dataset
            .coords
            .get(sort_dim)
            .filter(|coord| coord.dims.len() == 1 && coord.dims[0] == sort_dim)
            .ok_or_else(|| format!("missing index coordinate '{}'", sort_dim))?;
        if index.values.as_time().is_none() {
            return Err(format!(
                "index '{}' holds {} values, not timestamps",
                sort_dim,
                index.values.kind()
            ));
        }
        Ok(dataset)
    }
}

impl fmt::Debug for SourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceCache")
            .field("spec", &self.spec)
            .field("reader", &self.reader.id())
            .field("loaded", &self.loaded)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
