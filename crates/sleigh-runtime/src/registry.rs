use crate::source::{CacheStats, SourceCache, SourceSpec};
use crate::{Error, Result};
use sleigh_types::{Dataset, TimeRange};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to one [`SourceCache`].
///
/// Clones share the cache; queries through any clone are serialized.
#[derive(Clone)]
pub struct SourceHandle {
    name: String,
    cache: Arc<Mutex<SourceCache>>,
}

impl SourceHandle {
    pub fn new(cache: SourceCache) -> Self {
        Self {
            name: cache.name().to_string(),
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn query(&self, range: &TimeRange) -> Result<Option<Dataset>> {
        self.lock()?.query(range)
    }

    /// Run `f` with exclusive access to the cache.
    pub fn with<R>(&self, f: impl FnOnce(&mut SourceCache) -> R) -> Result<R> {
        let mut cache = self.lock()?;
        Ok(f(&mut cache))
    }

    pub fn loaded_files(&self) -> Result<BTreeSet<String>> {
        self.with(|cache| cache.loaded_files().clone())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        self.with(|cache| cache.stats())
    }

    pub fn shares_cache(&self, other: &SourceHandle) -> bool {
        Arc::ptr_eq(&self.cache, &other.cache)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SourceCache>> {
        self.cache.lock().map_err(|_| {
            Error::InvalidOperation(format!(
                "source '{}' was poisoned by a panicking query",
                self.name
            ))
        })
    }
}

impl fmt::Debug for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SourceHandle").field(&self.name).finish()
    }
}

/// Name → cache mapping handed down from the dashboard to every consumer.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: BTreeMap<String, SourceHandle>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one cache per spec; fails on the first unusable source.
    pub fn from_specs(specs: impl IntoIterator<Item = SourceSpec>) -> Result<Self> {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, spec: SourceSpec) -> Result<SourceHandle> {
        self.insert(SourceCache::new(spec)?)
    }

    pub fn insert(&mut self, cache: SourceCache) -> Result<SourceHandle> {
        if self.sources.contains_key(cache.name()) {
            return Err(Error::DuplicateSource(cache.name().to_string()));
        }
        let handle = SourceHandle::new(cache);
        self.sources.insert(handle.name().to_string(), handle.clone());
        Ok(handle)
    }

    pub fn get(&self, name: &str) -> Option<&SourceHandle> {
        self.sources.get(name)
    }

    pub fn require(&self, name: &str) -> Result<SourceHandle> {
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownSource(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceHandle)> {
        self.sources.iter().map(|(name, handle)| (name.as_str(), handle))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
