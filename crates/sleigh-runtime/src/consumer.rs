//! A consumer: one tab's worth of display units fed from shared sources.

use crate::augment::AxisAugmenter;
use crate::control::{RangeControl, Subscription};
use crate::panel::{DataMap, DisplayUnit, Panel, PanelSpec, SourceData};
use crate::registry::{SourceHandle, SourceRegistry};
use crate::Result;
use serde::{Deserialize, Serialize};
use sleigh_types::TimeRange;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Days shown by a consumer before it is bound to anything.
pub const DEFAULT_DAYS: u32 = 2;

/// Declarative consumer: a name, its panels and any extra sources it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default)]
    pub panels: Vec<PanelSpec>,
}

impl ConsumerSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            sources: Vec::new(),
            panels: Vec::new(),
        }
    }

    pub fn with_panel(mut self, panel: PanelSpec) -> Self {
        self.panels.push(panel);
        self
    }

    /// Listed sources plus every source a panel reads.
    pub fn required_sources(&self) -> BTreeSet<String> {
        self.sources
            .iter()
            .cloned()
            .chain(self.panels.iter().map(|p| p.source.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    /// Not computed yet
    Pending,
    Ready,
    Failed(String),
}

struct ConsumerState {
    name: String,
    sources: Vec<SourceHandle>,
    augmenter: Option<AxisAugmenter>,
    units: Vec<Box<dyn DisplayUnit>>,
    statuses: Vec<UnitStatus>,
    data: Option<DataMap>,
    revision: u64,
}

impl ConsumerState {
    fn recompute(&mut self, range: &TimeRange) {
        let mut entries = BTreeMap::new();
        for handle in &self.sources {
            let data = match handle.query(range) {
                Ok(Some(slice)) => {
                    let slice = match &self.augmenter {
                        Some(augmenter) => augmenter.apply(&slice),
                        None => slice,
                    };
                    SourceData::Slice(Arc::new(slice))
                }
                Ok(None) => SourceData::NoData,
                Err(e) => {
                    log::warn!("{}: source '{}' failed for {}: {}", self.name, handle.name(), range, e);
                    SourceData::Failed(e.to_string())
                }
            };
            entries.insert(handle.name().to_string(), data);
        }

        let data = DataMap::new(*range, self.augmenter.clone(), entries);
        self.statuses = self
            .units
            .iter_mut()
            .map(|unit| {
                let status = update_unit(unit.as_mut(), &data);
                if let UnitStatus::Failed(reason) = &status {
                    log::warn!("{}: '{}' failed: {}", self.name, unit.title(), reason);
                }
                status
            })
            .collect();
        self.data = Some(data);
        self.revision += 1;
    }
}

fn update_unit(unit: &mut dyn DisplayUnit, data: &DataMap) -> UnitStatus {
    match catch_unwind(AssertUnwindSafe(|| unit.update(data))) {
        Ok(Ok(())) => UnitStatus::Ready,
        Ok(Err(e)) => UnitStatus::Failed(format!("{:#}", e)),
        Err(panic) => UnitStatus::Failed(format!("panicked: {}", panic_message(panic.as_ref()))),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn lock(state: &Mutex<ConsumerState>) -> MutexGuard<'_, ConsumerState> {
    // Unit panics are caught inside recompute, so the state is never half-written.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns a local range control and recomputes its display units whenever
/// that range changes, either directly or through a bound global control.
pub struct Consumer {
    name: String,
    title: String,
    control: RangeControl,
    state: Arc<Mutex<ConsumerState>>,
    link: Option<Subscription>,
    _local: Subscription,
}

impl Consumer {
    /// Consumer showing the last [`DEFAULT_DAYS`] days until told otherwise.
    pub fn new(
        name: impl Into<String>,
        sources: Vec<SourceHandle>,
        units: Vec<Box<dyn DisplayUnit>>,
        augmenter: Option<AxisAugmenter>,
    ) -> Result<Self> {
        let today = chrono::Local::now().date_naive();
        Ok(Self::with_range(
            name,
            TimeRange::trailing_days(today, DEFAULT_DAYS)?,
            sources,
            units,
            augmenter,
        ))
    }

    pub fn with_range(
        name: impl Into<String>,
        range: TimeRange,
        sources: Vec<SourceHandle>,
        units: Vec<Box<dyn DisplayUnit>>,
        augmenter: Option<AxisAugmenter>,
    ) -> Self {
        let name = name.into();
        let statuses = vec![UnitStatus::Pending; units.len()];
        let state = Arc::new(Mutex::new(ConsumerState {
            name: name.clone(),
            sources,
            augmenter,
            units,
            statuses,
            data: None,
            revision: 0,
        }));

        let control = RangeControl::new(format!("{}.range", name), range);
        let weak = Arc::downgrade(&state);
        let local = control.subscribe(move |range| {
            if let Some(state) = weak.upgrade() {
                lock(&state).recompute(range);
            }
        });

        Self {
            title: name.clone(),
            name,
            control,
            state,
            link: None,
            _local: local,
        }
    }

    /// Resolve `spec` against `registry` and build one [`Panel`] per panel spec.
    pub fn from_spec(
        spec: &ConsumerSpec,
        registry: &SourceRegistry,
        augmenter: Option<AxisAugmenter>,
    ) -> Result<Self> {
        let sources = spec
            .required_sources()
            .iter()
            .map(|name| registry.require(name))
            .collect::<Result<Vec<_>>>()?;
        let units = spec
            .panels
            .iter()
            .map(|panel| Box::new(Panel::new(panel.clone())) as Box<dyn DisplayUnit>)
            .collect();
        let consumer = Self::new(spec.name.clone(), sources, units, augmenter)?;
        Ok(match &spec.title {
            Some(title) => consumer.with_title(title.clone()),
            None => consumer,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn control(&self) -> &RangeControl {
        &self.control
    }

    pub fn range(&self) -> TimeRange {
        self.control.value()
    }

    pub fn sources(&self) -> Vec<SourceHandle> {
        lock(&self.state).sources.clone()
    }

    pub fn required_sources(&self) -> Vec<String> {
        lock(&self.state)
            .sources
            .iter()
            .map(|handle| handle.name().to_string())
            .collect()
    }

    pub fn augmenter(&self) -> Option<AxisAugmenter> {
        lock(&self.state).augmenter.clone()
    }

    /// Change the local range; recomputes when the value changed.
    pub fn set_range(&self, range: TimeRange) -> Result<bool> {
        self.control.set_value(range)
    }

    /// Recompute for the current range, reloading nothing already cached.
    pub fn refresh(&self) {
        let range = self.control.value();
        lock(&self.state).recompute(&range);
    }

    /// Follow `global`: copy its bounds and value, then track every change.
    ///
    /// Replaces any earlier binding. Always leaves the consumer computed for
    /// the global value.
    pub fn bind_to_global(&mut self, global: &RangeControl) -> Result<()> {
        self.link = None;
        let changed = self.control.reset(global.bounds(), global.value())?;

        let local = self.control.clone();
        let name = self.name.clone();
        self.link = Some(global.subscribe(move |value| {
            if let Err(e) = local.set_value(*value) {
                log::warn!("{}: ignoring global range {}: {}", name, value, e);
            }
        }));
        if !changed {
            self.refresh();
        }
        Ok(())
    }

    pub fn unbind(&mut self) {
        self.link = None;
    }

    pub fn is_bound(&self) -> bool {
        self.link.is_some()
    }

    /// The data map from the latest recompute.
    pub fn data(&self) -> Option<DataMap> {
        lock(&self.state).data.clone()
    }

    pub fn statuses(&self) -> Vec<UnitStatus> {
        lock(&self.state).statuses.clone()
    }

    /// Number of completed recomputes.
    pub fn revision(&self) -> u64 {
        lock(&self.state).revision
    }

    /// Text view of every unit; failed units show their error instead.
    pub fn render(&self) -> String {
        let state = lock(&self.state);
        let mut out = format!("== {} ==", self.title);
        if let Some(data) = &state.data {
            let _ = write!(out, " {}", data.range());
        }
        for (unit, status) in state.units.iter().zip(&state.statuses) {
            out.push('\n');
            match status {
                UnitStatus::Failed(reason) => {
                    let _ = write!(out, "[error] {}: {}", unit.title(), reason);
                }
                UnitStatus::Pending | UnitStatus::Ready => out.push_str(&unit.render()),
            }
        }
        out
    }
}

impl std::fmt::Debug for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("name", &self.name)
            .field("range", &self.control.value())
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}
