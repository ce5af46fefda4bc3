//! Dashboard root: the global range and the optional comparison view.

use crate::augment::AxisAugmenter;
use crate::config::DashboardConfig;
use crate::consumer::ConsumerSpec;
use crate::control::RangeControl;
use crate::group::ConsumerGroup;
use crate::registry::SourceRegistry;
use crate::Result;
use chrono::NaiveDate;
use sleigh_types::TimeRange;
use std::fmt;
use std::sync::Arc;

/// Builds one view over the shared registry; called with an augmenter for
/// the comparison view.
pub type GroupFactory =
    Arc<dyn Fn(&SourceRegistry, Option<AxisAugmenter>) -> Result<ConsumerGroup> + Send + Sync>;

/// Factory that lays out `specs` as data-driven consumers.
pub fn layout(specs: Vec<ConsumerSpec>) -> GroupFactory {
    Arc::new(
        move |registry: &SourceRegistry, augmenter: Option<AxisAugmenter>| {
            ConsumerGroup::build(&specs, registry, augmenter)
        },
    )
}

pub struct Dashboard {
    global: RangeControl,
    registry: SourceRegistry,
    factory: GroupFactory,
    compare_augmenter: AxisAugmenter,
    primary: ConsumerGroup,
    comparison: Option<ConsumerGroup>,
}

impl Dashboard {
    /// Build the primary view and bind it to `global`.
    pub fn new(
        global: RangeControl,
        registry: SourceRegistry,
        factory: GroupFactory,
        compare_augmenter: AxisAugmenter,
    ) -> Result<Self> {
        let mut primary = factory(&registry, None)?;
        primary.bind_global(&global)?;
        Ok(Self {
            global,
            registry,
            factory,
            compare_augmenter,
            primary,
            comparison: None,
        })
    }

    pub fn from_specs(
        global: RangeControl,
        registry: SourceRegistry,
        specs: Vec<ConsumerSpec>,
        compare_augmenter: AxisAugmenter,
    ) -> Result<Self> {
        Self::new(global, registry, layout(specs), compare_augmenter)
    }

    /// Sources, tabs and initial range from `config`, relative to `today`.
    pub fn from_config(config: &DashboardConfig, today: NaiveDate) -> Result<Self> {
        Self::from_config_at(config, config.range.initial_range(today)?)
    }

    /// Like [`Dashboard::from_config`], starting at `initial` instead.
    pub fn from_config_at(config: &DashboardConfig, initial: TimeRange) -> Result<Self> {
        config.validate()?;
        let registry = config.registry()?;
        let global = RangeControl::with_bounds("global", initial, config.range.bounds())?;
        Self::from_specs(global, registry, config.tabs.clone(), config.range.augmenter()?)
    }

    pub fn global(&self) -> &RangeControl {
        &self.global
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn primary(&self) -> &ConsumerGroup {
        &self.primary
    }

    pub fn comparison(&self) -> Option<&ConsumerGroup> {
        self.comparison.as_ref()
    }

    pub fn is_comparing(&self) -> bool {
        self.comparison.is_some()
    }

    /// Set the global range; every bound consumer recomputes before this returns.
    pub fn set_range(&self, range: TimeRange) -> Result<bool> {
        self.global.set_value(range)
    }

    /// Add or remove the comparison view.
    ///
    /// The comparison view reads the same caches as the primary one, with
    /// every name suffixed so its axes stay independent.
    pub fn set_compare(&mut self, enabled: bool) -> Result<()> {
        match (enabled, self.comparison.is_some()) {
            (true, false) => {
                let mut group = (self.factory)(&self.registry, Some(self.compare_augmenter.clone()))?;
                group.bind_global(&self.global)?;
                log::debug!("comparison view with {} consumer(s)", group.len());
                self.comparison = Some(group);
            }
            (false, true) => {
                self.comparison = None;
                log::debug!("comparison view dropped");
            }
            _ => {}
        }
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = self.primary.render();
        if let Some(comparison) = &self.comparison {
            out.push_str("\n\n");
            out.push_str(&comparison.render());
        }
        out
    }
}

impl fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dashboard")
            .field("global", &self.global)
            .field("registry", &self.registry)
            .field("primary", &self.primary)
            .field("comparison", &self.comparison)
            .finish_non_exhaustive()
    }
}
