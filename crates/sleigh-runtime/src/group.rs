use crate::augment::AxisAugmenter;
use crate::consumer::{Consumer, ConsumerSpec};
use crate::control::RangeControl;
use crate::registry::SourceRegistry;
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

/// A set of consumers sharing one source registry (one dashboard view).
#[derive(Debug)]
pub struct ConsumerGroup {
    consumers: Vec<Consumer>,
    registry: SourceRegistry,
    augmenter: Option<AxisAugmenter>,
}

impl ConsumerGroup {
    /// Build one consumer per spec.
    ///
    /// Every required source is checked against `registry` before anything
    /// is constructed. No data is loaded here.
    pub fn build(
        specs: &[ConsumerSpec],
        registry: &SourceRegistry,
        augmenter: Option<AxisAugmenter>,
    ) -> Result<Self> {
        let mut names = BTreeSet::new();
        for spec in specs {
            if !names.insert(spec.name.as_str()) {
                return Err(Error::Config(format!("consumer '{}' is defined twice", spec.name)));
            }
            if let Some(missing) = spec
                .required_sources()
                .into_iter()
                .find(|source| !registry.contains(source))
            {
                return Err(Error::UnknownSource(format!(
                    "{} (required by '{}')",
                    missing, spec.name
                )));
            }
        }

        let consumers = specs
            .iter()
            .map(|spec| Consumer::from_spec(spec, registry, augmenter.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            consumers,
            registry: registry.clone(),
            augmenter,
        })
    }

    /// Group pre-built consumers, checking their sources come from `registry`.
    pub fn from_consumers(consumers: Vec<Consumer>, registry: &SourceRegistry) -> Result<Self> {
        let augmenter = consumers.first().and_then(|c| c.augmenter());
        for consumer in &consumers {
            if consumer.augmenter() != augmenter {
                return Err(Error::Config(format!(
                    "consumer '{}' does not share the group's axis suffix",
                    consumer.name()
                )));
            }
            for handle in consumer.sources() {
                let registered = registry
                    .get(handle.name())
                    .is_some_and(|known| known.shares_cache(&handle));
                if !registered {
                    return Err(Error::UnknownSource(format!(
                        "{} (used by '{}' but not in this registry)",
                        handle.name(),
                        consumer.name()
                    )));
                }
            }
        }
        Ok(Self {
            consumers,
            registry: registry.clone(),
            augmenter,
        })
    }

    /// Bind every consumer to `global`.
    pub fn bind_global(&mut self, global: &RangeControl) -> Result<()> {
        for consumer in &mut self.consumers {
            consumer.bind_to_global(global)?;
        }
        Ok(())
    }

    pub fn consumers(&self) -> &[Consumer] {
        &self.consumers
    }

    pub fn consumer(&self, name: &str) -> Option<&Consumer> {
        self.consumers.iter().find(|c| c.name() == name)
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn augmenter(&self) -> Option<&AxisAugmenter> {
        self.augmenter.as_ref()
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Loaded files of every source some consumer in the group reads.
    pub fn loaded_files(&self) -> Result<BTreeMap<String, BTreeSet<String>>> {
        let mut out = BTreeMap::new();
        for consumer in &self.consumers {
            for handle in consumer.sources() {
                if !out.contains_key(handle.name()) {
                    out.insert(handle.name().to_string(), handle.loaded_files()?);
                }
            }
        }
        Ok(out)
    }

    pub fn render(&self) -> String {
        self.consumers
            .iter()
            .map(Consumer::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::PanelSpec;
    use crate::source::SourceSpec;
    use sleigh_testing::DataWorld;
    use sleigh_testing::fixtures::range;

    fn registry(world: &DataWorld) -> SourceRegistry {
        SourceRegistry::from_specs([SourceSpec::new(
            "asfs",
            world.source_dir("asfs"),
            "asfs_%Y%m%d.json",
        )])
        .unwrap()
    }

    #[test]
    fn test_unknown_source_fails_before_any_consumer_exists() {
        let world = DataWorld::new();
        let specs = vec![
            ConsumerSpec::new("met").with_panel(PanelSpec::new("Wind", "asfs", ["wspd"])),
            ConsumerSpec::new("forecast").with_panel(PanelSpec::new("GFS", "gfs", ["t2m"])),
        ];
        let err = ConsumerGroup::build(&specs, &registry(&world), None).unwrap_err();
        assert_eq!(err.to_string(), "Unknown source: gfs (required by 'forecast')");
    }

    #[test]
    fn test_duplicate_consumer_names_rejected() {
        let world = DataWorld::new();
        let specs = vec![ConsumerSpec::new("met"), ConsumerSpec::new("met")];
        assert!(matches!(
            ConsumerGroup::build(&specs, &registry(&world), None),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_consumers_rejects_foreign_cache() {
        let world = DataWorld::new();
        let ours = registry(&world);
        let theirs = registry(&world);
        let consumer = Consumer::with_range(
            "met",
            range("2024-05-09", "2024-05-10"),
            vec![theirs.require("asfs").unwrap()],
            Vec::new(),
            None,
        );
        assert!(matches!(
            ConsumerGroup::from_consumers(vec![consumer], &ours),
            Err(Error::UnknownSource(_))
        ));
    }

    #[test]
    fn test_build_does_no_io() {
        let world = DataWorld::new();
        let registry = registry(&world);
        let specs =
            vec![ConsumerSpec::new("met").with_panel(PanelSpec::new("Wind", "asfs", ["wspd"]))];
        let group = ConsumerGroup::build(&specs, &registry, None).unwrap();
        assert_eq!(group.len(), 1);
        let stats = registry.require("asfs").unwrap().stats().unwrap();
        assert_eq!(stats.listings, 0);
        assert_eq!(stats.queries, 0);
    }
}
