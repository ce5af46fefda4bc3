use anyhow::{Result, bail};
use sleigh_runtime::{ConsumerGroup, Dashboard, DashboardConfig};
use sleigh_types::TimeRange;

pub fn handle(config: &DashboardConfig, range: TimeRange, compare: bool, tab: Option<&str>) -> Result<()> {
    if let Some(tab) = tab
        && !config.tabs.iter().any(|t| t.name == tab)
    {
        bail!("unknown tab '{}'", tab);
    }
    if config.tabs.is_empty() {
        println!("No tabs configured.");
        return Ok(());
    }

    let mut dashboard = Dashboard::from_config_at(config, range)?;
    dashboard.set_compare(compare)?;

    print_group(dashboard.primary(), tab);
    if let Some(comparison) = dashboard.comparison() {
        println!();
        println!("--- comparison ---");
        println!();
        print_group(comparison, tab);
    }

    for (name, handle) in dashboard.registry().iter() {
        let stats = handle.stats()?;
        log::info!(
            "{}: {} file(s) read, {} failure(s), {} listing(s)",
            name,
            stats.files_read,
            stats.load_failures,
            stats.listings
        );
    }
    Ok(())
}

fn print_group(group: &ConsumerGroup, tab: Option<&str>) {
    let mut first = true;
    for consumer in group.consumers() {
        if tab.is_some_and(|t| t != consumer.name()) {
            continue;
        }
        if !first {
            println!();
        }
        first = false;
        println!("{}", consumer.render());
    }
}
