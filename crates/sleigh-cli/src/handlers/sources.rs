use anyhow::Result;
use sleigh_runtime::DashboardConfig;

pub fn handle(config: &DashboardConfig) -> Result<()> {
    if config.sources.is_empty() {
        println!("No sources configured.");
        return Ok(());
    }

    println!("{:<12} {:<7} {:<40} DIR", "SOURCE", "FORMAT", "TEMPLATE");
    println!("{}", "-".repeat(80));

    for (name, source) in &config.sources {
        let spec = source.to_spec(name);
        let format = spec
            .format()
            .map(|kind| kind.to_string())
            .unwrap_or_else(|_| "?".to_string());
        println!(
            "{:<12} {:<7} {:<40} {}",
            name,
            format,
            spec.template(),
            spec.dir().display()
        );
    }

    Ok(())
}
