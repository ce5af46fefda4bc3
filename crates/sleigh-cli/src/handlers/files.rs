use anyhow::{Result, anyhow};
use sleigh_formats::list_files;
use sleigh_runtime::{DashboardConfig, SourceCache};
use sleigh_types::TimeRange;

pub fn handle(config: &DashboardConfig, source: &str, range: &TimeRange) -> Result<()> {
    let source_config = config.sources.get(source).ok_or_else(|| {
        let known: Vec<&str> = config.sources.keys().map(String::as_str).collect();
        anyhow!("unknown source '{}' (configured: {})", source, known.join(", "))
    })?;
    let cache = SourceCache::new(source_config.to_spec(source))?;
    let present = list_files(cache.spec().dir())?;

    println!("{} {}", source, range);
    let candidates = cache.namer().candidates(range);
    let mut found = 0;
    for name in &candidates {
        let state = if present.contains(name) {
            found += 1;
            "present"
        } else {
            "missing"
        };
        println!("  {:<8} {}", state, name);
    }
    println!("{}/{} file(s) present", found, candidates.len());

    Ok(())
}
