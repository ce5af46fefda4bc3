use super::args::{Cli, Commands};
use super::handlers;
use crate::types::LogLevel;
use anyhow::{Context, Result, bail};
use chrono::Local;
use sleigh_runtime::DashboardConfig;
use sleigh_types::{OpenTimeRange, TimeRange, parse_datetime};

/// Install the stderr logger; `RUST_LOG` overrides `--log-level`.
pub fn init_logging(level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(level.into())
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let config_path = DashboardConfig::resolve_path(cli.config.as_deref())?;
    log::debug!("config: {}", config_path.display());
    let config = DashboardConfig::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match cli.command {
        Commands::Sources => handlers::sources::handle(&config),
        Commands::Files { source, start, end } => {
            let range = resolve_range(&config, start.as_deref(), end.as_deref())?;
            handlers::files::handle(&config, &source, &range)
        }
        Commands::Show {
            start,
            end,
            compare,
            tab,
        } => {
            let range = resolve_range(&config, start.as_deref(), end.as_deref())?;
            handlers::show::handle(&config, range, compare, tab.as_deref())
        }
    }
}

/// Range from the command line, or the configured initial range.
fn resolve_range(config: &DashboardConfig, start: Option<&str>, end: Option<&str>) -> Result<TimeRange> {
    let now = Local::now().naive_local();
    match (start, end) {
        (None, None) => Ok(config.range.initial_range(now.date())?),
        (None, Some(_)) => bail!("--end requires --start"),
        (Some(start), end) => {
            let start = parse_datetime(start)?;
            let end = end.map(parse_datetime).transpose()?;
            Ok(OpenTimeRange::new(start, end).resolve(now)?)
        }
    }
}
