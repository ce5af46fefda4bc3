use crate::types::LogLevel;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sleigh")]
#[command(about = "Inspect date-partitioned instrument data the way the dashboard sees it", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Dashboard config (default: $SLEIGH_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configured sources
    Sources,

    /// Show which files a range needs from one source and which exist
    Files {
        #[arg(long)]
        source: String,

        /// YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]
        #[arg(long)]
        start: Option<String>,

        /// Defaults to now when --start is given
        #[arg(long)]
        end: Option<String>,
    },

    /// Load a range and print every tab's text view
    Show {
        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,

        /// Also build the comparison view
        #[arg(long)]
        compare: bool,

        /// Only print this tab
        #[arg(long)]
        tab: Option<String>,
    },
}
