use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(
    name = "travellog",
    version,
    about = "Personal travel log: trips, attachments and statistics"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Path to the trips directory (overrides the configuration)
    #[clap(long, value_parser)]
    pub trips_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the travellog application
    #[clap(subcommand)]
    pub command: Commands,
}
