use std::{process, sync::Arc};

use clap::Parser;
use log::{error, info, LevelFilter};
use travellog::{App, Cli, Config, LogSink, Result, TripStore};

pub fn initialize_logger(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_secs().format_module_path(true);
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    info!("Logger initialized");
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(trips_dir) = cli.trips_dir {
        config.trips_dir = trips_dir;
    }

    let store = TripStore::new(config.trips_dir.clone(), Arc::new(LogSink))?;
    App::new(store, config, cli.verbose).run(cli.command)
}

fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
