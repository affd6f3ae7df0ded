use clap::Parser;
use log::{error, info};

use headmerge::{combine_datasets, Args};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match args.to_combine_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    info!("Starting the dataset combination...");

    match combine_datasets(&config) {
        Ok(summary) => {
            summary.print_summary();
            info!("Dataset combination complete.");
        }
        Err(e) => error!("Failed to combine datasets: {}", e),
    }
}
