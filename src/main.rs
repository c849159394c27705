use std::{error::Error, path::PathBuf};

use clap::Parser;
use tracing::{debug, info};
use windowed_series::{
    config::DatasetConfig, data::loader::load_price_records, logging::setup_tracing,
    WindowedSeriesDataset,
};

#[derive(Parser, Debug)]
#[command(about = "Build windowed training batches from a price history")]
struct Args {
    /// Path to the YAML config, created with defaults if missing
    #[arg(short, long, default_value = "config.yml", env = "WINDOWED_SERIES_CONFIG")]
    config: PathBuf,
    /// Overrides the number of epochs from the config
    #[arg(short, long)]
    epochs: Option<usize>,
    /// Directory for log files
    #[arg(short, long, default_value = "logs")]
    log_dir: String,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let _guard = setup_tracing(Some(args.log_dir.as_str()))?;

    let config = DatasetConfig::read_config(Some(&args.config))?;
    config.validate()?;
    let records = load_price_records(config.data_path())?;
    let mut dataset = WindowedSeriesDataset::new(&config, &records)?;
    info!("{}", dataset.info());

    let epochs = args.epochs.unwrap_or(config.epochs);
    for epoch_num in 0..epochs {
        let epoch = dataset.generate_one_epoch(config.batch_size)?;
        let num_batches = epoch.len();
        let mut samples = 0;
        for batch in epoch {
            let batch = batch?;
            debug!(
                "Epoch {} batch {}: history {:?} targets {:?}",
                epoch_num,
                batch.index(),
                batch.history().dim(),
                batch.targets().dim()
            );
            samples += batch.len();
        }
        info!(
            "Epoch {}/{}: {} batches, {} samples",
            epoch_num + 1,
            epochs,
            num_batches,
            samples
        );
    }
    Ok(())
}
