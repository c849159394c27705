use std::path::Path;

use chrono::{Days, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, subscriber::set_default};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;

use crate::{
    config::DatasetConfig, data::dataset::WindowedSeriesDataset,
    data::price_record::PriceRecord,
};

pub struct TracingGuards {
    _subscriber_guard: tracing::subscriber::DefaultGuard,
    _worker_guard: WorkerGuard,
}

pub fn setup_test_tracing(test_name: &str) -> TracingGuards {
    let log_dir = Path::new("tests/logs");
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir).unwrap();
    }

    let file_appender = tracing_appender::rolling::never(log_dir, format!("{}.log", test_name));
    let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = fmt::Subscriber::builder()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    // Default subscriber for this thread only
    let subscriber_guard = set_default(subscriber);

    TracingGuards {
        _subscriber_guard: subscriber_guard,
        _worker_guard: worker_guard,
    }
}

/// Closing prices `1, 2, ..., n`, undated.
pub fn linear_records(n: usize) -> Vec<PriceRecord> {
    (1..=n).map(|v| PriceRecord::new(v as f64)).collect()
}

/// A dated daily random walk with open and close prices, oldest first.
pub fn random_walk_records(n: usize, seed: u64) -> Vec<PriceRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut price = 100.0;
    (0..n)
        .map(|i| {
            let open = price;
            price *= 1.0 + rng.gen_range(-0.02..0.02);
            PriceRecord {
                date: start.checked_add_days(Days::new(i as u64)),
                open: Some(open),
                close: price,
            }
        })
        .collect()
}

pub fn setup_default_data(
    test_name: &str,
    config: Option<DatasetConfig>,
) -> (WindowedSeriesDataset, TracingGuards) {
    let guards = setup_test_tracing(test_name);
    info!("-----------------");
    info!("Test: {}", test_name);
    info!("-----------------");
    let config = config.unwrap_or_default();
    let records = random_walk_records(500, 7);
    let dataset = WindowedSeriesDataset::new(&config, &records).unwrap();
    (dataset, guards)
}
