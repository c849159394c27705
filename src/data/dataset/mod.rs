use std::fmt;

use chrono::Utc;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::DatasetConfig,
    data::price_record::{first_out_of_order, flatten_prices, PriceRecord},
    error::DatasetError,
};

use self::{
    batcher::{num_batches, Epoch},
    chunker::chunk_series,
    normalizer::{normalize_chunks, RatioAnchors},
    splitter::split_samples,
    windower::{window_chunks, SampleSet},
};

pub mod batcher;
pub mod chunker;
pub mod normalizer;
pub mod splitter;
pub mod windower;

/**
Fixed-shape supervised samples built from one symbol's price history, served as shuffled
mini-batches.

Construction runs chunking, normalization, windowing and the train/test split once. Each call to
[`WindowedSeriesDataset::generate_one_epoch`] draws a fresh batch order from the dataset's own
random source, which is seeded once and never re-seeded. Generating an epoch takes `&mut self`,
so sharing one dataset between threads needs external synchronization.
 */
#[derive(Debug)]
pub struct WindowedSeriesDataset<R = ChaCha8Rng> {
    symbol: String,
    input_size: usize,
    num_steps: usize,
    chunks: Array2<f64>,
    anchors: Option<RatioAnchors>,
    train: SampleSet,
    test: SampleSet,
    seed: Option<u64>,
    rng: R,
}

impl WindowedSeriesDataset<ChaCha8Rng> {
    /**
    Build the dataset from price records in chronological ascending order.

    The random source is seeded with `config.seed`, or from the wall clock when no seed is set.

    ## Arguments
    * `config` - Construction parameters.
    * `records` - The price history, oldest first.

    ## Returns
    The dataset, or the first error hit while building it. No partially built dataset is returned.
     */
    pub fn new(config: &DatasetConfig, records: &[PriceRecord]) -> Result<Self, DatasetError> {
        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = clock_seed();
                info!(seed, "No seed configured, seeding from the wall clock");
                seed
            }
        };
        Self::build(config, records, ChaCha8Rng::seed_from_u64(seed), Some(seed))
    }
}

impl<R: Rng> WindowedSeriesDataset<R> {
    /// Build the dataset with an injected random source. `config.seed` is ignored.
    pub fn with_rng(
        config: &DatasetConfig,
        records: &[PriceRecord],
        rng: R,
    ) -> Result<Self, DatasetError> {
        Self::build(config, records, rng, None)
    }

    #[instrument(skip(config, records, rng), fields(symbol = %config.symbol))]
    fn build(
        config: &DatasetConfig,
        records: &[PriceRecord],
        rng: R,
        seed: Option<u64>,
    ) -> Result<Self, DatasetError> {
        config.validate_construction()?;

        if let Some(index) = first_out_of_order(records) {
            warn!(
                "Record {} is dated before its predecessor; records are expected oldest first",
                index
            );
        }

        let series = flatten_prices(records, config.close_price_only)?;
        let chunks = chunk_series(&series, config.input_size)?;
        debug!("Chunked {} values into {:?}", series.len(), chunks.dim());

        if chunks.nrows() <= config.num_steps {
            return Err(DatasetError::InsufficientData {
                got: chunks.nrows(),
                required: config.num_steps + 1,
                context: format!(
                    "{} chunks of {} values cannot fill a window of {} steps plus a target",
                    chunks.nrows(),
                    config.input_size,
                    config.num_steps
                ),
            });
        }

        let (chunks, anchors) = normalize_chunks(chunks, config.normalized)?;
        let samples = window_chunks(&chunks, config.num_steps)?;
        let (train, test) = split_samples(&samples, config.test_ratio)?;

        if train.is_empty() {
            warn!(
                "Train set is empty ({} samples, test ratio {}); epochs will yield no batches",
                samples.len(),
                config.test_ratio
            );
        }

        let dataset = Self {
            symbol: config.symbol.clone(),
            input_size: config.input_size,
            num_steps: config.num_steps,
            chunks,
            anchors,
            train,
            test,
            seed,
            rng,
        };
        info!("{}", dataset);
        Ok(dataset)
    }

    /**
    Plan one epoch over the train set.

    The batch order is a fresh permutation drawn from the dataset's random source, so successive
    epochs differ while two datasets built with the same seed produce the same first epoch.

    ## Arguments
    * `batch_size` - Samples per batch, at least 1. The last batch may be shorter.

    ## Returns
    A finite iterator of batches, or `InvalidConfiguration` if `batch_size` is zero.
     */
    pub fn generate_one_epoch(&mut self, batch_size: usize) -> Result<Epoch<'_>, DatasetError> {
        Epoch::new(&self.train, batch_size, self.num_steps, &mut self.rng)
    }
}

impl<R> WindowedSeriesDataset<R> {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// The chunk sequence samples are drawn from, normalized if enabled.
    pub fn chunks(&self) -> ArrayView2<'_, f64> {
        self.chunks.view()
    }

    pub fn anchors(&self) -> Option<&RatioAnchors> {
        self.anchors.as_ref()
    }

    pub fn train(&self) -> &SampleSet {
        &self.train
    }

    pub fn test(&self) -> &SampleSet {
        &self.test
    }

    pub fn train_len(&self) -> usize {
        self.train.len()
    }

    pub fn test_len(&self) -> usize {
        self.test.len()
    }

    /// Seed of the built-in random source; `None` when the source was injected.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn num_batches(&self, batch_size: usize) -> usize {
        num_batches(self.train.len(), batch_size)
    }

    /// Chunk index of the target of `sample_index`, counting train samples then test samples.
    pub fn target_chunk_index(&self, sample_index: usize) -> usize {
        sample_index + self.num_steps
    }

    /**
    Map values in the space of chunk `chunk_index` back to prices.

    With normalization disabled the values are returned unchanged. Predicted targets for sample
    `i` belong to chunk [`WindowedSeriesDataset::target_chunk_index`]`(i)`.
     */
    pub fn denormalize(&self, chunk_index: usize, values: ArrayView1<f64>) -> Option<Array1<f64>> {
        match &self.anchors {
            Some(anchors) => anchors.denormalize(chunk_index, values),
            None if chunk_index < self.chunks.nrows() => Some(values.to_owned()),
            None => None,
        }
    }

    pub fn info(&self) -> String {
        self.to_string()
    }
}

impl<R> fmt::Display for WindowedSeriesDataset<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WindowedSeriesDataset [{}] train: {} test: {}",
            self.symbol,
            self.train.len(),
            self.test.len()
        )
    }
}

fn clock_seed() -> u64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros()) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfigBuilder;
    use ndarray::array;

    fn records(n: usize) -> Vec<PriceRecord> {
        (1..=n).map(|v| PriceRecord::new(v as f64)).collect()
    }

    fn config(num_steps: usize, normalized: bool) -> DatasetConfig {
        DatasetConfigBuilder::default()
            .symbol("TEST")
            .input_size(1)
            .num_steps(num_steps)
            .test_ratio(0.2)
            .normalized(normalized)
            .seed(42)
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_raw_scenario() {
        let dataset = WindowedSeriesDataset::new(&config(2, false), &records(10)).unwrap();
        assert_eq!(dataset.train_len(), 6);
        assert_eq!(dataset.test_len(), 2);
        assert_eq!(dataset.info(), "WindowedSeriesDataset [TEST] train: 6 test: 2");
        assert_eq!(dataset.seed(), Some(42));

        let (history, target) = dataset.test().get(1).unwrap();
        assert_eq!(history, array![[8.0], [9.0]]);
        assert_eq!(target, array![10.0]);
    }

    #[test]
    fn test_build_normalized_scenario() {
        let dataset = WindowedSeriesDataset::new(&config(2, true), &records(10)).unwrap();
        let chunks = dataset.chunks();
        assert_eq!(chunks[[0, 0]], 0.0);
        assert_eq!(chunks[[1, 0]], 1.0);
        assert_eq!(chunks[[2, 0]], 0.5);

        let (history, target) = dataset.train().get(0).unwrap();
        assert_eq!(history, array![[0.0], [1.0]]);
        assert_eq!(target, array![0.5]);
    }

    #[test]
    fn test_insufficient_data() {
        let result = WindowedSeriesDataset::new(&config(3, false), &records(3));
        assert!(matches!(
            result,
            Err(DatasetError::InsufficientData {
                got: 3,
                required: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_config_fails_before_data() {
        let mut bad = config(2, true);
        bad.num_steps = 0;
        // Even an unusable series reports the configuration problem first
        let result = WindowedSeriesDataset::new(&bad, &[PriceRecord::new(0.0)]);
        assert!(matches!(
            result,
            Err(DatasetError::InvalidConfiguration {
                parameter: "num-steps",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_anchor_fails_construction() {
        let mut prices = records(6);
        prices[2].close = 0.0;
        let result = WindowedSeriesDataset::new(&config(2, true), &prices);
        assert!(matches!(
            result,
            Err(DatasetError::NormalizationError { chunk_index: 3, .. })
        ));
    }

    #[test]
    fn test_open_and_close_series() {
        let prices: Vec<PriceRecord> = (1..=5)
            .map(|v| PriceRecord::with_open(v as f64, v as f64 + 0.5))
            .collect();
        let mut cfg = config(2, false);
        cfg.close_price_only = false;
        cfg.input_size = 2;
        let dataset = WindowedSeriesDataset::new(&cfg, &prices).unwrap();
        assert_eq!(dataset.chunks().dim(), (5, 2));
        assert_eq!(dataset.train_len() + dataset.test_len(), 3);
        let (_, target) = dataset.train().get(0).unwrap();
        assert_eq!(target, array![3.0, 3.5]);
    }

    #[test]
    fn test_successive_epochs_reshuffle() {
        let mut dataset = WindowedSeriesDataset::new(&config(2, false), &records(200)).unwrap();
        let first = dataset.generate_one_epoch(4).unwrap().remaining_order().to_vec();
        let second = dataset.generate_one_epoch(4).unwrap().remaining_order().to_vec();
        assert_eq!(first.len(), dataset.num_batches(4));
        assert_ne!(first, second);
    }

    #[test]
    fn test_injected_rng() {
        let rng = ChaCha8Rng::seed_from_u64(42);
        let mut injected = WindowedSeriesDataset::with_rng(&config(2, false), &records(50), rng).unwrap();
        let mut seeded = WindowedSeriesDataset::new(&config(2, false), &records(50)).unwrap();
        assert_eq!(injected.seed(), None);
        assert_eq!(
            injected.generate_one_epoch(3).unwrap().remaining_order(),
            seeded.generate_one_epoch(3).unwrap().remaining_order()
        );
    }

    #[test]
    fn test_denormalize_target() {
        let dataset = WindowedSeriesDataset::new(&config(2, true), &records(10)).unwrap();
        let (_, target) = dataset.train().get(4).unwrap();
        let prices = dataset
            .denormalize(dataset.target_chunk_index(4), target)
            .unwrap();
        assert!((prices[0] - 7.0).abs() < 1e-9);

        let raw = WindowedSeriesDataset::new(&config(2, false), &records(10)).unwrap();
        let (_, target) = raw.train().get(4).unwrap();
        assert_eq!(raw.denormalize(raw.target_chunk_index(4), target), Some(array![7.0]));
        assert!(raw.denormalize(10, target).is_none());
    }
}
