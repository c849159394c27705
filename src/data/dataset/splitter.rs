use tracing::debug;

use crate::{config::validate_test_ratio, error::DatasetError};

use super::windower::SampleSet;

/// Number of leading samples that go to the train set.
pub fn train_count(total: usize, test_ratio: f64) -> Result<usize, DatasetError> {
    validate_test_ratio(test_ratio)?;
    let count = (total as f64 * (1.0 - test_ratio)).floor() as usize;
    Ok(count.min(total))
}

/**
Split samples by index order into a train set and a test set.

The first `floor(total * (1 - test_ratio))` samples form the train set and the rest the test
set. No shuffling happens here.

## Returns
`(train, test)`, or `InvalidConfiguration` if `test_ratio` is not in `[0, 1)`.
 */
pub fn split_samples(
    samples: &SampleSet,
    test_ratio: f64,
) -> Result<(SampleSet, SampleSet), DatasetError> {
    let total = samples.len();
    let train_end = train_count(total, test_ratio)?;
    debug!(
        "Dataset split: {} train, {} test (test ratio {})",
        train_end,
        total - train_end,
        test_ratio
    );
    Ok((samples.subset(0..train_end), samples.subset(train_end..total)))
}
