use ndarray::Array2;
use tracing::debug;

use crate::error::DatasetError;

/**
Group the raw series into non-overlapping chunks of `input_size` consecutive values.

The result has `floor(series.len() / input_size)` rows of `input_size` columns. Trailing values
that do not fill a whole chunk are dropped.

## Arguments
* `series` - The flattened raw price series.
* `input_size` - Number of values per chunk, at least 1.

## Returns
The chunk matrix, or `InvalidConfiguration` if `input_size` is zero.
 */
pub fn chunk_series(series: &[f64], input_size: usize) -> Result<Array2<f64>, DatasetError> {
    if input_size < 1 {
        return Err(DatasetError::invalid(
            "input-size",
            format!("must be at least 1, got {}", input_size),
        ));
    }

    let num_chunks = series.len() / input_size;
    let used = num_chunks * input_size;
    if used < series.len() {
        debug!(
            "Dropping {} trailing values that do not fill a chunk of {}",
            series.len() - used,
            input_size
        );
    }

    let chunks = Array2::from_shape_vec((num_chunks, input_size), series[..used].to_vec())?;
    Ok(chunks)
}
