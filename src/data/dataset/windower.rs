use std::ops::Range;

use ndarray::{s, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, ErrorKind, ShapeError};
use tracing::debug;

use crate::error::DatasetError;

/**
Ordered (history, target) samples.

`history` has shape `(samples, num_steps, input_size)` and `targets` has shape
`(samples, input_size)`. Row `i` of both belongs to the same sample.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    history: Array3<f64>,
    targets: Array2<f64>,
}

impl SampleSet {
    pub fn new(history: Array3<f64>, targets: Array2<f64>) -> Result<Self, DatasetError> {
        let (samples, _, input_size) = history.dim();
        if targets.dim() != (samples, input_size) {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
        }
        Ok(Self { history, targets })
    }

    pub fn len(&self) -> usize {
        self.history.dim().0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_steps(&self) -> usize {
        self.history.dim().1
    }

    pub fn input_size(&self) -> usize {
        self.history.dim().2
    }

    pub fn history(&self) -> ArrayView3<'_, f64> {
        self.history.view()
    }

    pub fn targets(&self) -> ArrayView2<'_, f64> {
        self.targets.view()
    }

    /// The history window and target of sample `index`.
    pub fn get(&self, index: usize) -> Option<(ArrayView2<'_, f64>, ArrayView1<'_, f64>)> {
        if index >= self.len() {
            return None;
        }
        Some((
            self.history.slice(s![index, .., ..]),
            self.targets.row(index),
        ))
    }

    /// Views of the samples in `range`, clamped to the set.
    pub fn slice(&self, range: Range<usize>) -> (ArrayView3<'_, f64>, ArrayView2<'_, f64>) {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        (
            self.history.slice(s![start..end, .., ..]),
            self.targets.slice(s![start..end, ..]),
        )
    }

    /// Copies the samples in `range` into a new set.
    pub fn subset(&self, range: Range<usize>) -> Self {
        let (history, targets) = self.slice(range);
        Self {
            history: history.to_owned(),
            targets: targets.to_owned(),
        }
    }
}

/**
Slide a window of `num_steps` chunks over the chunk sequence with stride 1.

Sample `i` has history `chunks[i..i + num_steps]` and target `chunks[i + num_steps]`, giving
`max(0, chunks.nrows() - num_steps)` samples in temporal order.

## Arguments
* `chunks` - The (normalized) chunk matrix, one chunk per row.
* `num_steps` - Window length, at least 1.
 */
pub fn window_chunks(chunks: &Array2<f64>, num_steps: usize) -> Result<SampleSet, DatasetError> {
    if num_steps < 1 {
        return Err(DatasetError::invalid(
            "num-steps",
            format!("must be at least 1, got {}", num_steps),
        ));
    }

    let (num_chunks, input_size) = chunks.dim();
    let samples = num_chunks.saturating_sub(num_steps);

    let history = Array3::from_shape_fn((samples, num_steps, input_size), |(i, step, col)| {
        chunks[[i + step, col]]
    });
    let targets = if samples > 0 {
        chunks.slice(s![num_steps.., ..]).to_owned()
    } else {
        Array2::zeros((0, input_size))
    };

    debug!(
        "Windowed {} chunks into {} samples of {} steps",
        num_chunks, samples, num_steps
    );

    SampleSet::new(history, targets)
}
