use std::iter::FusedIterator;

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};
use rand::{seq::SliceRandom, Rng};
use tracing::{debug, error};

use crate::error::DatasetError;

use super::windower::SampleSet;

/// Number of batches needed to cover `len` samples, the last one possibly short.
pub fn num_batches(len: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    len.div_ceil(batch_size)
}

/// One mini-batch of consecutive training samples.
#[derive(Debug, Clone)]
pub struct Batch<'a> {
    index: usize,
    history: ArrayView3<'a, f64>,
    targets: ArrayView2<'a, f64>,
}

impl<'a> Batch<'a> {
    /// Position of this batch in the unshuffled train set.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Shape `(batch, num_steps, input_size)`.
    pub fn history(&self) -> ArrayView3<'a, f64> {
        self.history
    }

    /// Shape `(batch, input_size)`.
    pub fn targets(&self) -> ArrayView2<'a, f64> {
        self.targets
    }

    pub fn len(&self) -> usize {
        self.history.dim().0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_arrays(&self) -> (Array3<f64>, Array2<f64>) {
        (self.history.to_owned(), self.targets.to_owned())
    }
}

/**
A single pass over the train set, batch by batch in a shuffled batch order.

The samples inside a batch keep their temporal order; only the order in which batches are
visited is permuted. An epoch yields exactly `num_batches` items and stops early after the
first error.
 */
#[derive(Debug)]
pub struct Epoch<'a> {
    samples: &'a SampleSet,
    batch_size: usize,
    num_steps: usize,
    order: std::vec::IntoIter<usize>,
    failed: bool,
}

impl<'a> Epoch<'a> {
    /**
    Plan an epoch over `samples`.

    ## Arguments
    * `samples` - The train set.
    * `batch_size` - Samples per batch, at least 1.
    * `num_steps` - Expected history length of every sample.
    * `rng` - Random source used to permute the batch order.
     */
    pub fn new<R: Rng + ?Sized>(
        samples: &'a SampleSet,
        batch_size: usize,
        num_steps: usize,
        rng: &mut R,
    ) -> Result<Self, DatasetError> {
        if batch_size < 1 {
            return Err(DatasetError::invalid(
                "batch-size",
                format!("must be at least 1, got {}", batch_size),
            ));
        }

        let mut order: Vec<usize> = (0..num_batches(samples.len(), batch_size)).collect();
        order.shuffle(rng);
        debug!(
            "Planned epoch of {} batches over {} samples",
            order.len(),
            samples.len()
        );

        Ok(Self {
            samples,
            batch_size,
            num_steps,
            order: order.into_iter(),
            failed: false,
        })
    }

    /// Batch indices not yet yielded, in the order they will be visited.
    pub fn remaining_order(&self) -> &[usize] {
        self.order.as_slice()
    }
}

impl<'a> Iterator for Epoch<'a> {
    type Item = Result<Batch<'a>, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let index = self.order.next()?;
        let start = index * self.batch_size;
        let (history, targets) = self.samples.slice(start..start + self.batch_size);

        let found = history.dim().1;
        if found != self.num_steps || targets.nrows() != history.dim().0 {
            error!(
                "Batch {} has histories of {} steps, expected {}",
                index, found, self.num_steps
            );
            self.failed = true;
            return Some(Err(DatasetError::InconsistentBatchError {
                batch_index: index,
                expected: self.num_steps,
                found,
            }));
        }

        Some(Ok(Batch {
            index,
            history,
            targets,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.failed { 0 } else { self.order.len() };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Epoch<'_> {}

impl FusedIterator for Epoch<'_> {}
