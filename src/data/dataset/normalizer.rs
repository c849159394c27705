use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::error::DatasetError;

/**
Anchors used to rescale each chunk into return space.

Chunk 0 is anchored on its own first value; chunk `i >= 1` is anchored on the last value of the
raw chunk `i - 1`. Every normalized value is `raw / anchor - 1`.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct RatioAnchors {
    anchors: Vec<f64>,
}

impl RatioAnchors {
    /// Computes the anchor of every chunk, failing on the first zero anchor.
    pub fn from_chunks(chunks: &Array2<f64>) -> Result<Self, DatasetError> {
        let last_col = chunks.ncols().saturating_sub(1);
        let anchors = (0..chunks.nrows())
            .map(|i| {
                let anchor = if i == 0 {
                    chunks[[0, 0]]
                } else {
                    chunks[[i - 1, last_col]]
                };
                if anchor == 0.0 {
                    Err(DatasetError::NormalizationError {
                        chunk_index: i,
                        anchor,
                    })
                } else {
                    Ok(anchor)
                }
            })
            .collect::<Result<Vec<f64>, DatasetError>>()?;
        Ok(Self { anchors })
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn get(&self, chunk_index: usize) -> Option<f64> {
        self.anchors.get(chunk_index).copied()
    }

    pub fn normalize(&self, chunks: &Array2<f64>) -> Array2<f64> {
        let mut normalized = chunks.clone();
        for (mut row, &anchor) in normalized.axis_iter_mut(Axis(0)).zip(&self.anchors) {
            row.mapv_inplace(|v| v / anchor - 1.0);
        }
        normalized
    }

    /// Maps normalized values of `chunk_index` back to price space.
    pub fn denormalize(&self, chunk_index: usize, values: ArrayView1<f64>) -> Option<Array1<f64>> {
        let anchor = self.get(chunk_index)?;
        Some(values.mapv(|v| (v + 1.0) * anchor))
    }
}

/**
Apply ratio-to-previous-chunk normalization when `normalized` is set.

## Returns
The (possibly) rescaled chunks and the anchors used, `None` when normalization is disabled.
 */
pub fn normalize_chunks(
    chunks: Array2<f64>,
    normalized: bool,
) -> Result<(Array2<f64>, Option<RatioAnchors>), DatasetError> {
    if !normalized {
        return Ok((chunks, None));
    }
    let anchors = RatioAnchors::from_chunks(&chunks)?;
    let normalized = anchors.normalize(&chunks);
    Ok((normalized, Some(anchors)))
}
