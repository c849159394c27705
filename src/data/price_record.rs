use chrono::NaiveDate;
use derive_builder::Builder;

use crate::error::DatasetError;

/// One row of price history. Only the closing price is mandatory.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct PriceRecord {
    #[builder(default, setter(strip_option))]
    pub date: Option<NaiveDate>,
    #[builder(default, setter(strip_option))]
    pub open: Option<f64>,
    pub close: f64,
}

impl PriceRecord {
    pub fn new(close: f64) -> Self {
        Self {
            date: None,
            open: None,
            close,
        }
    }

    pub fn with_open(open: f64, close: f64) -> Self {
        Self {
            date: None,
            open: Some(open),
            close,
        }
    }
}

/**
Flatten price records into the raw series the dataset is built from.

With `close_price_only` the series is the closing prices in record order. Otherwise each record
contributes its opening then closing price, so the series is twice as long as the input.

## Arguments
* `records` - Price records in chronological ascending order.
* `close_price_only` - Whether to drop the opening prices.

## Returns
The flattened series, or `MissingOpenPrice` for the first record lacking an opening price.
 */
pub fn flatten_prices(
    records: &[PriceRecord],
    close_price_only: bool,
) -> Result<Vec<f64>, DatasetError> {
    if close_price_only {
        return Ok(records.iter().map(|r| r.close).collect());
    }

    let mut series = Vec::with_capacity(records.len() * 2);
    for (index, record) in records.iter().enumerate() {
        let open = record
            .open
            .ok_or(DatasetError::MissingOpenPrice { index })?;
        series.push(open);
        series.push(record.close);
    }
    Ok(series)
}

/// Index of the first record whose date precedes the one before it, if any.
pub(crate) fn first_out_of_order(records: &[PriceRecord]) -> Option<usize> {
    records
        .windows(2)
        .position(|pair| match (pair[0].date, pair[1].date) {
            (Some(prev), Some(next)) => next < prev,
            _ => false,
        })
        .map(|i| i + 1)
}
