use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info, instrument, warn};

use crate::{data::price_record::PriceRecord, error::DatasetError};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%b-%y", "%d-%b-%Y", "%m/%d/%Y"];

/**
Load price records from a CSV file with `Close` and optional `Open`/`Date` columns.

Quote exports are usually newest first, so when every row has a parseable date the records are
sorted into chronological ascending order. Otherwise the file order is kept as is.

## Arguments
* `path` - Path of the CSV file.

## Returns
The records, or an error if the file cannot be read, the `Close` column is missing, or a price
cannot be parsed.
 */
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn load_price_records<P: AsRef<Path>>(path: P) -> Result<Vec<PriceRecord>, DatasetError> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let headers = reader.headers()?.clone();

    let close_idx =
        find_column(&headers, "close").ok_or_else(|| DatasetError::MissingColumn("Close".to_string()))?;
    let open_idx = find_column(&headers, "open");
    let date_idx = find_column(&headers, "date");
    debug!(?close_idx, ?open_idx, ?date_idx, "Resolved CSV columns");

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let close = parse_price(record.get(close_idx), "close", row)?.ok_or_else(|| {
            DatasetError::ParseError {
                value_name: "close".to_string(),
                row,
            }
        })?;
        let open = match open_idx {
            Some(idx) => parse_price(record.get(idx), "open", row)?,
            None => None,
        };
        let date = date_idx.and_then(|idx| record.get(idx)).and_then(parse_date);
        records.push(PriceRecord { date, open, close });
    }

    if !records.is_empty() && records.iter().all(|r| r.date.is_some()) {
        records.sort_by_key(|r| r.date);
    } else if date_idx.is_some() {
        warn!("Not every row has a parseable date; keeping file order");
    }

    info!("Loaded {} price records", records.len());
    Ok(records)
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
}

/// Empty cells and `-` are treated as missing values.
fn parse_price(field: Option<&str>, value_name: &str, row: usize) -> Result<Option<f64>, DatasetError> {
    let field = match field.map(str::trim) {
        None | Some("") | Some("-") => return Ok(None),
        Some(field) => field,
    };
    field
        .parse::<f64>()
        .map(Some)
        .map_err(|_| DatasetError::ParseError {
            value_name: value_name.to_string(),
            row,
        })
}

fn parse_date(field: &str) -> Option<NaiveDate> {
    let field = field.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(field, format).ok())
}
