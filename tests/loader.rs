use std::io::Write;

use chrono::NaiveDate;
use tempfile::NamedTempFile;
use windowed_series::{
    data::loader::load_price_records, error::DatasetError, util::test_util::setup_test_tracing,
    DatasetConfig, WindowedSeriesDataset,
};

fn csv_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_newest_first_export_is_sorted() {
    let _guards = setup_test_tracing("newest_first_export_is_sorted");
    let file = csv_file(
        "\u{feff}Date,Open,High,Low,Close,Volume\n\
         9-Feb-18,157.07,157.89,150.24,156.41,70672608\n\
         8-Feb-18,160.29,161.00,155.03,155.15,54390516\n\
         7-Feb-18,163.09,163.40,159.07,159.54,51608580\n",
    );
    let records = load_price_records(file.path()).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2018, 2, 7));
    assert_eq!(records[0].close, 159.54);
    assert_eq!(records[2].open, Some(157.07));
    assert_eq!(records[2].close, 156.41);
}

#[test]
fn test_undated_rows_keep_file_order() {
    let file = csv_file("Open,Close\n1,2\n3,4\n-,5\n");
    let records = load_price_records(file.path()).unwrap();
    let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
    assert_eq!(closes, vec![2.0, 4.0, 5.0]);
    assert_eq!(records[2].open, None);
    assert!(records.iter().all(|r| r.date.is_none()));
}

#[test]
fn test_missing_close_column() {
    let file = csv_file("Date,Open\n2024-01-01,1.0\n");
    let result = load_price_records(file.path());
    assert!(matches!(result, Err(DatasetError::MissingColumn(_))));
}

#[test]
fn test_bad_close_value() {
    let file = csv_file("Date,Close\n2024-01-01,1.0\n2024-01-02,n/a\n");
    let result = load_price_records(file.path());
    assert!(matches!(
        result,
        Err(DatasetError::ParseError { row: 1, .. })
    ));
}

#[test]
fn test_missing_file() {
    let result = load_price_records("does/not/exist.csv");
    assert!(matches!(result, Err(DatasetError::CsvError(_))));
}

#[test]
fn test_csv_to_dataset() {
    let mut content = String::from("Date,Open,Close\n");
    for day in (1..=28).rev() {
        content.push_str(&format!("2024-02-{:02},{}.0,{}.5\n", day, day, day));
    }
    let file = csv_file(&content);
    let records = load_price_records(file.path()).unwrap();

    let config = DatasetConfig {
        symbol: "CSV".to_string(),
        input_size: 1,
        num_steps: 3,
        test_ratio: 0.25,
        normalized: false,
        seed: Some(8),
        ..Default::default()
    };
    let dataset = WindowedSeriesDataset::new(&config, &records).unwrap();
    assert_eq!(dataset.info(), "WindowedSeriesDataset [CSV] train: 18 test: 7");
    let (history, target) = dataset.train().get(0).unwrap();
    assert_eq!(history[[0, 0]], 1.5);
    assert_eq!(target[0], 4.5);
}
