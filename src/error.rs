#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Invalid configuration for {parameter}: {reason}")]
    InvalidConfiguration {
        parameter: &'static str,
        reason: String,
    },
    #[error("Insufficient data: got {got}, required {required}. {context}")]
    InsufficientData {
        got: usize,
        required: usize,
        context: String,
    },
    #[error("Anchor value {anchor} for chunk {chunk_index} cannot be used for normalization.")]
    NormalizationError { chunk_index: usize, anchor: f64 },
    #[error("Inconsistent batch {batch_index}: expected {expected} steps per history, found {found}.")]
    InconsistentBatchError {
        batch_index: usize,
        expected: usize,
        found: usize,
    },
    #[error("Record {index} has no open price but close-price-only is disabled.")]
    MissingOpenPrice { index: usize },
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Failed to parse value {value_name} at row {row}.")]
    ParseError { value_name: String, row: usize },
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV Error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Serde YAML Error: {0}")]
    SerdeYamlError(#[from] serde_yaml::Error),
    #[error("Shape Error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),
}

impl DatasetError {
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        DatasetError::InvalidConfiguration {
            parameter,
            reason: reason.into(),
        }
    }
}
