use std::{
    fs::File,
    io::{BufReader, Write as _},
    path::{Path, PathBuf},
};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_yaml::from_reader;
use tracing::{debug, info, instrument};

use crate::error::DatasetError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Builder)]
#[serde(default)]
#[builder(default)]
pub struct DatasetConfig {
    #[builder(setter(into))]
    pub symbol: String,
    #[serde(rename = "input-size")]
    pub input_size: usize,
    #[serde(rename = "num-steps")]
    pub num_steps: usize,
    #[serde(rename = "test-ratio")]
    pub test_ratio: f64,
    pub normalized: bool,
    #[serde(rename = "close-price-only")]
    pub close_price_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(setter(strip_option))]
    pub seed: Option<u64>,
    #[serde(rename = "batch-size")]
    pub batch_size: usize,
    pub epochs: usize,
    #[serde(rename = "data-dir")]
    #[builder(setter(into))]
    pub data_dir: String,
}

const DEFAULT_DATA: &str = r#"
symbol: "AAPL"
input-size: 1
num-steps: 30
test-ratio: 0.1
normalized: true
close-price-only: true
batch-size: 64
epochs: 1
data-dir: "data"
"#;

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            symbol: "AAPL".to_string(),
            input_size: 1,
            num_steps: 30,
            test_ratio: 0.1,
            normalized: true,
            close_price_only: true,
            seed: None,
            batch_size: 64,
            epochs: 1,
            data_dir: "data".to_string(),
        }
    }
}

impl DatasetConfig {
    /// Reads the configuration from a YAML file.
    ///
    /// If the file does not exist, it creates a default configuration file.
    ///
    /// # Arguments
    ///
    /// * `filename` - Optional path to the configuration file.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `DatasetConfig` on success or an `Error` on failure.
    #[instrument(level = "info", skip(filename))]
    pub fn read_config<P: AsRef<Path>>(filename: Option<P>) -> Result<Self, DatasetError> {
        let path = filename
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(|| Path::new("config.yml").to_path_buf());

        info!(path = %path.display(), "Reading configuration");

        if !path.exists() {
            info!(
                "Config file does not exist. Creating default config at {}",
                path.display()
            );
            let mut file = File::create(&path)?;
            file.write_all(DEFAULT_DATA.as_bytes())?;
            debug!("Default configuration file created");
            return Ok(DatasetConfig::default());
        }

        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        let config: Self = from_reader(reader)?;
        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Checks every parameter, including those only used when iterating epochs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` naming the first offending parameter.
    pub fn validate(&self) -> Result<(), DatasetError> {
        self.validate_construction()?;
        if self.batch_size < 1 {
            return Err(DatasetError::invalid(
                "batch-size",
                format!("must be at least 1, got {}", self.batch_size),
            ));
        }
        Ok(())
    }

    /// Checks only the parameters that shape the dataset itself.
    pub fn validate_construction(&self) -> Result<(), DatasetError> {
        if self.input_size < 1 {
            return Err(DatasetError::invalid(
                "input-size",
                format!("must be at least 1, got {}", self.input_size),
            ));
        }
        if self.num_steps < 1 {
            return Err(DatasetError::invalid(
                "num-steps",
                format!("must be at least 1, got {}", self.num_steps),
            ));
        }
        validate_test_ratio(self.test_ratio)
    }

    /// Location of the price history for the configured symbol.
    pub fn data_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(format!("{}.csv", self.symbol))
    }
}

pub(crate) fn validate_test_ratio(test_ratio: f64) -> Result<(), DatasetError> {
    if !test_ratio.is_finite() || !(0.0..1.0).contains(&test_ratio) {
        return Err(DatasetError::invalid(
            "test-ratio",
            format!("must be in [0, 1), got {}", test_ratio),
        ));
    }
    Ok(())
}
