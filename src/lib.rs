pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod util;

pub use config::DatasetConfig;
pub use data::dataset::WindowedSeriesDataset;
pub use error::DatasetError;
