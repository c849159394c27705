pub mod dataset;
pub mod loader;
pub mod price_record;
