pub mod cli;
pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod report;

pub use config::StoreConfig;
pub use error::Error;
pub use export::{ExportEngine, ExportOptions, ExportResult};
