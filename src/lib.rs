pub mod clients;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::{cli::LocalStorage, CliConfig};
pub use crate::core::etl::{RunReport, ScrapeEngine};
pub use crate::core::pipeline::ScrapePipeline;
pub use crate::utils::error::{Result, ScrapeError};
