pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::pipelines::PredictionPipeline;
pub use config::{cli::LocalStorage, toml_config::TomlConfig, ApiCredentials};
pub use core::engine::PredictionEngine;
pub use utils::error::{PredictionError, Result};
