pub mod consensus;
pub mod engine;
pub mod export;
pub mod formula;
pub mod prompts;
pub mod ranking;
pub mod structure;
pub mod viewer;

pub use crate::domain::model::{PredictionReport, RunOutcome, Shortlist};
pub use crate::domain::ports::{ConfigProvider, FormulaAdvisor, MaterialsDatabase, Pipeline, Storage};
pub use crate::utils::error::Result;
