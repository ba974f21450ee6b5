pub mod prediction_pipeline;

pub use prediction_pipeline::PredictionPipeline;
