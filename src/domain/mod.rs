// Domain layer: models and ports implemented by adapters and pipelines.

pub mod model;
pub mod ports;
