//! Fraud detection pipeline: load, prepare, detect, evaluate

mod config;
mod runner;

pub use config::PipelineConfig;
pub use runner::{
    extract_labels, remap_prediction, run_isolation_forest, AnomalyPipeline, PipelineResult,
    RunSummary,
};
