//! Per-cohort training and evaluation

pub mod metrics;
pub mod trainer;

pub use metrics::{ClassReport, EvalReport};
pub use trainer::{train_all, CohortReport, TrainingOutcome};
