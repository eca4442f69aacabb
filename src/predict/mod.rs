//! Prediction against trained cohort models

pub mod inference;

pub use inference::{format_prediction, Predictor};
