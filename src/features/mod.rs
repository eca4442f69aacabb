//! Feature schema and fighter statistic aggregation

pub mod profile;
pub mod schema;

pub use profile::FighterProfile;
pub use schema::{FeatureColumn, FeatureSchema};
