//! Dataset ingestion and cohort partitioning

pub mod cohort;
pub mod loader;

pub use cohort::CohortPartition;
pub use loader::FightDataset;
