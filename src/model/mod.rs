//! Classification models and their persistence

pub mod forest;
pub mod store;
pub mod tree;

pub use forest::{ForestParams, RandomForest, RankedFeature};
pub use store::{CohortModel, CohortModelSet, ModelStore};
pub use tree::DecisionTree;
