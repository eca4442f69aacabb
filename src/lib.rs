//! UFC fight outcome prediction using per-cohort random forests
//!
//! Historical bout records are partitioned into (weight class, gender) cohorts
//! and each cohort gets its own independently trained winner, method and round
//! classifiers.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::model::forest::RankedFeature;

/// Gender division of a bout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gender {
    Men,
    Women,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Men => write!(f, "Men"),
            Gender::Women => write!(f, "Women"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "men" => Ok(Gender::Men),
            "women" => Ok(Gender::Women),
            _ => Err(format!("Unknown gender: {}. Use Men or Women.", s)),
        }
    }
}

/// Which corner a fighter occupies in a historical record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    First,
    Second,
}

impl Side {
    /// Column-name prefix that marks a statistic as belonging to this side
    pub fn prefix(&self) -> &'static str {
        match self {
            Side::First => "F1",
            Side::Second => "F2",
        }
    }

    /// Display label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Side::First => "Fighter1",
            Side::Second => "Fighter2",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Identifies one (weight class, gender) training cohort
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CohortKey {
    pub weight_class: String,
    pub gender: Gender,
}

impl CohortKey {
    pub fn new(weight_class: impl Into<String>, gender: Gender) -> Self {
        CohortKey {
            weight_class: weight_class.into(),
            gender,
        }
    }
}

impl fmt::Display for CohortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.weight_class, self.gender)
    }
}

/// A single historical bout row
///
/// Identity, bout text and outcome fields are parsed out of their named
/// columns; every other column survives as raw cell text in `values`, keyed by
/// header name. Records are never mutated after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub fighter1: String,
    pub fighter2: String,
    /// Free-text bout description, e.g. "UFC Women's Flyweight Title Bout"
    pub bout: String,
    /// Weight class token derived from the bout text, when one matched
    pub weight_class: Option<String>,
    pub gender: Gender,
    /// 1 = first-listed fighter won, 0 = second-listed
    pub winner: Option<u8>,
    pub method: Option<String>,
    pub round: Option<u32>,
    /// Remaining raw cells keyed by column header
    pub values: HashMap<String, String>,
}

impl MatchRecord {
    /// Name of the fighter on the given side
    pub fn fighter(&self, side: Side) -> &str {
        match side {
            Side::First => &self.fighter1,
            Side::Second => &self.fighter2,
        }
    }

    /// Check whether the named fighter appeared on the given side
    pub fn has_fighter(&self, name: &str, side: Side) -> bool {
        self.fighter(side) == name
    }

    /// Cohort this record belongs to, if its weight class could be derived
    pub fn cohort_key(&self) -> Option<CohortKey> {
        self.weight_class
            .as_ref()
            .map(|w| CohortKey::new(w.clone(), self.gender))
    }

    /// Winning side, if the outcome is recorded
    pub fn winner_side(&self) -> Option<Side> {
        self.winner
            .map(|w| if w == 1 { Side::First } else { Side::Second })
    }

    /// Raw cell text for a column, if present
    pub fn value(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(|s| s.as_str())
    }
}

/// Prediction output for one hypothetical bout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FightPrediction {
    pub fighter1: String,
    pub fighter2: String,
    pub cohort: CohortKey,
    /// Predicted winning side
    pub winner: Side,
    /// Predicted method of victory, when a method model was available
    pub method: Option<String>,
    /// Predicted finishing round or "Decision", when a round model was available
    pub round: Option<String>,
    /// Ranked top features of the cohort's winner model, frozen at training time
    pub top_features: Vec<RankedFeature>,
}

impl FightPrediction {
    /// Name of the predicted winner
    pub fn winner_name(&self) -> &str {
        match self.winner {
            Side::First => &self.fighter1,
            Side::Second => &self.fighter2,
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum FightError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Non-numeric value '{value}' in feature column '{column}' for cohort {cohort}")]
    DataValidation {
        cohort: CohortKey,
        column: String,
        value: String,
    },

    #[error("Training error: {0}")]
    Training(String),

    #[error("No model for cohort {0}")]
    NoCohortModel(CohortKey),

    #[error("No trained models found in {0} - run `octagon train` first")]
    NoModels(String),

    #[error("Schema mismatch: model expects {expected} features, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, FightError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub dataset_path: String,
    pub model_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of trees in each random forest
    pub n_trees: usize,
    /// Optional depth cap per tree; unlimited when absent
    pub max_depth: Option<usize>,
    /// Fraction of each cohort held out for evaluation
    pub holdout_fraction: f64,
    /// Seed for the holdout shuffle and bootstrap sampling
    pub seed: u64,
    /// Cohorts smaller than this are skipped
    pub min_cohort_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                dataset_path: "data/fight_totals_preprocessed.csv".to_string(),
                model_dir: "models".to_string(),
            },
            training: TrainingConfig {
                n_trees: 100,
                max_depth: None,
                holdout_fraction: 0.2,
                seed: 42,
                min_cohort_size: 20,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FightError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| FightError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FightError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parsing() {
        assert_eq!("men".parse::<Gender>().unwrap(), Gender::Men);
        assert_eq!("Women".parse::<Gender>().unwrap(), Gender::Women);
        assert!("other".parse::<Gender>().is_err());
    }

    #[test]
    fn test_winner_side() {
        let mut record = MatchRecord {
            fighter1: "A".to_string(),
            fighter2: "B".to_string(),
            bout: "Lightweight Bout".to_string(),
            weight_class: Some("Lightweight".to_string()),
            gender: Gender::Men,
            winner: Some(1),
            method: None,
            round: None,
            values: HashMap::new(),
        };
        assert_eq!(record.winner_side(), Some(Side::First));
        assert_eq!(record.fighter(Side::Second), "B");

        record.winner = Some(0);
        assert_eq!(record.winner_side(), Some(Side::Second));
    }

    #[test]
    fn test_cohort_key_display() {
        let key = CohortKey::new("Flyweight", Gender::Women);
        assert_eq!(key.to_string(), "Flyweight, Women");
    }

    #[test]
    fn test_default_config_constants() {
        let config = Config::default();
        assert_eq!(config.training.n_trees, 100);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.training.min_cohort_size, 20);
        assert!((config.training.holdout_fraction - 0.2).abs() < f64::EPSILON);
    }
}
