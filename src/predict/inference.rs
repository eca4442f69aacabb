//! Model inference for hypothetical bouts
//!
//! Rebuilds a synthetic feature vector for two named fighters from their
//! historical side averages and queries the cohort's models. Inference is a
//! pure read: the store and the historical records are never mutated.

use crate::data::FightDataset;
use crate::features::FighterProfile;
use crate::model::store::ModelStore;
use crate::{CohortKey, FightError, FightPrediction, MatchRecord, Result, Side};

/// Predictor over a trained store and the historical record set
pub struct Predictor {
    store: ModelStore,
    records: Vec<MatchRecord>,
}

impl Predictor {
    pub fn new(store: ModelStore, records: Vec<MatchRecord>) -> Self {
        Predictor { store, records }
    }

    /// Load persisted models and pair them with the historical dataset
    pub fn load(model_dir: &str, dataset: FightDataset) -> Result<Self> {
        let store = ModelStore::load(model_dir)?;
        Ok(Predictor::new(store, dataset.into_records()))
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Predict the outcome of a bout between two named fighters in a cohort
    pub fn predict(
        &self,
        fighter1: &str,
        fighter2: &str,
        key: &CohortKey,
    ) -> Result<FightPrediction> {
        let set = self
            .store
            .get(key)
            .ok_or_else(|| FightError::NoCohortModel(key.clone()))?;
        let schema = &set.schema;

        let profile1 = FighterProfile::compute(&self.records, fighter1, Side::First, schema);
        let profile2 = FighterProfile::compute(&self.records, fighter2, Side::Second, schema);
        for profile in [&profile1, &profile2] {
            if profile.is_cold_start() {
                log::debug!(
                    "{} has no history as {}; using neutral stats",
                    profile.name(),
                    profile.side()
                );
            }
        }

        // Synthetic bout: each side's columns come from that fighter's
        // historical averages, unsided columns stay 0
        let row: Vec<f64> = schema
            .columns()
            .iter()
            .map(|column| match column.side {
                Some(Side::First) => profile1.get(&column.name),
                Some(Side::Second) => profile2.get(&column.name),
                None => 0.0,
            })
            .collect();

        let winner_label = set.winner.predict_label(&row)?;
        let winner = if winner_label == Side::First.label() {
            Side::First
        } else {
            Side::Second
        };

        let method = match &set.method {
            Some(model) => Some(model.predict_label(&row)?.to_string()),
            None => None,
        };
        let round = match &set.round {
            Some(model) => Some(model.predict_label(&row)?.to_string()),
            None => None,
        };

        Ok(FightPrediction {
            fighter1: fighter1.to_string(),
            fighter2: fighter2.to_string(),
            cohort: key.clone(),
            winner,
            method,
            round,
            top_features: set.importances.clone(),
        })
    }
}

/// Format a prediction for display
pub fn format_prediction(pred: &FightPrediction) -> String {
    let mut out = String::new();
    out.push_str("┌─────────────────────────────────────────────────┐\n");
    out.push_str(&format!(
        "│  {} vs {} ({})\n",
        pred.fighter1, pred.fighter2, pred.cohort
    ));
    out.push_str("├─────────────────────────────────────────────────┤\n");
    out.push_str(&format!(
        "│  Predicted winner:  {} ({})\n",
        pred.winner,
        pred.winner_name()
    ));
    if let Some(method) = &pred.method {
        out.push_str(&format!("│  Predicted method:  {}\n", method));
    }
    if let Some(round) = &pred.round {
        out.push_str(&format!("│  Predicted round:   {}\n", round));
    }
    if !pred.top_features.is_empty() {
        out.push_str("├─────────────────────────────────────────────────┤\n");
        out.push_str("│  Top features:\n");
        for (rank, feature) in pred.top_features.iter().enumerate() {
            out.push_str(&format!(
                "│  {:>2}. {:<32} {:.4}\n",
                rank + 1,
                feature.name,
                feature.importance
            ));
        }
    }
    out.push_str("└─────────────────────────────────────────────────┘");
    out
}
