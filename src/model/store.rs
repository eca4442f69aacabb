//! Persistence for trained cohort models
//!
//! The store is an in-memory map from cohort key to that cohort's model set,
//! written to disk as three JSON artifacts - one per model kind. The winner
//! artifact also carries the feature schema and ranked importances, so a
//! loaded store can never disagree with training about either. Method and
//! round artifacts are optional at load time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::features::FeatureSchema;
use crate::model::forest::{RandomForest, RankedFeature};
use crate::{CohortKey, FightError, Result};

/// Winner artifact file name (required at load time)
pub const WINNER_FILE: &str = "winner_models.json";
/// Method artifact file name (optional at load time)
pub const METHOD_FILE: &str = "method_models.json";
/// Round artifact file name (optional at load time)
pub const ROUND_FILE: &str = "round_models.json";

/// A forest plus the class labels its outputs index into
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortModel {
    pub forest: RandomForest,
    pub classes: Vec<String>,
}

impl CohortModel {
    /// Predict the class label for one feature row
    pub fn predict_label(&self, row: &[f64]) -> Result<&str> {
        if row.len() != self.forest.n_features() {
            return Err(FightError::SchemaMismatch {
                expected: self.forest.n_features(),
                actual: row.len(),
            });
        }
        Ok(&self.classes[self.forest.predict(row)])
    }
}

/// Everything trained for one cohort; replaced wholesale on retraining
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortModelSet {
    pub winner: CohortModel,
    pub method: Option<CohortModel>,
    pub round: Option<CohortModel>,
    /// The exact schema the models were trained with
    pub schema: FeatureSchema,
    /// Ranked winner-model feature importances, top 10
    pub importances: Vec<RankedFeature>,
}

#[derive(Serialize, Deserialize)]
struct WinnerEntry {
    key: CohortKey,
    model: CohortModel,
    schema: FeatureSchema,
    importances: Vec<RankedFeature>,
}

#[derive(Serialize, Deserialize)]
struct AuxEntry {
    key: CohortKey,
    model: CohortModel,
}

/// In-memory mapping from cohort key to trained models
#[derive(Debug, Default)]
pub struct ModelStore {
    sets: HashMap<CohortKey, CohortModelSet>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: CohortKey, set: CohortModelSet) {
        self.sets.insert(key, set);
    }

    pub fn get(&self, key: &CohortKey) -> Option<&CohortModelSet> {
        self.sets.get(key)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Cohort keys in sorted order
    pub fn keys(&self) -> Vec<&CohortKey> {
        let mut keys: Vec<&CohortKey> = self.sets.keys().collect();
        keys.sort();
        keys
    }

    /// Write the three model artifacts under `dir`
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut winner = Vec::new();
        let mut method = Vec::new();
        let mut round = Vec::new();
        for key in self.keys() {
            let set = &self.sets[key];
            winner.push(WinnerEntry {
                key: key.clone(),
                model: set.winner.clone(),
                schema: set.schema.clone(),
                importances: set.importances.clone(),
            });
            if let Some(model) = &set.method {
                method.push(AuxEntry {
                    key: key.clone(),
                    model: model.clone(),
                });
            }
            if let Some(model) = &set.round {
                round.push(AuxEntry {
                    key: key.clone(),
                    model: model.clone(),
                });
            }
        }

        fs::write(dir.join(WINNER_FILE), serde_json::to_vec(&winner)?)?;
        if method.is_empty() {
            log::debug!("No method models trained; skipping {}", METHOD_FILE);
        } else {
            fs::write(dir.join(METHOD_FILE), serde_json::to_vec(&method)?)?;
        }
        if round.is_empty() {
            log::debug!("No round models trained; skipping {}", ROUND_FILE);
        } else {
            fs::write(dir.join(ROUND_FILE), serde_json::to_vec(&round)?)?;
        }

        log::info!("Saved {} cohort model sets to {}", self.len(), dir.display());
        Ok(())
    }

    /// Load artifacts from `dir`
    ///
    /// The winner artifact is mandatory; method and round artifacts are loaded
    /// when present and silently reduce to winner-only prediction otherwise.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let winner_path = dir.join(WINNER_FILE);
        if !winner_path.exists() {
            return Err(FightError::NoModels(dir.display().to_string()));
        }

        let winner: Vec<WinnerEntry> = serde_json::from_slice(&fs::read(winner_path)?)?;
        let mut method = load_aux(&dir.join(METHOD_FILE))?;
        let mut round = load_aux(&dir.join(ROUND_FILE))?;

        let mut sets = HashMap::new();
        for entry in winner {
            let set = CohortModelSet {
                winner: entry.model,
                method: method.remove(&entry.key),
                round: round.remove(&entry.key),
                schema: entry.schema,
                importances: entry.importances,
            };
            sets.insert(entry.key, set);
        }

        log::info!("Loaded {} cohort model sets from {}", sets.len(), dir.display());
        Ok(ModelStore { sets })
    }
}

fn load_aux(path: &Path) -> Result<HashMap<CohortKey, CohortModel>> {
    if !path.exists() {
        log::debug!("Optional artifact {} not found", path.display());
        return Ok(HashMap::new());
    }
    let entries: Vec<AuxEntry> = serde_json::from_slice(&fs::read(path)?)?;
    Ok(entries.into_iter().map(|e| (e.key, e.model)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::forest::ForestParams;
    use crate::Gender;
    use std::path::PathBuf;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("octagon-store-{}-{}", tag, std::process::id()))
    }

    fn fitted_model(classes: Vec<&str>) -> CohortModel {
        let x = vec![vec![1.0], vec![2.0], vec![8.0], vec![9.0]];
        let y = vec![0, 0, 1, 1];
        let params = ForestParams {
            n_trees: 5,
            ..Default::default()
        };
        CohortModel {
            forest: RandomForest::fit(&x, &y, classes.len(), &params).unwrap(),
            classes: classes.into_iter().map(String::from).collect(),
        }
    }

    fn model_set(with_method: bool) -> CohortModelSet {
        CohortModelSet {
            winner: fitted_model(vec!["Fighter2", "Fighter1"]),
            method: with_method.then(|| fitted_model(vec!["KO/TKO", "Submission"])),
            round: None,
            schema: FeatureSchema::from_columns(&["F1 Strikes".to_string()]),
            importances: vec![RankedFeature {
                name: "F1 Strikes".to_string(),
                importance: 1.0,
            }],
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = temp_dir("roundtrip");
        let key = CohortKey::new("Lightweight", Gender::Men);

        let mut store = ModelStore::new();
        store.insert(key.clone(), model_set(true));
        store.save(&dir).unwrap();

        let loaded = ModelStore::load(&dir).unwrap();
        let set = loaded.get(&key).unwrap();
        assert!(set.method.is_some());
        assert!(set.round.is_none());
        assert_eq!(set.schema.names(), vec!["F1 Strikes"]);
        assert_eq!(set.winner.predict_label(&[1.5]).unwrap(), "Fighter2");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_optional_artifacts_tolerated() {
        let dir = temp_dir("optional");
        let key = CohortKey::new("Heavyweight", Gender::Men);

        let mut store = ModelStore::new();
        store.insert(key.clone(), model_set(true));
        store.save(&dir).unwrap();
        std::fs::remove_file(dir.join(METHOD_FILE)).unwrap();

        let loaded = ModelStore::load(&dir).unwrap();
        let set = loaded.get(&key).unwrap();
        assert!(set.method.is_none());
        assert_eq!(set.winner.predict_label(&[8.5]).unwrap(), "Fighter1");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_without_winner_artifact_fails() {
        let dir = temp_dir("missing");
        std::fs::create_dir_all(&dir).unwrap();
        assert!(matches!(
            ModelStore::load(&dir).unwrap_err(),
            FightError::NoModels(_)
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_schema_mismatch_is_fatal() {
        let model = fitted_model(vec!["a", "b"]);
        let err = model.predict_label(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            FightError::SchemaMismatch {
                expected: 1,
                actual: 2
            }
        ));
    }
}
