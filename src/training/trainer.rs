//! Per-cohort model training
//!
//! Every eligible cohort independently gets a winner forest, and - when the
//! labels exist - method and round forests, all evaluated on a deterministic
//! shuffled holdout. A data-validation failure in one cohort is reported and
//! skipped; the remaining cohorts still train.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;

use crate::data::{CohortPartition, FightDataset};
use crate::features::FeatureSchema;
use crate::model::forest::{ForestParams, RandomForest, RankedFeature};
use crate::model::store::{CohortModel, CohortModelSet, ModelStore};
use crate::training::metrics::EvalReport;
use crate::{CohortKey, FightError, MatchRecord, Result, Side, TrainingConfig};

/// How many ranked features each cohort keeps for prediction-time reporting
const TOP_FEATURES: usize = 10;

/// Holdout evaluation results for one cohort
#[derive(Debug, Clone)]
pub struct CohortReport {
    pub key: CohortKey,
    pub records: usize,
    pub winner: EvalReport,
    pub method: Option<EvalReport>,
    pub round: Option<EvalReport>,
}

/// Everything produced by one training run
#[derive(Debug)]
pub struct TrainingOutcome {
    pub store: ModelStore,
    pub reports: Vec<CohortReport>,
    /// Cohorts below the minimum size, with their record counts
    pub skipped: Vec<(CohortKey, usize)>,
    /// Cohorts whose training failed on a data error
    pub failed: Vec<(CohortKey, FightError)>,
    /// Records whose bout text matched no weight class
    pub ungrouped: usize,
}

/// Train models for every eligible cohort in the dataset
pub fn train_all(dataset: &FightDataset, config: &TrainingConfig) -> Result<TrainingOutcome> {
    let schema = FeatureSchema::from_columns(dataset.columns());
    if schema.is_empty() {
        return Err(FightError::Training(
            "dataset has no feature columns after exclusions".to_string(),
        ));
    }

    let partition = CohortPartition::from_dataset(dataset);
    let skipped = partition.skipped(config.min_cohort_size);
    for (key, count) in &skipped {
        log::info!(
            "Skipping cohort {} ({} records, need {})",
            key,
            count,
            config.min_cohort_size
        );
    }

    let mut store = ModelStore::new();
    let mut reports = Vec::new();
    let mut failed = Vec::new();
    for (key, records) in partition.eligible(config.min_cohort_size) {
        match train_cohort(key, records, &schema, config) {
            Ok((set, report)) => {
                log::info!(
                    "Trained cohort {} ({} records, winner accuracy {:.2})",
                    key,
                    records.len(),
                    report.winner.accuracy
                );
                store.insert(key.clone(), set);
                reports.push(report);
            }
            Err(e) => {
                log::error!("Training failed for cohort {}: {}", key, e);
                failed.push((key.clone(), e));
            }
        }
    }

    Ok(TrainingOutcome {
        store,
        reports,
        skipped,
        failed,
        ungrouped: partition.ungrouped_count(),
    })
}

fn train_cohort(
    key: &CohortKey,
    records: &[MatchRecord],
    schema: &FeatureSchema,
    config: &TrainingConfig,
) -> Result<(CohortModelSet, CohortReport)> {
    // Only rows with a recorded winner can be trained on
    let usable: Vec<&MatchRecord> = records.iter().filter(|r| r.winner.is_some()).collect();
    let dropped = records.len() - usable.len();
    if dropped > 0 {
        log::debug!("Cohort {}: {} rows without winner labels dropped", key, dropped);
    }
    if usable.len() < 2 {
        return Err(FightError::Training(format!(
            "cohort {} has too few labeled rows",
            key
        )));
    }

    let mut matrix = Vec::with_capacity(usable.len());
    for record in &usable {
        let row = schema
            .numeric_row(record)
            .map_err(|cell| FightError::DataValidation {
                cohort: key.clone(),
                column: cell.column,
                value: cell.value,
            })?;
        matrix.push(row);
    }

    let (train_idx, test_idx) = holdout_split(usable.len(), config.holdout_fraction, config.seed);
    let params = ForestParams {
        n_trees: config.n_trees,
        max_depth: config.max_depth,
        seed: config.seed,
    };

    // Winner classifier: class id equals the winner indicator
    let winner_labels = vec![
        Side::Second.label().to_string(),
        Side::First.label().to_string(),
    ];
    let winner_y: Vec<usize> = usable
        .iter()
        .map(|r| r.winner.unwrap_or(0) as usize)
        .collect();
    let (winner_model, winner_report) = fit_and_evaluate(
        &matrix,
        &winner_y,
        winner_labels,
        &train_idx,
        &test_idx,
        &params,
    )?;

    // Method classifier, when any method label exists
    let method = if usable.iter().any(|r| r.method.is_some()) {
        let raw: Vec<String> = usable
            .iter()
            .map(|r| r.method.clone().unwrap_or_else(|| "Unknown".to_string()))
            .collect();
        let (labels, y) = encode_labels(&raw);
        Some(fit_and_evaluate(
            &matrix, &y, labels, &train_idx, &test_idx, &params,
        )?)
    } else {
        None
    };

    // Round classifier on the derived round-or-decision label
    let round = if usable.iter().any(|r| r.round.is_some()) {
        let raw: Vec<String> = usable
            .iter()
            .map(|r| derive_round_label(r.method.as_deref(), r.round))
            .collect();
        let (labels, y) = encode_labels(&raw);
        Some(fit_and_evaluate(
            &matrix, &y, labels, &train_idx, &test_idx, &params,
        )?)
    } else {
        None
    };

    // Outcome-named columns are never ranked, even if one slips past the schema
    let importances: Vec<RankedFeature> = winner_model
        .forest
        .ranked_features(&schema.names())
        .into_iter()
        .filter(|f| !f.name.contains("Winner"))
        .take(TOP_FEATURES)
        .collect();

    let (method_model, method_report) = split_option(method);
    let (round_model, round_report) = split_option(round);

    let report = CohortReport {
        key: key.clone(),
        records: records.len(),
        winner: winner_report,
        method: method_report,
        round: round_report,
    };
    let set = CohortModelSet {
        winner: winner_model,
        method: method_model,
        round: round_model,
        schema: schema.clone(),
        importances,
    };
    Ok((set, report))
}

/// Round target: "Decision" when the method says so, otherwise the round
/// number as a category with missing rounds coalescing to 0 first.
fn derive_round_label(method: Option<&str>, round: Option<u32>) -> String {
    if method.is_some_and(|m| m.contains("Decision")) {
        "Decision".to_string()
    } else {
        round.unwrap_or(0).to_string()
    }
}

/// Map free-text labels to dense class ids with a sorted vocabulary
fn encode_labels(raw: &[String]) -> (Vec<String>, Vec<usize>) {
    let vocabulary: Vec<String> = raw
        .iter()
        .cloned()
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();
    let y = raw
        .iter()
        .map(|label| {
            vocabulary
                .iter()
                .position(|v| v == label)
                .unwrap_or_default()
        })
        .collect();
    (vocabulary, y)
}

/// Deterministic shuffled train/holdout split
fn holdout_split(n: usize, fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64 * fraction).round() as usize).clamp(1, n - 1);
    let test = indices.split_off(n - n_test);
    (indices, test)
}

fn fit_and_evaluate(
    matrix: &[Vec<f64>],
    y: &[usize],
    labels: Vec<String>,
    train_idx: &[usize],
    test_idx: &[usize],
    params: &ForestParams,
) -> Result<(CohortModel, EvalReport)> {
    let train_x: Vec<Vec<f64>> = train_idx.iter().map(|&i| matrix[i].clone()).collect();
    let train_y: Vec<usize> = train_idx.iter().map(|&i| y[i]).collect();
    let forest = RandomForest::fit(&train_x, &train_y, labels.len(), params)?;

    let truth: Vec<usize> = test_idx.iter().map(|&i| y[i]).collect();
    let predicted: Vec<usize> = test_idx.iter().map(|&i| forest.predict(&matrix[i])).collect();
    let report = EvalReport::from_predictions(&truth, &predicted, &labels);

    Ok((CohortModel { forest, classes: labels }, report))
}

fn split_option<A, B>(pair: Option<(A, B)>) -> (Option<A>, Option<B>) {
    match pair {
        Some((a, b)) => (Some(a), Some(b)),
        None => (None, None),
    }
}
