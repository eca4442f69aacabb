//! Cohort partitioning by weight class and gender
//!
//! The weight class is the first `\w+weight` token in the free-text bout
//! description; gender is `Women` when the description mentions it. Records
//! whose bout text matches no weight-class token go to an explicit ungrouped
//! bucket that is surfaced as a diagnostic, never trained on.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::data::FightDataset;
use crate::{CohortKey, Gender, MatchRecord};

fn weight_class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\w+weight)").unwrap())
}

/// Extract the weight-class token from a bout description
pub fn weight_class_of(bout: &str) -> Option<String> {
    weight_class_pattern()
        .find(bout)
        .map(|m| m.as_str().to_string())
}

/// Derive the gender division from a bout description
pub fn gender_of(bout: &str) -> Gender {
    if bout.contains("Women") {
        Gender::Women
    } else {
        Gender::Men
    }
}

/// A dataset split into disjoint (weight class, gender) cohorts
///
/// `BTreeMap` keeps cohort iteration order deterministic across runs.
#[derive(Debug, Clone)]
pub struct CohortPartition {
    cohorts: BTreeMap<CohortKey, Vec<MatchRecord>>,
    ungrouped: Vec<MatchRecord>,
}

impl CohortPartition {
    /// Group a dataset's records by exact cohort-key equality
    pub fn from_dataset(dataset: &FightDataset) -> Self {
        Self::from_records(dataset.records())
    }

    pub fn from_records(records: &[MatchRecord]) -> Self {
        let mut cohorts: BTreeMap<CohortKey, Vec<MatchRecord>> = BTreeMap::new();
        let mut ungrouped = Vec::new();

        for record in records {
            match record.cohort_key() {
                Some(key) => cohorts.entry(key).or_default().push(record.clone()),
                None => ungrouped.push(record.clone()),
            }
        }

        if !ungrouped.is_empty() {
            log::info!(
                "{} records have no recognizable weight class and were left ungrouped",
                ungrouped.len()
            );
        }

        CohortPartition { cohorts, ungrouped }
    }

    /// All cohorts, smallest key first
    pub fn cohorts(&self) -> impl Iterator<Item = (&CohortKey, &[MatchRecord])> {
        self.cohorts.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Cohorts meeting the minimum-size threshold for training
    pub fn eligible(&self, min_size: usize) -> impl Iterator<Item = (&CohortKey, &[MatchRecord])> {
        self.cohorts()
            .filter(move |(_, records)| records.len() >= min_size)
    }

    /// Cohorts below the minimum-size threshold, with their sizes
    pub fn skipped(&self, min_size: usize) -> Vec<(CohortKey, usize)> {
        self.cohorts()
            .filter(|(_, records)| records.len() < min_size)
            .map(|(key, records)| (key.clone(), records.len()))
            .collect()
    }

    /// Records whose bout text matched no weight-class token
    pub fn ungrouped(&self) -> &[MatchRecord] {
        &self.ungrouped
    }

    pub fn ungrouped_count(&self) -> usize {
        self.ungrouped.len()
    }

    /// Records for one cohort, if present
    pub fn get(&self, key: &CohortKey) -> Option<&[MatchRecord]> {
        self.cohorts.get(key).map(|v| v.as_slice())
    }

    /// Number of distinct cohorts (ungrouped bucket excluded)
    pub fn cohort_count(&self) -> usize {
        self.cohorts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_record(bout: &str) -> MatchRecord {
        MatchRecord {
            fighter1: "A".to_string(),
            fighter2: "B".to_string(),
            bout: bout.to_string(),
            weight_class: weight_class_of(bout),
            gender: gender_of(bout),
            winner: Some(1),
            method: None,
            round: None,
            values: HashMap::new(),
        }
    }

    #[test]
    fn test_weight_class_extraction() {
        assert_eq!(
            weight_class_of("UFC Lightweight Title Bout"),
            Some("Lightweight".to_string())
        );
        assert_eq!(
            weight_class_of("UFC Women's Strawweight Bout"),
            Some("Strawweight".to_string())
        );
        assert_eq!(weight_class_of("Open Catch Bout"), None);
    }

    #[test]
    fn test_first_token_wins() {
        // Two candidate tokens: the first match is the cohort's weight class
        assert_eq!(
            weight_class_of("Featherweight Bout (formerly Bantamweight)"),
            Some("Featherweight".to_string())
        );
    }

    #[test]
    fn test_gender_detection() {
        assert_eq!(gender_of("UFC Women's Flyweight Bout"), Gender::Women);
        assert_eq!(gender_of("UFC Flyweight Bout"), Gender::Men);
    }

    #[test]
    fn test_partition_groups_by_key() {
        let records = vec![
            make_record("Lightweight Bout"),
            make_record("Lightweight Bout"),
            make_record("Women's Lightweight Bout"),
            make_record("Heavyweight Bout"),
            make_record("No Class Bout"),
        ];
        let partition = CohortPartition::from_records(&records);

        assert_eq!(partition.cohort_count(), 3);
        assert_eq!(
            partition
                .get(&CohortKey::new("Lightweight", Gender::Men))
                .unwrap()
                .len(),
            2
        );
        assert_eq!(partition.ungrouped_count(), 1);
    }

    #[test]
    fn test_eligibility_threshold() {
        let mut records = Vec::new();
        for _ in 0..20 {
            records.push(make_record("Lightweight Bout"));
        }
        for _ in 0..19 {
            records.push(make_record("Heavyweight Bout"));
        }
        let partition = CohortPartition::from_records(&records);

        let eligible: Vec<_> = partition.eligible(20).map(|(k, _)| k.clone()).collect();
        assert_eq!(eligible, vec![CohortKey::new("Lightweight", Gender::Men)]);

        let skipped = partition.skipped(20);
        assert_eq!(
            skipped,
            vec![(CohortKey::new("Heavyweight", Gender::Men), 19)]
        );
    }
}
