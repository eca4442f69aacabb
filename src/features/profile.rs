//! Fighter statistic aggregation
//!
//! A fighter's expected feature values are the column-wise means of their
//! side-prefixed statistics across every historical appearance on that side.
//! A fighter with no appearances gets an all-zero profile; cold-start inputs
//! are neutral by policy, not an error.

use std::collections::HashMap;

use crate::features::FeatureSchema;
use crate::{MatchRecord, Side};

/// Mean historical feature values for one fighter on one side
#[derive(Debug, Clone)]
pub struct FighterProfile {
    name: String,
    side: Side,
    values: HashMap<String, f64>,
    appearances: usize,
}

impl FighterProfile {
    /// Aggregate a fighter's historical statistics for the given side
    pub fn compute(
        records: &[MatchRecord],
        name: &str,
        side: Side,
        schema: &FeatureSchema,
    ) -> Self {
        let appearances: Vec<&MatchRecord> = records
            .iter()
            .filter(|r| r.has_fighter(name, side))
            .collect();

        let mut values = HashMap::new();
        for column in schema.side_columns(side) {
            let mut sum = 0.0;
            let mut count = 0usize;
            for record in &appearances {
                // Unparsable cells are excluded from the mean, like NaNs upstream
                if let Some(v) = record.value(&column.name).and_then(|c| c.parse::<f64>().ok()) {
                    sum += v;
                    count += 1;
                }
            }
            let mean = if count == 0 { 0.0 } else { sum / count as f64 };
            values.insert(column.name.clone(), mean);
        }

        FighterProfile {
            name: name.to_string(),
            side,
            values,
            appearances: appearances.len(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Mean value for a column, 0 when the column is not part of this profile
    pub fn get(&self, column: &str) -> f64 {
        self.values.get(column).copied().unwrap_or(0.0)
    }

    /// Number of historical appearances on this profile's side
    pub fn appearances(&self) -> usize {
        self.appearances
    }

    /// True when the fighter has no history on this side
    pub fn is_cold_start(&self) -> bool {
        self.appearances == 0
    }

    /// Number of aggregated columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Gender;

    fn make_record(fighter1: &str, fighter2: &str, f1_strikes: &str) -> MatchRecord {
        let mut values = HashMap::new();
        values.insert("F1 Strikes".to_string(), f1_strikes.to_string());
        values.insert("F2 Strikes".to_string(), "7".to_string());
        MatchRecord {
            fighter1: fighter1.to_string(),
            fighter2: fighter2.to_string(),
            bout: "Lightweight Bout".to_string(),
            weight_class: Some("Lightweight".to_string()),
            gender: Gender::Men,
            winner: Some(1),
            method: None,
            round: None,
            values,
        }
    }

    fn schema() -> FeatureSchema {
        FeatureSchema::from_columns(&[
            "F1 Strikes".to_string(),
            "F2 Strikes".to_string(),
        ])
    }

    #[test]
    fn test_mean_over_side_appearances() {
        let records = vec![
            make_record("A", "X", "10"),
            make_record("A", "Y", "20"),
            make_record("A", "Z", "30"),
            // A on the other side must not count toward the First profile
            make_record("Q", "A", "999"),
        ];
        let profile = FighterProfile::compute(&records, "A", Side::First, &schema());
        assert_eq!(profile.appearances(), 3);
        assert_eq!(profile.get("F1 Strikes"), 20.0);
    }

    #[test]
    fn test_cold_start_yields_zero_vector() {
        let records = vec![make_record("A", "B", "10")];
        let schema = schema();
        let profile = FighterProfile::compute(&records, "Nobody", Side::Second, &schema);

        assert!(profile.is_cold_start());
        assert_eq!(profile.len(), schema.side_columns(Side::Second).count());
        for column in schema.side_columns(Side::Second) {
            assert_eq!(profile.get(&column.name), 0.0);
        }
    }

    #[test]
    fn test_unparsable_cells_excluded_from_mean() {
        let records = vec![
            make_record("A", "X", "10"),
            make_record("A", "Y", "not-a-number"),
            make_record("A", "Z", "30"),
        ];
        let profile = FighterProfile::compute(&records, "A", Side::First, &schema());
        assert_eq!(profile.get("F1 Strikes"), 20.0);
    }

    #[test]
    fn test_profile_restricted_to_own_side() {
        let records = vec![make_record("A", "B", "10")];
        let profile = FighterProfile::compute(&records, "A", Side::First, &schema());
        // F2 columns are not part of a First-side profile
        assert_eq!(profile.get("F2 Strikes"), 0.0);
        assert_eq!(profile.len(), 1);
    }
}
