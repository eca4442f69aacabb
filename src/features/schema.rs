//! Canonical feature schema for a training run
//!
//! The schema is the ordered list of dataset columns left after removing
//! identifiers, outcome fields and free-text metadata. It is computed once per
//! training run, persisted alongside the trained models, and reused verbatim
//! at prediction time so the two phases can never drift apart.

use serde::{Deserialize, Serialize};

use crate::{MatchRecord, Side};

/// Columns that must never be used as model input: fighter identities, outcome
/// fields in all their spellings, free-text metadata and the grouping keys.
const EXCLUDED_COLUMNS: &[&str] = &[
    "Fighter1",
    "Fighter2",
    "Winner?",
    "Winner?.1",
    "Fight Method",
    "Finish Round",
    "Time",
    "Time Format",
    "Referee",
    "Finish Details or Judges Scorecard",
    "Bout",
    "Event Name",
    "Location",
    "Date",
    "Weightclass",
    "Gender",
];

/// One schema column with its side tag resolved up front
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    /// Which fighter's statistic this is, or `None` for unsided columns
    pub side: Option<Side>,
}

/// A feature cell that could not be converted to a number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCell {
    pub column: String,
    pub value: String,
}

/// Ordered feature-column list shared by training and prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<FeatureColumn>,
}

impl FeatureSchema {
    /// Derive the schema from dataset headers, preserving their order
    pub fn from_columns(columns: &[String]) -> Self {
        let columns = columns
            .iter()
            .filter(|name| !EXCLUDED_COLUMNS.contains(&name.as_str()))
            .map(|name| FeatureColumn {
                name: name.clone(),
                side: side_of(name),
            })
            .collect();
        FeatureSchema { columns }
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Schema columns belonging to one fighter's side
    pub fn side_columns(&self, side: Side) -> impl Iterator<Item = &FeatureColumn> {
        self.columns
            .iter()
            .filter(move |c| c.side == Some(side))
    }

    /// Convert one record into a numeric feature row
    ///
    /// Empty cells become 0 (missing numerics are zero-filled upstream); any
    /// other non-numeric cell is a validation failure naming the column.
    pub fn numeric_row(&self, record: &MatchRecord) -> std::result::Result<Vec<f64>, InvalidCell> {
        let mut row = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let cell = record.value(&column.name).unwrap_or("");
            if cell.is_empty() {
                row.push(0.0);
                continue;
            }
            match cell.parse::<f64>() {
                Ok(v) => row.push(v),
                Err(_) => {
                    return Err(InvalidCell {
                        column: column.name.clone(),
                        value: cell.to_string(),
                    })
                }
            }
        }
        Ok(row)
    }
}

/// Resolve a column's side from the naming prefix convention
///
/// Mirrors the historical convention of checking for `F1` before `F2` anywhere
/// in the column name.
fn side_of(name: &str) -> Option<Side> {
    if name.contains(Side::First.prefix()) {
        Some(Side::First)
    } else if name.contains(Side::Second.prefix()) {
        Some(Side::Second)
    } else {
        None
    }
}
