//! CSV ingestion for historical bout data
//!
//! Reads the preprocessed fight-statistics CSV into immutable `MatchRecord`s.
//! Identity, bout text and outcome columns are parsed into typed fields; all
//! remaining columns are kept as raw cells so the feature schema can be
//! derived from the header order later.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::data::cohort;
use crate::{FightError, MatchRecord, Result};

/// First-listed fighter identity column
pub const COL_FIGHTER1: &str = "Fighter1";
/// Second-listed fighter identity column
pub const COL_FIGHTER2: &str = "Fighter2";
/// Free-text bout description column (source of weight class and gender)
pub const COL_BOUT: &str = "Bout";
/// Winner indicator column (1 = first-listed fighter)
pub const COL_WINNER: &str = "Winner?";
/// Method-of-victory column
pub const COL_METHOD: &str = "Fight Method";
/// Finishing round column
pub const COL_ROUND: &str = "Finish Round";

/// A loaded dataset: the header order plus one record per bout
#[derive(Debug, Clone)]
pub struct FightDataset {
    columns: Vec<String>,
    records: Vec<MatchRecord>,
}

impl FightDataset {
    /// Load a dataset from a CSV file on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let reader = csv::Reader::from_path(path)?;
        Self::from_csv(reader)
    }

    /// Load a dataset from any CSV reader
    pub fn from_reader(reader: impl io::Read) -> Result<Self> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        for required in [COL_FIGHTER1, COL_FIGHTER2, COL_BOUT] {
            if !columns.iter().any(|c| c == required) {
                return Err(FightError::MissingColumn(required.to_string()));
            }
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            records.push(parse_record(&columns, &row)?);
        }

        log::debug!("Loaded {} records, {} columns", records.len(), columns.len());
        Ok(FightDataset { columns, records })
    }

    /// Build a dataset from already-constructed records (used by tests)
    pub fn from_records(columns: Vec<String>, records: Vec<MatchRecord>) -> Self {
        FightDataset { columns, records }
    }

    /// Column headers in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the dataset, returning its records
    pub fn into_records(self) -> Vec<MatchRecord> {
        self.records
    }
}

fn parse_record(columns: &[String], row: &csv::StringRecord) -> Result<MatchRecord> {
    let mut fighter1 = String::new();
    let mut fighter2 = String::new();
    let mut bout = String::new();
    let mut winner = None;
    let mut method = None;
    let mut round = None;
    let mut values = HashMap::new();

    for (column, cell) in columns.iter().zip(row.iter()) {
        let cell = cell.trim();
        match column.as_str() {
            COL_FIGHTER1 => fighter1 = cell.to_string(),
            COL_FIGHTER2 => fighter2 = cell.to_string(),
            COL_BOUT => bout = cell.to_string(),
            COL_WINNER => winner = parse_winner(cell),
            COL_METHOD => {
                if !cell.is_empty() {
                    method = Some(cell.to_string());
                }
            }
            COL_ROUND => round = parse_round(cell),
            _ => {
                values.insert(column.clone(), cell.to_string());
            }
        }
    }

    let weight_class = cohort::weight_class_of(&bout);
    let gender = cohort::gender_of(&bout);

    Ok(MatchRecord {
        fighter1,
        fighter2,
        bout,
        weight_class,
        gender,
        winner,
        method,
        round,
        values,
    })
}

/// The winner column is label-encoded upstream; tolerate "1", "1.0" and friends
fn parse_winner(cell: &str) -> Option<u8> {
    cell.parse::<f64>().ok().map(|v| (v != 0.0) as u8)
}

fn parse_round(cell: &str) -> Option<u32> {
    cell.parse::<f64>().ok().map(|v| v as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Gender, Side};

    const SAMPLE_CSV: &str = "\
Fighter1,Fighter2,Bout,Winner?,Fight Method,Finish Round,F1 Strikes,F2 Strikes
Alice,Betty,UFC Women's Strawweight Bout,1,KO/TKO,2,33.5,12
Carl,Dan,Lightweight Bout,0,Decision - Unanimous,3,20,25
Eve,Fay,Catch Bout,1.0,,,5,6
";

    #[test]
    fn test_load_from_reader() {
        let dataset = FightDataset::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.columns().len(), 8);

        let first = &dataset.records()[0];
        assert_eq!(first.fighter(Side::First), "Alice");
        assert_eq!(first.gender, Gender::Women);
        assert_eq!(first.weight_class.as_deref(), Some("Strawweight"));
        assert_eq!(first.winner, Some(1));
        assert_eq!(first.method.as_deref(), Some("KO/TKO"));
        assert_eq!(first.round, Some(2));
        assert_eq!(first.value("F1 Strikes"), Some("33.5"));
    }

    #[test]
    fn test_missing_outcome_fields() {
        let dataset = FightDataset::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
        let third = &dataset.records()[2];
        assert_eq!(third.winner, Some(1));
        assert_eq!(third.method, None);
        assert_eq!(third.round, None);
        // "Catch" does not match the weight-class pattern
        assert_eq!(third.weight_class, None);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "Fighter1,Bout\nAlice,Lightweight Bout\n";
        let err = FightDataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, FightError::MissingColumn(c) if c == "Fighter2"));
    }
}
