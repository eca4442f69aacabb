//! Evaluation metrics for cohort classifiers
//!
//! Holdout accuracy plus a per-class precision / recall / F1 / support
//! breakdown, rendered in a classification-report table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Precision / recall / F1 for one class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassReport {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of holdout samples with this true class
    pub support: usize,
}

/// Full holdout evaluation for one classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub accuracy: f64,
    pub classes: Vec<ClassReport>,
    pub total: usize,
}

impl EvalReport {
    /// Build a report from parallel truth/prediction class-id slices
    pub fn from_predictions(truth: &[usize], predicted: &[usize], labels: &[String]) -> Self {
        let total = truth.len();
        let correct = truth
            .iter()
            .zip(predicted.iter())
            .filter(|(t, p)| t == p)
            .count();
        let accuracy = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        };

        let mut classes = Vec::with_capacity(labels.len());
        for (class, label) in labels.iter().enumerate() {
            let mut tp = 0usize;
            let mut fp = 0usize;
            let mut fn_ = 0usize;
            for (&t, &p) in truth.iter().zip(predicted.iter()) {
                match (t == class, p == class) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }

            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_);
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };

            classes.push(ClassReport {
                label: label.clone(),
                precision,
                recall,
                f1,
                support: tp + fn_,
            });
        }

        EvalReport {
            accuracy,
            classes,
            total,
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .max()
            .unwrap_or(8)
            .max(8);

        writeln!(
            f,
            "{:>width$}  precision  recall  f1-score  support",
            "",
            width = width
        )?;
        for class in &self.classes {
            writeln!(
                f,
                "{:>width$}  {:>9.2}  {:>6.2}  {:>8.2}  {:>7}",
                class.label,
                class.precision,
                class.recall,
                class.f1,
                class.support,
                width = width
            )?;
        }
        write!(
            f,
            "{:>width$}  {:>9}  {:>6}  {:>8.2}  {:>7}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.total,
            width = width
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_perfect_predictions() {
        let truth = vec![0, 1, 0, 1];
        let report = EvalReport::from_predictions(&truth, &truth, &labels(&["a", "b"]));
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.classes[0].precision, 1.0);
        assert_eq!(report.classes[0].recall, 1.0);
        assert_eq!(report.classes[0].f1, 1.0);
        assert_eq!(report.classes[1].support, 2);
    }

    #[test]
    fn test_known_confusion() {
        // truth:     a a a b b
        // predicted: a a b b a
        let truth = vec![0, 0, 0, 1, 1];
        let predicted = vec![0, 0, 1, 1, 0];
        let report = EvalReport::from_predictions(&truth, &predicted, &labels(&["a", "b"]));

        assert!((report.accuracy - 0.6).abs() < 1e-12);
        let a = &report.classes[0];
        assert!((a.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((a.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(a.support, 3);

        let b = &report.classes[1];
        assert!((b.precision - 0.5).abs() < 1e-12);
        assert!((b.recall - 0.5).abs() < 1e-12);
        assert_eq!(b.support, 2);
    }

    #[test]
    fn test_absent_class_scores_zero() {
        let truth = vec![0, 0];
        let predicted = vec![0, 0];
        let report = EvalReport::from_predictions(&truth, &predicted, &labels(&["a", "b"]));
        let b = &report.classes[1];
        assert_eq!(b.precision, 0.0);
        assert_eq!(b.recall, 0.0);
        assert_eq!(b.f1, 0.0);
        assert_eq!(b.support, 0);
    }

    #[test]
    fn test_display_contains_headers() {
        let report =
            EvalReport::from_predictions(&[0, 1], &[0, 1], &labels(&["Fighter1", "Fighter2"]));
        let rendered = report.to_string();
        assert!(rendered.contains("precision"));
        assert!(rendered.contains("Fighter1"));
        assert!(rendered.contains("accuracy"));
    }
}
