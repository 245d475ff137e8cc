//! Top-1 retrieval accuracy over labeled query results.

use serde::{Deserialize, Serialize};

use crate::search::Match;

/// Outcome of an evaluation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalReport {
    /// Queries whose top match carried the expected label.
    pub correct: usize,
    /// Total queries evaluated.
    pub total: usize,
}

impl EvalReport {
    /// Fraction of correct queries, 0.0 for an empty run.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Reduce a label to its stem: the last path component, cut at the first dot.
///
/// `"sprites/pikachu.png"` and `"pikachu.small.png"` both stem to
/// `"pikachu"`.
pub fn label_stem(label: &str) -> &str {
    let base = label.rsplit('/').next().unwrap_or(label);
    base.split('.').next().unwrap_or(base)
}

/// Score one match list per query against the expected labels.
///
/// A query counts as correct when `label_of` yields a label for its first
/// match whose stem equals the stem of the expected label. Queries without
/// matches, or whose match has no label, count as incorrect.
pub fn top1_accuracy<F>(matches: &[Vec<Match>], expected: &[String], label_of: F) -> EvalReport
where
    F: Fn(&Match) -> Option<String>,
{
    let mut correct = 0;
    for (row, want) in matches.iter().zip(expected) {
        if let Some(first) = row.first()
            && let Some(got) = label_of(first)
            && label_stem(&got) == label_stem(want)
        {
            correct += 1;
        }
    }

    EvalReport {
        correct,
        total: expected.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled_match(label: &str) -> Match {
        Match {
            id: 0,
            similarity: 1.0,
            distance: 0.0,
            payload: label.as_bytes().to_vec(),
            embedding: None,
        }
    }

    fn payload_label(m: &Match) -> Option<String> {
        String::from_utf8(m.payload.clone()).ok()
    }

    #[test]
    fn test_label_stem() {
        assert_eq!(label_stem("sprites/red-blue/pikachu.png"), "pikachu");
        assert_eq!(label_stem("pikachu.small.png"), "pikachu");
        assert_eq!(label_stem("pikachu"), "pikachu");
        assert_eq!(label_stem(""), "");
    }

    #[test]
    fn test_accuracy_counts_stem_matches() {
        let matches = vec![
            vec![labeled_match("a/pikachu.png")],
            vec![labeled_match("b/bulbasaur.png")],
            vec![],
        ];
        let expected = vec![
            "q/pikachu.jpg".to_string(),
            "q/charmander.jpg".to_string(),
            "q/squirtle.jpg".to_string(),
        ];

        let report = top1_accuracy(&matches, &expected, payload_label);
        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 3);
    }

    #[test]
    fn test_accuracy_fraction() {
        let report = EvalReport {
            correct: 3,
            total: 4,
        };
        assert!((report.accuracy() - 0.75).abs() < f64::EPSILON);

        let empty = EvalReport {
            correct: 0,
            total: 0,
        };
        assert_eq!(empty.accuracy(), 0.0);
    }

    #[test]
    fn test_unlabeled_match_is_incorrect() {
        let mut m = labeled_match("ignored");
        m.payload = vec![0xFF, 0xFE];
        let matches = vec![vec![m]];
        let expected = vec!["anything".to_string()];

        let report = top1_accuracy(&matches, &expected, payload_label);
        assert_eq!(report.correct, 0);
    }
}
