//! Held-out scoring and winner selection.

use std::cmp::Ordering;

use crate::models::TargetValues;
use crate::types::{CandidateEvaluation, CandidateKind};

/// Relative tolerance for "exact" predictions of a constant target.
const EXACT_TOLERANCE: f64 = 1e-9;

/// Score predictions against held-out truth, always in `[0, 1]`.
///
/// Classes are scored with accuracy, continuous values with R² clamped at
/// zero. R² is undefined on a constant target, so a constant target scores
/// 1 when every prediction hits it and 0 otherwise.
pub fn score(truth: &TargetValues, predicted: &TargetValues) -> f64 {
    if truth.is_empty() || truth.len() != predicted.len() {
        return 0.0;
    }

    let raw = match (truth, predicted) {
        (TargetValues::Classes(t), TargetValues::Classes(p)) => {
            smartcore::metrics::accuracy(t, p)
        }
        (TargetValues::Continuous(t), TargetValues::Continuous(p)) => {
            let first = t[0];
            if t.iter().all(|&v| v == first) {
                let exact = p
                    .iter()
                    .all(|&v| (v - first).abs() <= EXACT_TOLERANCE * first.abs().max(1.0));
                if exact { 1.0 } else { 0.0 }
            } else {
                smartcore::metrics::r2(t, p)
            }
        }
        _ => 0.0,
    };

    if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Order evaluations best first.
///
/// Higher score wins; ties go to the faster candidate when `prefer_faster`
/// is set, then to the candidate declared first in [`CandidateKind`].
pub fn rank(evaluations: &[CandidateEvaluation], prefer_faster: bool) -> Vec<CandidateKind> {
    let mut ordered: Vec<&CandidateEvaluation> = evaluations.iter().collect();
    ordered.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| {
                if prefer_faster {
                    a.elapsed_seconds.total_cmp(&b.elapsed_seconds)
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| a.candidate.cmp(&b.candidate))
    });
    ordered.into_iter().map(|e| e.candidate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(candidate: CandidateKind, score: f64, elapsed_seconds: f64) -> CandidateEvaluation {
        CandidateEvaluation {
            candidate,
            score,
            elapsed_seconds,
        }
    }

    // =========================================================================
    // score() tests
    // =========================================================================

    #[test]
    fn test_score_accuracy() {
        let truth = TargetValues::Classes(vec![0, 1, 1, 2]);
        let predicted = TargetValues::Classes(vec![0, 1, 0, 2]);
        assert_eq!(score(&truth, &predicted), 0.75);
    }

    #[test]
    fn test_score_r2_perfect_and_clamped() {
        let truth = TargetValues::Continuous(vec![1.0, 2.0, 3.0]);
        assert_eq!(score(&truth, &truth.clone()), 1.0);

        // worse than predicting the mean: negative R² clamps to zero
        let bad = TargetValues::Continuous(vec![3.0, 2.0, 1.0]);
        assert_eq!(score(&truth, &bad), 0.0);
    }

    #[test]
    fn test_score_constant_target() {
        let truth = TargetValues::Continuous(vec![5.0, 5.0]);
        assert_eq!(score(&truth, &TargetValues::Continuous(vec![5.0, 5.0])), 1.0);
        assert_eq!(score(&truth, &TargetValues::Continuous(vec![5.0, 4.0])), 0.0);
    }

    #[test]
    fn test_score_mismatch_is_zero() {
        let truth = TargetValues::Classes(vec![0, 1]);
        assert_eq!(score(&truth, &TargetValues::Classes(vec![0])), 0.0);
        assert_eq!(
            score(&truth, &TargetValues::Continuous(vec![0.0, 1.0])),
            0.0
        );
        assert_eq!(
            score(
                &TargetValues::Continuous(vec![1.0, 2.0]),
                &TargetValues::Continuous(vec![f64::NAN, 1.0])
            ),
            0.0
        );
    }

    // =========================================================================
    // rank() tests
    // =========================================================================

    #[test]
    fn test_rank_by_score() {
        let evals = [
            eval(CandidateKind::LinearRegression, 0.7, 0.01),
            eval(CandidateKind::RandomForest, 0.9, 0.5),
        ];
        assert_eq!(
            rank(&evals, true),
            vec![CandidateKind::RandomForest, CandidateKind::LinearRegression]
        );
    }

    #[test]
    fn test_rank_tie_prefers_faster() {
        let evals = [
            eval(CandidateKind::LogisticRegression, 1.0, 0.3),
            eval(CandidateKind::RandomForest, 1.0, 0.1),
        ];
        assert_eq!(rank(&evals, true)[0], CandidateKind::RandomForest);
    }

    #[test]
    fn test_rank_tie_without_timing_uses_priority() {
        let evals = [
            eval(CandidateKind::RandomForest, 1.0, 0.1),
            eval(CandidateKind::LogisticRegression, 1.0, 0.3),
        ];
        assert_eq!(rank(&evals, false)[0], CandidateKind::LogisticRegression);
    }
}
