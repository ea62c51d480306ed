//! Candidate imputation models.
//!
//! Each candidate wraps one `smartcore` estimator behind the [`Candidate`]
//! trait. The engine only ever sees the trait: it asks the factory for a
//! fresh instance, fits it, predicts, and drops it.

mod forest;
mod linear;
mod logistic;

use smartcore::error::Failed;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::config::EngineConfig;
use crate::error::{ImputationError, Result};
use crate::types::{CandidateKind, TaskType};

pub use forest::RandomForestCandidate;
pub use linear::LinearRegressionCandidate;
pub use logistic::LogisticRegressionCandidate;

/// Training targets or predictions of a candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetValues {
    /// Regression values.
    Continuous(Vec<f64>),
    /// Class codes, `0..k` over the column's sorted labels.
    Classes(Vec<i32>),
}

impl TargetValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Continuous(v) => v.len(),
            Self::Classes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out the given positions.
    pub fn select(&self, positions: &[usize]) -> Self {
        match self {
            Self::Continuous(v) => Self::Continuous(positions.iter().map(|&i| v[i]).collect()),
            Self::Classes(v) => Self::Classes(positions.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// A trainable imputation model.
pub trait Candidate {
    fn kind(&self) -> CandidateKind;

    fn fit(&mut self, x: &DenseMatrix<f64>, y: &TargetValues) -> Result<()>;

    fn predict(&self, x: &DenseMatrix<f64>) -> Result<TargetValues>;
}

/// Build a fresh, unfitted candidate for a task.
pub fn create_candidate(
    kind: CandidateKind,
    task_type: TaskType,
    config: &EngineConfig,
) -> Option<Box<dyn Candidate>> {
    if !kind.supports(task_type) {
        return None;
    }
    let candidate: Box<dyn Candidate> = match kind {
        CandidateKind::LinearRegression => Box::new(LinearRegressionCandidate::new()),
        CandidateKind::LogisticRegression => {
            Box::new(LogisticRegressionCandidate::new(config.logistic_alpha))
        }
        CandidateKind::RandomForest => Box::new(RandomForestCandidate::new(
            task_type,
            config.forest_trees,
            config.forest_max_depth,
            config.seed,
        )),
    };
    Some(candidate)
}

/// Row-major feature rows to a smartcore matrix.
pub fn to_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    DenseMatrix::from_2d_vec(&rows.to_vec())
        .map_err(|e| ImputationError::Internal(format!("cannot build feature matrix: {e}")))
}

/// Run estimator code, turning a panic into an error.
///
/// The default panic hook still runs, so a caught panic prints its message
/// to stderr. Candidates reject inputs known to panic before calling in.
pub(crate) fn guarded<T>(kind: CandidateKind, f: impl FnOnce() -> Result<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "estimator panicked".to_string());
            Err(ImputationError::ModelFailed {
                candidate: kind,
                reason: format!("panicked: {reason}"),
            })
        }
    }
}

pub(crate) fn model_failed(kind: CandidateKind) -> impl FnOnce(Failed) -> ImputationError {
    move |e| ImputationError::ModelFailed {
        candidate: kind,
        reason: e.to_string(),
    }
}

pub(crate) fn wrong_target(kind: CandidateKind) -> ImputationError {
    ImputationError::ModelFailed {
        candidate: kind,
        reason: "target values do not match the task type".to_string(),
    }
}

pub(crate) fn not_fitted(kind: CandidateKind) -> ImputationError {
    ImputationError::ModelFailed {
        candidate: kind,
        reason: "predict called before fit".to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// `y = 2a - b + 1` on a small grid.
    pub(crate) fn linear_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![i as f64, ((i * 7) % 11) as f64])
            .collect();
        let y = x.iter().map(|r| 2.0 * r[0] - r[1] + 1.0).collect();
        (x, y)
    }

    /// Two well separated classes on the first feature.
    pub(crate) fn class_data() -> (Vec<Vec<f64>>, Vec<i32>) {
        let x: Vec<Vec<f64>> = (0..40)
            .map(|i| {
                let offset = if i % 2 == 0 { -3.0 } else { 3.0 };
                vec![offset + (i % 5) as f64 * 0.1, (i % 3) as f64]
            })
            .collect();
        let y = (0..40).map(|i| i % 2).collect();
        (x, y)
    }

    #[test]
    fn test_factory_respects_task_type() {
        let config = EngineConfig::default();
        assert!(
            create_candidate(
                CandidateKind::LinearRegression,
                TaskType::Classification,
                &config
            )
            .is_none()
        );
        assert!(
            create_candidate(
                CandidateKind::LogisticRegression,
                TaskType::Regression,
                &config
            )
            .is_none()
        );
        for task in [TaskType::Classification, TaskType::Regression] {
            for &kind in task.candidates() {
                let candidate = create_candidate(kind, task, &config).unwrap();
                assert_eq!(candidate.kind(), kind);
            }
        }
    }

    #[test]
    fn test_guarded_turns_panic_into_error() {
        let result: Result<()> = guarded(CandidateKind::RandomForest, || panic!("boom"));
        let err = result.unwrap_err();
        assert_eq!(err.error_code(), "MODEL_FAILED");
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_to_matrix_rejects_empty() {
        assert!(to_matrix(&[]).is_err());
    }

    #[test]
    fn test_target_values_select() {
        let y = TargetValues::Classes(vec![3, 4, 5]);
        assert_eq!(y.select(&[2, 0]), TargetValues::Classes(vec![5, 3]));
        assert_eq!(y.len(), 3);
    }
}
