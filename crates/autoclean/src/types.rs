use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ImputationError;

// ============================================================================
// Task and candidate identifiers
// ============================================================================

/// Kind of learning problem used to fill a target column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Discrete labels, scored with accuracy.
    Classification,
    /// Continuous values, scored with R².
    Regression,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::Regression => "regression",
        }
    }

    /// Candidates eligible for this task, in tie-break priority order.
    pub fn candidates(&self) -> &'static [CandidateKind] {
        match self {
            Self::Classification => &[CandidateKind::LogisticRegression, CandidateKind::RandomForest],
            Self::Regression => &[CandidateKind::LinearRegression, CandidateKind::RandomForest],
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate imputation model.
///
/// Variant order is the tie-break priority: when two candidates score the
/// same (and run equally fast), the one declared first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    LinearRegression,
    LogisticRegression,
    /// Runs as a regressor or a classifier depending on the task type.
    RandomForest,
}

impl CandidateKind {
    pub const ALL: [CandidateKind; 3] = [
        CandidateKind::LinearRegression,
        CandidateKind::LogisticRegression,
        CandidateKind::RandomForest,
    ];

    /// Returns a human-readable name for the candidate.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LinearRegression => "Linear Regression",
            Self::LogisticRegression => "Logistic Regression",
            Self::RandomForest => "Random Forest",
        }
    }

    pub fn supports(&self, task_type: TaskType) -> bool {
        task_type.candidates().contains(self)
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Per-candidate outcomes
// ============================================================================

/// Held-out score and timing of one candidate on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub candidate: CandidateKind,
    /// Accuracy or clamped R², always in `[0, 1]`.
    pub score: f64,
    /// Wall time of fit + predict on the train/test split.
    pub elapsed_seconds: f64,
}

/// Step at which a candidate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Fit,
    Predict,
    /// Refit on all known rows after winning selection.
    Refit,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fit => "fit",
            Self::Predict => "predict",
            Self::Refit => "refit",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFailure {
    pub candidate: CandidateKind,
    pub stage: FailureStage,
    pub message: String,
}

// ============================================================================
// Column and call reports
// ============================================================================

/// Outcome for a single target column.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ColumnStatus {
    /// Nulls were replaced by the winner's predictions.
    Imputed {
        winner: CandidateKind,
        score: f64,
        filled: usize,
    },
    /// Column had no missing values.
    Skipped,
    /// Column could not be processed and was left as is.
    Failed { error: ImputationError },
}

#[derive(Debug, Serialize)]
pub struct ColumnReport {
    pub column: String,
    /// Missing entries before imputation.
    pub missing: usize,
    /// Known entries available for training.
    pub known: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    /// Successful candidate evaluations, in evaluation order.
    pub evaluations: Vec<CandidateEvaluation>,
    pub failures: Vec<CandidateFailure>,
    pub status: ColumnStatus,
}

impl ColumnReport {
    pub(crate) fn new(column: impl Into<String>, missing: usize, known: usize) -> Self {
        Self {
            column: column.into(),
            missing,
            known,
            task_type: None,
            evaluations: Vec::new(),
            failures: Vec::new(),
            status: ColumnStatus::Skipped,
        }
    }

    pub fn is_imputed(&self) -> bool {
        matches!(self.status, ColumnStatus::Imputed { .. })
    }

    pub fn winner(&self) -> Option<CandidateKind> {
        match self.status {
            ColumnStatus::Imputed { winner, .. } => Some(winner),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ImputationError> {
        match &self.status {
            ColumnStatus::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Score of a candidate on this column, if it was evaluated successfully.
    pub fn score_of(&self, candidate: CandidateKind) -> Option<f64> {
        self.evaluations
            .iter()
            .find(|e| e.candidate == candidate)
            .map(|e| e.score)
    }
}

/// Result of an imputation call.
///
/// `table`, `overall_accuracy`, `score_by_model` and `time_by_model` form
/// the presentation contract; [`into_parts`](Self::into_parts) returns
/// exactly those four. `columns` adds per-column detail.
#[derive(Debug, Serialize)]
pub struct ImputationResult {
    #[serde(skip)]
    pub table: DataFrame,
    /// Winning score of the last successfully imputed column.
    pub overall_accuracy: Option<f64>,
    /// Held-out score per candidate, later columns replacing earlier ones.
    pub score_by_model: BTreeMap<CandidateKind, f64>,
    /// Fit + predict seconds per candidate, merged like `score_by_model`.
    pub time_by_model: BTreeMap<CandidateKind, f64>,
    pub columns: Vec<ColumnReport>,
    pub duration_ms: u64,
}

impl ImputationResult {
    pub fn into_parts(
        self,
    ) -> (
        DataFrame,
        Option<f64>,
        BTreeMap<CandidateKind, f64>,
        BTreeMap<CandidateKind, f64>,
    ) {
        (
            self.table,
            self.overall_accuracy,
            self.score_by_model,
            self.time_by_model,
        )
    }

    pub fn column(&self, name: &str) -> Option<&ColumnReport> {
        self.columns.iter().find(|c| c.column == name)
    }

    pub fn imputed_columns(&self) -> impl Iterator<Item = &ColumnReport> {
        self.columns.iter().filter(|c| c.is_imputed())
    }

    pub fn failed_columns(&self) -> impl Iterator<Item = &ColumnReport> {
        self.columns.iter().filter(|c| c.error().is_some())
    }
}

/// Missing-value statistics of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValueSummary {
    pub column: String,
    pub dtype: String,
    pub missing_count: usize,
    /// Share of missing entries, 0.0 - 100.0.
    pub missing_percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_priority_order() {
        let mut kinds = vec![
            CandidateKind::RandomForest,
            CandidateKind::LinearRegression,
            CandidateKind::LogisticRegression,
        ];
        kinds.sort();
        assert_eq!(kinds, CandidateKind::ALL.to_vec());
    }

    #[test]
    fn test_task_candidates() {
        assert!(CandidateKind::LinearRegression.supports(TaskType::Regression));
        assert!(!CandidateKind::LinearRegression.supports(TaskType::Classification));
        assert!(CandidateKind::LogisticRegression.supports(TaskType::Classification));
        assert!(CandidateKind::RandomForest.supports(TaskType::Classification));
        assert!(CandidateKind::RandomForest.supports(TaskType::Regression));
    }

    #[test]
    fn test_score_map_serializes_with_string_keys() {
        let mut scores = BTreeMap::new();
        scores.insert(CandidateKind::RandomForest, 0.9);
        scores.insert(CandidateKind::LinearRegression, 0.8);
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"linear_regression":0.8,"random_forest":0.9}"#);
    }

    #[test]
    fn test_column_status_serialization() {
        let mut report = ColumnReport::new("age", 3, 10);
        report.status = ColumnStatus::Failed {
            error: ImputationError::InsufficientFeatures {
                column: "age".to_string(),
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"]["status"], "failed");
        assert_eq!(json["status"]["error"]["code"], "INSUFFICIENT_FEATURES");
    }
}
