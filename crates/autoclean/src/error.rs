//! Error types for missing-value injection and imputation model selection.
//!
//! Errors come in two scopes. Call-scoped errors (unknown column, empty
//! table, bad configuration) abort the whole call and are returned as `Err`.
//! Column-scoped errors only stop work on a single target column; the engine
//! records them in the column's report and moves on.
//!
//! Errors are serializable as `{ "code", "message" }` so presentation layers
//! can render them without matching on variants.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::types::{CandidateFailure, CandidateKind, TaskType};

/// The main error type for injection and imputation.
#[derive(Error, Debug)]
pub enum ImputationError {
    /// Target column has no non-missing values to learn from.
    #[error("Column '{column}' has no known values to train on")]
    NoGroundTruth { column: String },

    /// Target column has too few known values for a train/test split.
    #[error("Column '{column}' has {known} known value(s), at least {required} required")]
    InsufficientGroundTruth {
        column: String,
        known: usize,
        required: usize,
    },

    /// No other column can serve as a predictor.
    #[error("No usable feature columns to predict '{column}'")]
    InsufficientFeatures { column: String },

    /// Column dtype is neither numeric nor categorical.
    #[error("Cannot infer a task type for column '{column}' with dtype {dtype}")]
    UnsupportedTaskType { column: String, dtype: String },

    /// Every eligible candidate failed during evaluation or refit.
    #[error("All candidates failed for column '{column}': {}", format_failures(.failures))]
    AllCandidatesFailed {
        column: String,
        failures: Vec<CandidateFailure>,
    },

    /// A fixed model choice does not fit the column's task type.
    #[error("{candidate} cannot be used for {task_type} on column '{column}'")]
    CandidateNotApplicable {
        column: String,
        candidate: CandidateKind,
        task_type: TaskType,
    },

    /// An estimator rejected its input or could not converge.
    #[error("{candidate} failed: {reason}")]
    ModelFailed {
        candidate: CandidateKind,
        reason: String,
    },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Table has no rows.
    #[error("Table is empty")]
    EmptyTable,

    /// A fraction argument is outside its allowed range.
    #[error("Invalid {name}: {value}")]
    InvalidFraction { name: &'static str, value: f64 },

    /// Malformed call arguments.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Internal error (e.g., an estimator panicked).
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ImputationError>,
    },
}

fn format_failures(failures: &[CandidateFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({}): {}", f.candidate, f.stage, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ImputationError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ImputationError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for presentation layers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoGroundTruth { .. } => "NO_GROUND_TRUTH",
            Self::InsufficientGroundTruth { .. } => "INSUFFICIENT_GROUND_TRUTH",
            Self::InsufficientFeatures { .. } => "INSUFFICIENT_FEATURES",
            Self::UnsupportedTaskType { .. } => "UNSUPPORTED_TASK_TYPE",
            Self::AllCandidatesFailed { .. } => "ALL_CANDIDATES_FAILED",
            Self::CandidateNotApplicable { .. } => "CANDIDATE_NOT_APPLICABLE",
            Self::ModelFailed { .. } => "MODEL_FAILED",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::EmptyTable => "EMPTY_TABLE",
            Self::InvalidFraction { .. } => "INVALID_FRACTION",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether this error only affects a single target column.
    ///
    /// Column-scoped errors are collected into the column report instead of
    /// aborting the call.
    pub fn is_column_scoped(&self) -> bool {
        match self {
            Self::NoGroundTruth { .. }
            | Self::InsufficientGroundTruth { .. }
            | Self::InsufficientFeatures { .. }
            | Self::UnsupportedTaskType { .. }
            | Self::AllCandidatesFailed { .. }
            | Self::CandidateNotApplicable { .. } => true,
            Self::WithContext { source, .. } => source.is_column_scoped(),
            _ => false,
        }
    }
}

impl Serialize for ImputationError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ImputationError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for imputation operations.
pub type Result<T> = std::result::Result<T, ImputationError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ImputationError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FailureStage;

    #[test]
    fn test_error_code() {
        assert_eq!(ImputationError::EmptyTable.error_code(), "EMPTY_TABLE");
        assert_eq!(
            ImputationError::NoGroundTruth {
                column: "age".to_string()
            }
            .error_code(),
            "NO_GROUND_TRUTH"
        );
    }

    #[test]
    fn test_is_column_scoped() {
        assert!(
            ImputationError::InsufficientFeatures {
                column: "age".to_string()
            }
            .is_column_scoped()
        );
        assert!(!ImputationError::ColumnNotFound("age".to_string()).is_column_scoped());
        assert!(!ImputationError::EmptyTable.is_column_scoped());
    }

    #[test]
    fn test_error_serialization() {
        let error = ImputationError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_all_candidates_failed_message_lists_failures() {
        let error = ImputationError::AllCandidatesFailed {
            column: "species".to_string(),
            failures: vec![CandidateFailure {
                candidate: CandidateKind::LogisticRegression,
                stage: FailureStage::Fit,
                message: "singular matrix".to_string(),
            }],
        };
        let message = error.to_string();
        assert!(message.contains("species"));
        assert!(message.contains("Logistic Regression"));
        assert!(message.contains("singular matrix"));
    }

    #[test]
    fn test_with_context() {
        let error = ImputationError::NoGroundTruth {
            column: "age".to_string(),
        }
        .with_context("While imputing");
        assert!(error.to_string().contains("While imputing"));
        assert_eq!(error.error_code(), "NO_GROUND_TRUTH");
        assert!(error.is_column_scoped());
    }
}
