//! Automatic imputation model selection for tabular data.
//!
//! # Overview
//!
//! Given a [`polars`] DataFrame with missing values in some target columns,
//! the engine decides per column whether filling it is a classification or a
//! regression problem, scores every eligible candidate model on held-out
//! known values, and fills the nulls with the best one.
//!
//! - **Imputation Engine**: task-type inference, held-out scoring, winner
//!   selection and fill ([`ImputationEngine`])
//! - **Missing-Value Injector**: knock out a known share of entries to
//!   benchmark imputation ([`MissingValueInjector`])
//! - **Profiling**: per-column missing-value scan ([`profiler::scan_missing`])
//! - **Progress Reporting**: stage updates through [`ProgressReporter`]
//!
//! Candidates are linear regression, logistic regression and random forest,
//! trained with `smartcore`.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use autoclean::{ImputationEngine, inject_missing_values};
//! use polars::prelude::*;
//!
//! let df = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("iris.csv".into()))?
//!     .finish()?;
//!
//! let targets = vec!["sepal_length".to_string(), "species".to_string()];
//! let with_gaps = inject_missing_values(&df, &targets, 0.2, 42)?;
//!
//! let result = ImputationEngine::default().select_and_impute(&with_gaps, &targets)?;
//! for column in &result.columns {
//!     println!("{}: {:?}", column.column, column.winner());
//! }
//! let (table, accuracy, scores, times) = result.into_parts();
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use autoclean::config::*;
//!
//! let config = EngineConfig::builder()
//!     .seed(7)
//!     .test_size(0.25)                            // hold out 25% of known rows
//!     .classification_max_cardinality(10)         // <= 10 integral values -> classes
//!     .feature_missing_policy(FeatureMissingPolicy::ExcludeIncomplete)
//!     .prefer_faster_on_tie(false)                // fully deterministic winners
//!     .build()?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod injector;
pub mod models;
pub mod profiler;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    ConfigValidationError, EngineConfig, EngineConfigBuilder, FeatureMissingPolicy,
    ModelSelection,
};
pub use engine::{
    ClosureProgressReporter, ImputationEngine, ImputationEngineBuilder, ImputationStage,
    ProgressReporter, ProgressUpdate, select_and_impute,
};
pub use error::{ImputationError, Result as ImputeResult, ResultExt};
pub use injector::{MissingValueInjector, inject_missing_values};
pub use profiler::{columns_with_missing, infer_task_type, scan_missing};
pub use types::{
    CandidateEvaluation, CandidateFailure, CandidateKind, ColumnReport, ColumnStatus,
    FailureStage, ImputationResult, MissingValueSummary, TaskType,
};
