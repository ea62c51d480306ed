//! Imputation engine.
//!
//! This module provides the engine that selects and applies an imputation
//! model per target column, plus progress reporting.

mod builder;
mod column;
pub mod progress;
pub mod selection;

pub use builder::{ImputationEngine, ImputationEngineBuilder, select_and_impute};
pub use progress::{ClosureProgressReporter, ImputationStage, ProgressReporter, ProgressUpdate};
