//! Dataset profiling for imputation.
//!
//! This module provides:
//! - A per-column missing-value scan
//! - Task-type inference for target columns

mod task_type;

use polars::prelude::*;

use crate::types::MissingValueSummary;

pub use task_type::infer_task_type;

/// Missing-value statistics for every column, in table order.
pub fn scan_missing(df: &DataFrame) -> Vec<MissingValueSummary> {
    let height = df.height();
    df.get_columns()
        .iter()
        .map(|col| {
            let missing_count = col.null_count();
            let missing_percentage = if height > 0 {
                (missing_count as f64 / height as f64) * 100.0
            } else {
                0.0
            };
            MissingValueSummary {
                column: col.name().to_string(),
                dtype: col.dtype().to_string(),
                missing_count,
                missing_percentage,
            }
        })
        .collect()
}

/// Names of the columns that contain at least one null.
pub fn columns_with_missing(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| col.null_count() > 0)
        .map(|col| col.name().to_string())
        .collect()
}
