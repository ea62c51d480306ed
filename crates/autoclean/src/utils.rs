//! Shared helpers over polars series.
//!
//! Everything the engine feeds to an estimator goes through these
//! conversions: numeric columns become `Vec<Option<f64>>`, label-like
//! columns become `Vec<Option<String>>`.

use polars::prelude::*;
use std::collections::BTreeMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type for imputation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Boolean type
    Boolean,
    /// String or categorical labels
    Text,
    /// Anything the estimators cannot consume (dates, lists, structs, ...)
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || matches!(dtype, DataType::Float32 | DataType::Float64)
}

#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
        DtypeCategory::Text
    } else {
        DtypeCategory::Other
    }
}

/// Get the dtype category of a Series.
pub fn series_dtype_category(series: &Series) -> DtypeCategory {
    get_dtype_category(series.dtype())
}

// =============================================================================
// Conversions
// =============================================================================

/// Numeric values of a series as `f64`, nulls preserved.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Values of a series rendered as label strings, nulls preserved.
pub fn label_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let cast = series.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Row positions where the series is (or is not) null.
pub fn null_positions(series: &Series, null: bool) -> Vec<usize> {
    let mask = series.is_null();
    mask.into_iter()
        .enumerate()
        .filter_map(|(i, is_null)| (is_null.unwrap_or(false) == null).then_some(i))
        .collect()
}

// =============================================================================
// Statistics
// =============================================================================

/// Arithmetic mean of finite values.
pub fn finite_mean<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Most frequent value, ties going to the smallest.
pub fn most_frequent<'a, T: Ord + Clone + 'a>(values: impl IntoIterator<Item = &'a T>) -> Option<T> {
    let mut counts: BTreeMap<&T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    // max_by_key keeps the last maximum; iterate in reverse so the smallest wins
    counts
        .into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(value, _)| value.clone())
}

/// Population variance of `values`.
pub fn variance(values: &[f64]) -> f64 {
    match finite_mean(values) {
        Some(mean) => values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64,
        None => 0.0,
    }
}

// =============================================================================
// Tests
// =============================================================================
