//! Classification vs regression decision for a target column.

use polars::prelude::*;

use crate::error::{ImputationError, Result};
use crate::types::TaskType;
use crate::utils::{DtypeCategory, numeric_values, series_dtype_category};

/// Decide how a target column should be learned.
///
/// Labels (strings, categoricals, booleans) are classification targets.
/// Numeric columns are classification targets only when every known value
/// is integral and there are at most `max_cardinality` distinct values;
/// everything else numeric is regression.
pub fn infer_task_type(series: &Series, max_cardinality: usize) -> Result<TaskType> {
    match series_dtype_category(series) {
        DtypeCategory::Text | DtypeCategory::Boolean => Ok(TaskType::Classification),
        DtypeCategory::Numeric => {
            let known = series.drop_nulls();
            let integral = numeric_values(&known)?
                .into_iter()
                .flatten()
                .all(|v| v.is_finite() && v.fract() == 0.0);

            if integral && known.n_unique()? <= max_cardinality {
                Ok(TaskType::Classification)
            } else {
                Ok(TaskType::Regression)
            }
        }
        DtypeCategory::Other => Err(ImputationError::UnsupportedTaskType {
            column: series.name().to_string(),
            dtype: series.dtype().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_is_classification() {
        let s = Series::new("species".into(), &[Some("setosa"), None, Some("virginica")]);
        assert_eq!(infer_task_type(&s, 10).unwrap(), TaskType::Classification);
    }

    #[test]
    fn test_boolean_is_classification() {
        let s = Series::new("flag".into(), &[Some(true), Some(false), None]);
        assert_eq!(infer_task_type(&s, 10).unwrap(), TaskType::Classification);
    }

    #[test]
    fn test_low_cardinality_integers_are_classification() {
        let s = Series::new("rings".into(), &[Some(1i64), Some(2), None, Some(3), Some(1)]);
        assert_eq!(infer_task_type(&s, 10).unwrap(), TaskType::Classification);
    }

    #[test]
    fn test_high_cardinality_integers_are_regression() {
        let values: Vec<i64> = (0..20).collect();
        let s = Series::new("age".into(), values);
        assert_eq!(infer_task_type(&s, 10).unwrap(), TaskType::Regression);
        assert_eq!(infer_task_type(&s, 20).unwrap(), TaskType::Classification);
    }

    #[test]
    fn test_integral_floats_follow_cardinality() {
        let s = Series::new("grade".into(), &[Some(1.0), Some(2.0), None, Some(1.0)]);
        assert_eq!(infer_task_type(&s, 10).unwrap(), TaskType::Classification);
    }

    #[test]
    fn test_fractional_floats_are_regression() {
        let s = Series::new("weight".into(), &[Some(0.5), Some(1.0), Some(1.0)]);
        assert_eq!(infer_task_type(&s, 10).unwrap(), TaskType::Regression);
    }

    #[test]
    fn test_unsupported_dtype() {
        let s = Series::new("day".into(), &[Some(1i32), Some(2)])
            .cast(&DataType::Date)
            .unwrap();
        let err = infer_task_type(&s, 10).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_TASK_TYPE");
    }
}
