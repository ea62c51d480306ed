//! Synthetic missing-value injection.
//!
//! Used to benchmark imputation: knock out a known share of entries, impute
//! them back, compare. The injector never touches the input table; it returns
//! a modified copy.

use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use tracing::{debug, info};

use crate::error::{ImputationError, Result, ResultExt};

/// Randomly replaces a fraction of entries in target columns with nulls.
///
/// Positions are drawn uniformly without replacement from a seeded
/// generator, so a fixed seed always nulls the same rows.
#[derive(Debug, Clone)]
pub struct MissingValueInjector {
    seed: u64,
}

impl Default for MissingValueInjector {
    fn default() -> Self {
        Self::new(42)
    }
}

impl MissingValueInjector {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Number of entries nulled per column for a given height.
    pub fn injected_count(rows: usize, fraction: f64) -> usize {
        ((fraction * rows as f64).round() as usize).min(rows)
    }

    /// Null `round(fraction * rows)` distinct entries in each target column.
    ///
    /// Entries that are already null may be drawn again, so a column with
    /// prior nulls can end up with fewer than `rows` distinct new ones.
    pub fn inject(
        &self,
        df: &DataFrame,
        target_columns: &[String],
        fraction: f64,
    ) -> Result<DataFrame> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ImputationError::InvalidFraction {
                name: "missing fraction",
                value: fraction,
            });
        }
        if df.height() == 0 {
            return Err(ImputationError::EmptyTable);
        }
        if target_columns.is_empty() {
            return Err(ImputationError::InvalidInput(
                "no target columns given".to_string(),
            ));
        }
        for name in target_columns {
            if df.column(name).is_err() {
                return Err(ImputationError::ColumnNotFound(name.clone()));
            }
        }

        let rows = df.height();
        let count = Self::injected_count(rows, fraction);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut result = df.clone();

        info!(
            "Injecting {} missing values into each of {} column(s)",
            count,
            target_columns.len()
        );

        for name in target_columns {
            let positions = index::sample(&mut rng, rows, count);
            let mut drop = vec![false; rows];
            for pos in positions.iter() {
                drop[pos] = true;
            }

            // gathering with a null index yields a null, whatever the dtype
            let idx: IdxCa = drop
                .iter()
                .enumerate()
                .map(|(i, &nulled)| (!nulled).then_some(i as IdxSize))
                .collect();

            let series = result.column(name)?.as_materialized_series().clone();
            let injected = series.take(&idx)?;
            debug!(
                "Column '{}': {} -> {} nulls",
                name,
                series.null_count(),
                injected.null_count()
            );
            result
                .replace(name, injected)
                .context(format!("Failed to inject into column '{name}'"))?;
        }

        Ok(result)
    }
}

/// Inject missing values with a one-off injector.
pub fn inject_missing_values(
    df: &DataFrame,
    target_columns: &[String],
    fraction: f64,
    seed: u64,
) -> Result<DataFrame> {
    MissingValueInjector::new(seed).inject(df, target_columns, fraction)
}

static_assertions::assert_impl_all!(MissingValueInjector: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        let ids: Vec<i64> = (0..50).collect();
        let values: Vec<f64> = (0..50).map(|i| i as f64 * 1.5).collect();
        let labels: Vec<&str> = (0..50).map(|i| if i % 2 == 0 { "a" } else { "b" }).collect();
        df![
            "id" => ids,
            "value" => values,
            "label" => labels,
        ]
        .unwrap()
    }

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // =========================================================================
    // inject() tests
    // =========================================================================

    #[test]
    fn test_inject_exact_count_per_column() {
        let df = sample_df();
        let result = MissingValueInjector::new(1)
            .inject(&df, &targets(&["value", "label"]), 0.2)
            .unwrap();

        assert_eq!(result.height(), 50);
        assert_eq!(result.column("value").unwrap().null_count(), 10);
        assert_eq!(result.column("label").unwrap().null_count(), 10);
        assert_eq!(result.column("id").unwrap().null_count(), 0);
    }

    #[test]
    fn test_inject_leaves_other_entries_untouched() {
        let df = sample_df();
        let result = MissingValueInjector::new(3)
            .inject(&df, &targets(&["value"]), 0.3)
            .unwrap();

        assert!(result.column("id").unwrap().as_materialized_series().equals_missing(
            df.column("id").unwrap().as_materialized_series()
        ));

        let before = df.column("value").unwrap().f64().unwrap().clone();
        let after = result.column("value").unwrap().f64().unwrap().clone();
        for (b, a) in before.into_iter().zip(after.into_iter()) {
            if let Some(a) = a {
                assert_eq!(Some(a), b);
            }
        }
    }

    #[test]
    fn test_inject_does_not_mutate_input() {
        let df = sample_df();
        let original = df.clone();
        let _ = MissingValueInjector::new(1)
            .inject(&df, &targets(&["value"]), 0.5)
            .unwrap();
        assert!(df.equals_missing(&original));
    }

    #[test]
    fn test_inject_is_reproducible_with_seed() {
        let df = sample_df();
        let a = inject_missing_values(&df, &targets(&["value"]), 0.2, 9).unwrap();
        let b = inject_missing_values(&df, &targets(&["value"]), 0.2, 9).unwrap();
        assert!(a.equals_missing(&b));
    }

    #[test]
    fn test_inject_zero_and_full_fraction() {
        let df = sample_df();
        let none = inject_missing_values(&df, &targets(&["value"]), 0.0, 1).unwrap();
        assert!(none.equals_missing(&df));

        let all = inject_missing_values(&df, &targets(&["label"]), 1.0, 1).unwrap();
        assert_eq!(all.column("label").unwrap().null_count(), 50);
    }

    #[test]
    fn test_inject_preserves_dtype() {
        let df = sample_df();
        let result = inject_missing_values(&df, &targets(&["id", "label"]), 0.1, 1).unwrap();
        assert_eq!(result.column("id").unwrap().dtype(), &DataType::Int64);
        assert_eq!(result.column("label").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_inject_rounds_count() {
        assert_eq!(MissingValueInjector::injected_count(10, 0.25), 3);
        assert_eq!(MissingValueInjector::injected_count(10, 0.24), 2);
        assert_eq!(MissingValueInjector::injected_count(7, 1.0), 7);
    }

    #[test]
    fn test_inject_rejects_bad_input() {
        let df = sample_df();
        assert!(matches!(
            inject_missing_values(&df, &targets(&["value"]), 1.5, 1),
            Err(ImputationError::InvalidFraction { .. })
        ));
        assert!(matches!(
            inject_missing_values(&df, &targets(&["missing"]), 0.2, 1),
            Err(ImputationError::ColumnNotFound(_))
        ));
        assert!(matches!(
            inject_missing_values(&df, &[], 0.2, 1),
            Err(ImputationError::InvalidInput(_))
        ));
        assert!(matches!(
            inject_missing_values(&df.head(Some(0)), &targets(&["value"]), 0.2, 1),
            Err(ImputationError::EmptyTable)
        ));
    }
}
