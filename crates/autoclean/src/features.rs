//! Feature assembly for a single target column.
//!
//! Every other column with a usable dtype becomes one numeric feature:
//! numbers pass through, labels are ordinal-encoded over their sorted
//! distinct values. Values always come from the caller's original table, so
//! imputing one column never feeds into the features of another.

use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::FeatureMissingPolicy;
use crate::error::{ImputationError, Result};
use crate::utils::{
    DtypeCategory, finite_mean, label_values, most_frequent, numeric_values,
    series_dtype_category, variance,
};

/// Dense, null-free features for every row of the table.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    names: Vec<String>,
    /// Row-major, one entry per table row.
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Assemble features to predict `target` from the rest of `df`.
    ///
    /// `known_rows` are the rows where the target is present; fill values
    /// and the constant-column check are computed on them only.
    pub fn build(
        df: &DataFrame,
        target: &str,
        known_rows: &[usize],
        policy: FeatureMissingPolicy,
    ) -> Result<Self> {
        let mut names = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();

        for col in df.get_columns() {
            let name = col.name().as_str();
            if name == target {
                continue;
            }
            let series = col.as_materialized_series();

            let raw = match series_dtype_category(series) {
                DtypeCategory::Numeric => numeric_values(series)?
                    .into_iter()
                    .map(|v| v.filter(|x| x.is_finite()))
                    .collect::<Vec<_>>(),
                DtypeCategory::Text | DtypeCategory::Boolean => encode_labels(series)?,
                DtypeCategory::Other => {
                    debug!("Feature '{}' skipped: unsupported dtype {}", name, series.dtype());
                    continue;
                }
            };

            let incomplete = known_rows.iter().any(|&i| raw[i].is_none());
            if incomplete && policy == FeatureMissingPolicy::ExcludeIncomplete {
                debug!("Feature '{}' skipped: nulls in known rows", name);
                continue;
            }

            let Some(fill) = fill_value(series, &raw, known_rows) else {
                debug!("Feature '{}' skipped: no known values", name);
                continue;
            };
            let values: Vec<f64> = raw.into_iter().map(|v| v.unwrap_or(fill)).collect();

            let on_known: Vec<f64> = known_rows.iter().map(|&i| values[i]).collect();
            if variance(&on_known) == 0.0 {
                debug!("Feature '{}' skipped: constant on known rows", name);
                continue;
            }

            names.push(name.to_string());
            columns.push(values);
        }

        if columns.is_empty() {
            return Err(ImputationError::InsufficientFeatures {
                column: target.to_string(),
            });
        }

        let rows = (0..df.height())
            .map(|i| columns.iter().map(|c| c[i]).collect())
            .collect();

        Ok(Self { names, rows })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Copy out the given rows.
    pub fn select(&self, rows: &[usize]) -> Vec<Vec<f64>> {
        rows.iter().map(|&i| self.rows[i].clone()).collect()
    }
}

/// Ordinal codes over the sorted distinct labels.
fn encode_labels(series: &Series) -> Result<Vec<Option<f64>>> {
    let labels = label_values(series)?;
    let codes: BTreeMap<&str, f64> = labels
        .iter()
        .flatten()
        .map(String::as_str)
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .enumerate()
        .map(|(code, label)| (label, code as f64))
        .collect();

    Ok(labels
        .iter()
        .map(|v| v.as_deref().and_then(|label| codes.get(label).copied()))
        .collect())
}

/// Mean for numbers, most frequent code for labels, over the known rows.
fn fill_value(series: &Series, raw: &[Option<f64>], known_rows: &[usize]) -> Option<f64> {
    let present: Vec<f64> = known_rows.iter().filter_map(|&i| raw[i]).collect();
    match series_dtype_category(series) {
        DtypeCategory::Numeric => finite_mean(&present),
        _ => {
            // codes are small non-negative integers
            let codes: Vec<u64> = present.iter().map(|&c| c as u64).collect();
            most_frequent(&codes).map(|c| c as f64)
        }
    }
}

/// Z-score scaling fitted on one set of rows and applied to others.
#[derive(Debug, Clone)]
pub struct Standardizer {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl Standardizer {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let n = rows.len().max(1) as f64;

        let means: Vec<f64> = (0..width)
            .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n)
            .collect();
        let stds = (0..width)
            .map(|j| {
                let var = rows.iter().map(|r| (r[j] - means[j]).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std > 0.0 { std } else { 1.0 }
            })
            .collect();

        Self { means, stds }
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|r| {
                r.iter()
                    .zip(self.means.iter().zip(&self.stds))
                    .map(|(v, (mean, std))| (v - mean) / std)
                    .collect()
            })
            .collect()
    }
}
