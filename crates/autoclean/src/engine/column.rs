//! Imputation of a single target column.

use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::progress::ImputationStage;
use super::selection::{rank, score};
use crate::config::{EngineConfig, ModelSelection};
use crate::error::{ImputationError, Result};
use crate::features::{FeatureMatrix, Standardizer};
use crate::models::{TargetValues, create_candidate, to_matrix};
use crate::profiler::infer_task_type;
use crate::types::{
    CandidateEvaluation, CandidateFailure, CandidateKind, ColumnReport, ColumnStatus,
    FailureStage, TaskType,
};
use crate::utils::{label_values, null_positions, numeric_values};

/// Known target values in model form.
struct EncodedTarget {
    /// One entry per known row, in known-row order.
    values: TargetValues,
    /// For classification: a row holding each class code's label.
    representatives: Vec<usize>,
}

/// Imputes target columns of one table.
///
/// Reads features from `df` only, so columns can be processed in any order
/// with the same result.
pub(crate) struct ColumnImputer<'a> {
    df: &'a DataFrame,
    config: &'a EngineConfig,
}

impl<'a> ColumnImputer<'a> {
    pub(crate) fn new(df: &'a DataFrame, config: &'a EngineConfig) -> Self {
        Self { df, config }
    }

    /// Impute one column.
    ///
    /// Returns the column report and, when imputed, the filled column.
    /// Column-scoped failures end up in the report; anything else is
    /// returned as an error.
    pub(crate) fn impute(
        &self,
        name: &str,
        on_stage: &dyn Fn(ImputationStage),
    ) -> Result<(ColumnReport, Option<Series>)> {
        let series = self.df.column(name)?.as_materialized_series();
        let known = null_positions(series, false);
        let unknown = null_positions(series, true);
        let mut report = ColumnReport::new(name, unknown.len(), known.len());

        if unknown.is_empty() {
            debug!("Column '{}' has no missing values, skipping", name);
            return Ok((report, None));
        }

        match self.fill(series, &known, &unknown, &mut report, on_stage) {
            Ok((winner, filled)) => {
                let score = report.score_of(winner).unwrap_or(0.0);
                info!(
                    "Column '{}': {} filled {} value(s) (score {:.4})",
                    name,
                    winner,
                    unknown.len(),
                    score
                );
                report.status = ColumnStatus::Imputed {
                    winner,
                    score,
                    filled: unknown.len(),
                };
                Ok((report, Some(filled)))
            }
            Err(error) if error.is_column_scoped() => {
                warn!("Column '{}' not imputed: {}", name, error);
                report.status = ColumnStatus::Failed { error };
                Ok((report, None))
            }
            Err(error) => Err(error),
        }
    }

    fn fill(
        &self,
        series: &Series,
        known: &[usize],
        unknown: &[usize],
        report: &mut ColumnReport,
        on_stage: &dyn Fn(ImputationStage),
    ) -> Result<(CandidateKind, Series)> {
        let name = series.name().as_str();

        if known.is_empty() {
            return Err(ImputationError::NoGroundTruth {
                column: name.to_string(),
            });
        }
        if known.len() < self.config.min_known_rows {
            return Err(ImputationError::InsufficientGroundTruth {
                column: name.to_string(),
                known: known.len(),
                required: self.config.min_known_rows,
            });
        }

        let task_type = infer_task_type(series, self.config.classification_max_cardinality)?;
        report.task_type = Some(task_type);
        let candidates = self.candidates_for(name, task_type)?;

        let features =
            FeatureMatrix::build(self.df, name, known, self.config.feature_missing_policy)?;
        debug!(
            "Column '{}' ({}): {} known, {} unknown, features {:?}",
            name,
            task_type,
            known.len(),
            unknown.len(),
            features.names()
        );

        let target = encode_target(series, known, task_type)?;

        on_stage(ImputationStage::Evaluating);
        let (train, test) = self.split(known.len());
        let known_rows = features.select(known);
        let train_rows: Vec<Vec<f64>> = train.iter().map(|&i| known_rows[i].clone()).collect();
        let test_rows: Vec<Vec<f64>> = test.iter().map(|&i| known_rows[i].clone()).collect();
        let scaler = Standardizer::fit(&train_rows);
        let x_train = to_matrix(&scaler.transform(&train_rows))?;
        let x_test = to_matrix(&scaler.transform(&test_rows))?;
        let y_train = target.values.select(&train);
        let y_test = target.values.select(&test);

        for &kind in &candidates {
            match self.evaluate(kind, task_type, &x_train, &y_train, &x_test, &y_test) {
                Ok(evaluation) => {
                    debug!(
                        "Column '{}': {} scored {:.4} in {:.3}s",
                        name, kind, evaluation.score, evaluation.elapsed_seconds
                    );
                    report.evaluations.push(evaluation);
                }
                Err(failure) => {
                    warn!(
                        "Column '{}': {} failed to {}: {}",
                        name, kind, failure.stage, failure.message
                    );
                    report.failures.push(failure);
                }
            }
        }

        if report.evaluations.is_empty() {
            return Err(ImputationError::AllCandidatesFailed {
                column: name.to_string(),
                failures: report.failures.clone(),
            });
        }

        on_stage(ImputationStage::Filling);
        let scaler = Standardizer::fit(&known_rows);
        let x_known = to_matrix(&scaler.transform(&known_rows))?;
        let x_unknown = to_matrix(&scaler.transform(&features.select(unknown)))?;

        for kind in rank(&report.evaluations, self.config.prefer_faster_on_tie) {
            let filled = self
                .refit(kind, task_type, &x_known, &target.values, &x_unknown, unknown.len())
                .and_then(|predictions| fill_unknown(kind, series, unknown, &predictions, &target));
            match filled {
                Ok(filled) => return Ok((kind, filled)),
                Err(failure) => {
                    warn!(
                        "Column '{}': {} failed to refit: {}",
                        name, kind, failure.message
                    );
                    report.failures.push(failure);
                }
            }
        }

        Err(ImputationError::AllCandidatesFailed {
            column: name.to_string(),
            failures: report.failures.clone(),
        })
    }

    fn candidates_for(&self, column: &str, task_type: TaskType) -> Result<Vec<CandidateKind>> {
        match self.config.model_selection {
            ModelSelection::Automatic => Ok(task_type.candidates().to_vec()),
            ModelSelection::Fixed(kind) if kind.supports(task_type) => Ok(vec![kind]),
            ModelSelection::Fixed(kind) => Err(ImputationError::CandidateNotApplicable {
                column: column.to_string(),
                candidate: kind,
                task_type,
            }),
        }
    }

    /// Seeded shuffle split of `0..n` into (train, test) positions.
    fn split(&self, n: usize) -> (Vec<usize>, Vec<usize>) {
        let mut positions: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        positions.shuffle(&mut rng);

        let test_len = ((self.config.test_size * n as f64).round() as usize).clamp(1, n - 1);
        let train = positions.split_off(test_len);
        (train, positions)
    }

    fn evaluate(
        &self,
        kind: CandidateKind,
        task_type: TaskType,
        x_train: &smartcore::linalg::basic::matrix::DenseMatrix<f64>,
        y_train: &TargetValues,
        x_test: &smartcore::linalg::basic::matrix::DenseMatrix<f64>,
        y_test: &TargetValues,
    ) -> std::result::Result<CandidateEvaluation, CandidateFailure> {
        let failure = |stage, message: String| CandidateFailure {
            candidate: kind,
            stage,
            message,
        };
        let mut model = create_candidate(kind, task_type, self.config).ok_or_else(|| {
            failure(FailureStage::Fit, format!("not available for {task_type}"))
        })?;

        let start = Instant::now();
        model
            .fit(x_train, y_train)
            .map_err(|e| failure(FailureStage::Fit, e.to_string()))?;
        let predicted = model
            .predict(x_test)
            .map_err(|e| failure(FailureStage::Predict, e.to_string()))?;
        let elapsed_seconds = start.elapsed().as_secs_f64();

        if predicted.len() != y_test.len() {
            return Err(failure(
                FailureStage::Predict,
                format!("expected {} predictions, got {}", y_test.len(), predicted.len()),
            ));
        }

        Ok(CandidateEvaluation {
            candidate: kind,
            score: score(y_test, &predicted),
            elapsed_seconds,
        })
    }

    fn refit(
        &self,
        kind: CandidateKind,
        task_type: TaskType,
        x_known: &smartcore::linalg::basic::matrix::DenseMatrix<f64>,
        y_known: &TargetValues,
        x_unknown: &smartcore::linalg::basic::matrix::DenseMatrix<f64>,
        expected: usize,
    ) -> std::result::Result<TargetValues, CandidateFailure> {
        let failure = |message: String| CandidateFailure {
            candidate: kind,
            stage: FailureStage::Refit,
            message,
        };
        let mut model = create_candidate(kind, task_type, self.config)
            .ok_or_else(|| failure(format!("not available for {task_type}")))?;
        model
            .fit(x_known, y_known)
            .map_err(|e| failure(e.to_string()))?;
        let predicted = model
            .predict(x_unknown)
            .map_err(|e| failure(e.to_string()))?;
        if predicted.len() != expected {
            return Err(failure(format!(
                "expected {} predictions, got {}",
                expected,
                predicted.len()
            )));
        }
        Ok(predicted)
    }
}

fn encode_target(series: &Series, known: &[usize], task_type: TaskType) -> Result<EncodedTarget> {
    match task_type {
        TaskType::Regression => {
            let values = numeric_values(series)?;
            let known_values = known.iter().filter_map(|&i| values[i]).collect();
            Ok(EncodedTarget {
                values: TargetValues::Continuous(known_values),
                representatives: Vec::new(),
            })
        }
        TaskType::Classification => {
            let labels = label_values(series)?;
            let classes: Vec<&str> = known
                .iter()
                .filter_map(|&i| labels[i].as_deref())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            let mut representatives = vec![usize::MAX; classes.len()];
            let mut codes = Vec::with_capacity(known.len());
            for &row in known {
                let label = labels[row].as_deref().unwrap_or_default();
                let code = classes.binary_search(&label).map_err(|_| {
                    ImputationError::Internal(format!("label '{label}' missing from class list"))
                })?;
                if representatives[code] == usize::MAX {
                    representatives[code] = row;
                }
                codes.push(code as i32);
            }

            Ok(EncodedTarget {
                values: TargetValues::Classes(codes),
                representatives,
            })
        }
    }
}

/// Write predictions into the unknown rows; every row must end up non-null.
fn fill_unknown(
    kind: CandidateKind,
    series: &Series,
    unknown: &[usize],
    predictions: &TargetValues,
    target: &EncodedTarget,
) -> std::result::Result<Series, CandidateFailure> {
    let failure = |message: String| CandidateFailure {
        candidate: kind,
        stage: FailureStage::Refit,
        message,
    };
    let filled =
        write_back(series, unknown, predictions, target).map_err(|e| failure(e.to_string()))?;
    match filled.null_count() {
        0 => Ok(filled),
        nulls => Err(failure(format!(
            "{nulls} prediction(s) cannot be stored as {}",
            series.dtype()
        ))),
    }
}

/// Representable range of an integer dtype, as `f64` values that cast back
/// without overflow.
fn integer_bounds(dtype: &DataType) -> Option<(f64, f64)> {
    let bounds = match dtype {
        DataType::Int8 => (i8::MIN as f64, i8::MAX as f64),
        DataType::Int16 => (i16::MIN as f64, i16::MAX as f64),
        DataType::Int32 => (i32::MIN as f64, i32::MAX as f64),
        // largest f64 values below 2^63 and 2^64
        DataType::Int64 => (i64::MIN as f64, 9_223_372_036_854_774_784.0),
        DataType::UInt8 => (0.0, u8::MAX as f64),
        DataType::UInt16 => (0.0, u16::MAX as f64),
        DataType::UInt32 => (0.0, u32::MAX as f64),
        DataType::UInt64 => (0.0, 18_446_744_073_709_549_568.0),
        _ => return None,
    };
    Some(bounds)
}

/// Fill the nulls of `series` with predictions, keeping its dtype.
///
/// Integer targets get rounded predictions clamped to the dtype's range.
/// Non-finite predictions stay null.
fn write_back(
    series: &Series,
    unknown: &[usize],
    predictions: &TargetValues,
    target: &EncodedTarget,
) -> Result<Series> {
    match predictions {
        TargetValues::Classes(codes) => {
            // gather each predicted class from a row that already holds it
            let mut idx: Vec<IdxSize> = (0..series.len() as IdxSize).collect();
            for (&row, &code) in unknown.iter().zip(codes) {
                let source = usize::try_from(code)
                    .ok()
                    .and_then(|c| target.representatives.get(c))
                    .ok_or_else(|| {
                        ImputationError::Internal(format!("predicted unknown class code {code}"))
                    })?;
                idx[row] = *source as IdxSize;
            }
            Ok(series.take_slice(&idx)?)
        }
        TargetValues::Continuous(values) => {
            let dtype = series.dtype();
            let bounds = integer_bounds(dtype);

            let mut filled: Vec<Option<f64>> = vec![None; series.len()];
            for (&row, &value) in unknown.iter().zip(values) {
                filled[row] = match bounds {
                    _ if !value.is_finite() => None,
                    Some((min, max)) => Some(value.round().clamp(min, max)),
                    None => Some(value),
                };
            }
            let predicted = Series::new(series.name().clone(), filled).cast(dtype)?;
            Ok(series.zip_with(&series.is_not_null(), &predicted)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_target_classes_are_sorted() {
        let s = Series::new("c".into(), &[Some("b"), None, Some("a"), Some("b")]);
        let encoded = encode_target(&s, &[0, 2, 3], TaskType::Classification).unwrap();
        assert_eq!(encoded.values, TargetValues::Classes(vec![1, 0, 1]));
        assert_eq!(encoded.representatives, vec![2, 0]);
    }

    #[test]
    fn test_write_back_classification_keeps_dtype() {
        let s = Series::new("c".into(), &[Some("b"), None, Some("a"), None]);
        let encoded = encode_target(&s, &[0, 2], TaskType::Classification).unwrap();
        let filled =
            write_back(&s, &[1, 3], &TargetValues::Classes(vec![0, 1]), &encoded).unwrap();

        assert_eq!(filled.dtype(), &DataType::String);
        let values: Vec<Option<&str>> = filled.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("b"), Some("a"), Some("a"), Some("b")]);
    }

    #[test]
    fn test_write_back_regression_rounds_integers() {
        let s = Series::new("n".into(), &[Some(1i64), None, Some(3)]);
        let encoded = encode_target(&s, &[0, 2], TaskType::Regression).unwrap();
        let filled =
            write_back(&s, &[1], &TargetValues::Continuous(vec![2.4]), &encoded).unwrap();

        assert_eq!(filled.dtype(), &DataType::Int64);
        let values: Vec<Option<i64>> = filled.i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_write_back_clamps_to_integer_range() {
        let s = Series::new("n".into(), &[Some(100i8), None, None]);
        let encoded = encode_target(&s, &[0], TaskType::Regression).unwrap();
        let filled = write_back(
            &s,
            &[1, 2],
            &TargetValues::Continuous(vec![300.0, -1000.4]),
            &encoded,
        )
        .unwrap();

        assert_eq!(filled.dtype(), &DataType::Int8);
        let values: Vec<Option<i8>> = filled.i8().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(100), Some(127), Some(-128)]);

        let s = Series::new("u".into(), &[Some(3u16), None]);
        let encoded = encode_target(&s, &[0], TaskType::Regression).unwrap();
        let filled =
            write_back(&s, &[1], &TargetValues::Continuous(vec![-2.0]), &encoded).unwrap();
        let values: Vec<Option<u16>> = filled.u16().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(3), Some(0)]);
    }

    #[test]
    fn test_fill_unknown_rejects_non_finite_predictions() {
        let s = Series::new("n".into(), &[Some(1i64), None, Some(3)]);
        let encoded = encode_target(&s, &[0, 2], TaskType::Regression).unwrap();
        let failure = fill_unknown(
            CandidateKind::LinearRegression,
            &s,
            &[1],
            &TargetValues::Continuous(vec![f64::NAN]),
            &encoded,
        )
        .unwrap_err();

        assert_eq!(failure.stage, FailureStage::Refit);
        assert!(failure.message.contains("cannot be stored"));

        let filled = fill_unknown(
            CandidateKind::LinearRegression,
            &s,
            &[1],
            &TargetValues::Continuous(vec![2.0]),
            &encoded,
        )
        .unwrap();
        assert_eq!(filled.null_count(), 0);
    }

    #[test]
    fn test_write_back_regression_float() {
        let s = Series::new("n".into(), &[None, Some(1.5)]);
        let encoded = encode_target(&s, &[1], TaskType::Regression).unwrap();
        let filled =
            write_back(&s, &[0], &TargetValues::Continuous(vec![0.25]), &encoded).unwrap();
        let values: Vec<Option<f64>> = filled.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(0.25), Some(1.5)]);
    }

    #[test]
    fn test_split_sizes() {
        let df = DataFrame::empty();
        let config = EngineConfig::default();
        let imputer = ColumnImputer::new(&df, &config);

        let (train, test) = imputer.split(80);
        assert_eq!(test.len(), 16);
        assert_eq!(train.len(), 64);

        let (train, test) = imputer.split(2);
        assert_eq!((train.len(), test.len()), (1, 1));

        let mut all: Vec<usize> = train.into_iter().chain(test).collect();
        all.sort();
        assert_eq!(all, vec![0, 1]);
    }
}
