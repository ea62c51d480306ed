//! The imputation engine and its builder.

use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use super::column::ColumnImputer;
use super::progress::{ClosureProgressReporter, ImputationStage, ProgressReporter, ProgressUpdate};
use crate::config::EngineConfig;
use crate::error::{ImputationError, Result, ResultExt};
use crate::types::ImputationResult;

/// Automatic imputation model selection.
///
/// For every target column the engine infers the task type, scores each
/// eligible candidate on a held-out split, refits the best one on all known
/// rows and fills the nulls with its predictions.
///
/// # Example
///
/// ```rust,ignore
/// use autoclean::{EngineConfig, ImputationEngine};
///
/// let engine = ImputationEngine::builder()
///     .config(EngineConfig::builder().seed(7).build()?)
///     .on_progress(|update| println!("{}", update.message))
///     .build()?;
///
/// let result = engine.select_and_impute(&df, &["age".to_string()])?;
/// let (table, accuracy, scores, times) = result.into_parts();
/// ```
pub struct ImputationEngine {
    config: EngineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(ImputationEngine: Send, Sync);

/// Engine with [`EngineConfig::default()`].
///
/// The default breaks score ties by elapsed time, so two runs on the same
/// seed can pick different winners when candidates tie. Build with
/// `prefer_faster_on_tie(false)` for run-to-run identical results.
impl Default for ImputationEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            progress_reporter: None,
        }
    }
}

impl ImputationEngine {
    /// Create an engine with a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            progress_reporter: None,
        })
    }

    pub fn builder() -> ImputationEngineBuilder {
        ImputationEngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fill the missing values of every target column.
    ///
    /// Column-level problems (no known values, no usable features, every
    /// candidate failing) are recorded in that column's report and leave the
    /// column as it was; the other columns are still processed.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty table, an unknown target column, or an
    /// unexpected polars failure.
    pub fn select_and_impute(
        &self,
        df: &DataFrame,
        target_columns: &[String],
    ) -> Result<ImputationResult> {
        match self.select_and_impute_internal(df, target_columns) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Imputed {} of {} column(s)",
                    result.imputed_columns().count(),
                    result.columns.len()
                )));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Imputation error: {}", e);
                Err(e)
            }
        }
    }

    /// Run imputation on the leading `sample_fraction` of rows.
    ///
    /// A quick preview of candidate scores before committing to the full
    /// table. The sample has `floor(sample_fraction * rows)` rows.
    pub fn performance_test(
        &self,
        df: &DataFrame,
        target_columns: &[String],
        sample_fraction: f64,
    ) -> Result<ImputationResult> {
        if !(sample_fraction > 0.0 && sample_fraction <= 1.0) {
            return Err(ImputationError::InvalidFraction {
                name: "sample fraction",
                value: sample_fraction,
            });
        }
        let rows = (sample_fraction * df.height() as f64).floor() as usize;
        info!(
            "Performance test on {} of {} row(s)",
            rows,
            df.height()
        );
        self.select_and_impute(&df.head(Some(rows)), target_columns)
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn select_and_impute_internal(
        &self,
        df: &DataFrame,
        target_columns: &[String],
    ) -> Result<ImputationResult> {
        let start_time = Instant::now();
        self.report_progress(ProgressUpdate::new(
            ImputationStage::Initializing,
            "Validating targets...",
        ));

        if df.height() == 0 {
            return Err(ImputationError::EmptyTable);
        }

        let mut seen = HashSet::new();
        let targets: Vec<&str> = target_columns
            .iter()
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .collect();
        for name in &targets {
            if df.column(name).is_err() {
                return Err(ImputationError::ColumnNotFound(name.to_string()));
            }
        }

        info!(
            "Imputing {} column(s) of a {}x{} table",
            targets.len(),
            df.height(),
            df.width()
        );

        let imputer = ColumnImputer::new(df, &self.config);
        let mut table = df.clone();
        let mut columns = Vec::with_capacity(targets.len());
        let mut overall_accuracy = None;
        let mut score_by_model = BTreeMap::new();
        let mut time_by_model = BTreeMap::new();

        for (index, name) in targets.iter().enumerate() {
            let on_stage = |stage: ImputationStage| {
                self.report_progress(ProgressUpdate::for_column(
                    stage,
                    *name,
                    index,
                    targets.len(),
                    format!("{} '{}'", stage.display_name(), name),
                ));
            };

            let (report, filled) = imputer.impute(name, &on_stage)?;

            if let Some(filled) = filled {
                table
                    .replace(name, filled)
                    .context(format!("Failed to write imputed column '{name}'"))?;
            }
            for evaluation in &report.evaluations {
                score_by_model.insert(evaluation.candidate, evaluation.score);
                time_by_model.insert(evaluation.candidate, evaluation.elapsed_seconds);
            }
            if let Some(winner) = report.winner() {
                overall_accuracy = report.score_of(winner);
            }
            debug!("Column '{}' done: {:?}", name, report.status);
            columns.push(report);
        }

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!("Imputation finished in {}ms", duration_ms);

        Ok(ImputationResult {
            table,
            overall_accuracy,
            score_by_model,
            time_by_model,
            columns,
            duration_ms,
        })
    }
}

/// Builder for [`ImputationEngine`].
#[derive(Default)]
pub struct ImputationEngineBuilder {
    config: Option<EngineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(ImputationEngineBuilder: Send);

impl ImputationEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during imputation.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    pub fn build(self) -> Result<ImputationEngine> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(ImputationEngine {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

/// Impute with the default configuration.
///
/// Score ties go to the faster candidate, which is not reproducible across
/// runs; use an engine built with `prefer_faster_on_tie(false)` when the
/// winner must be deterministic.
pub fn select_and_impute(df: &DataFrame, target_columns: &[String]) -> Result<ImputationResult> {
    ImputationEngine::default().select_and_impute(df, target_columns)
}
