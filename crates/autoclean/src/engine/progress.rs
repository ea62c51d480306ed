//! Progress reporting for imputation runs.
//!
//! Progress is informational only: the engine reports what it is doing
//! and never blocks on the reporter.
//!
//! # Example
//!
//! ```rust,ignore
//! use autoclean::ImputationEngine;
//!
//! let result = ImputationEngine::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .select_and_impute(&df, &targets)?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of an imputation run.
///
/// `Evaluating` and `Filling` repeat once per target column; overall
/// progress is split evenly between columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStage {
    /// Validating input and preparing targets
    Initializing,
    /// Scoring candidates on the held-out split
    Evaluating,
    /// Refitting the winner and filling nulls
    Filling,
    /// Run completed
    Complete,
    /// Run failed with a call-level error
    Failed,
}

impl ImputationStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::Evaluating => "Evaluating Candidates",
            Self::Filling => "Filling Values",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of a column's slice of progress at which this stage starts.
    fn column_offset(&self) -> f32 {
        match self {
            Self::Evaluating => 0.0,
            Self::Filling => 0.8,
            Self::Initializing | Self::Complete | Self::Failed => 0.0,
        }
    }
}

/// Detailed progress update with sub-stage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: ImputationStage,

    /// Target column being processed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    pub message: String,

    /// Columns finished so far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    /// Total target columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    /// Creates a progress update without column information.
    pub fn new(stage: ImputationStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            sub_stage: None,
            progress: 0.0,
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Creates a progress update for work on the column at `index` of `total`.
    pub fn for_column(
        stage: ImputationStage,
        column: impl Into<String>,
        index: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let progress = if total > 0 {
            (index as f32 + stage.column_offset()) / total as f32
        } else {
            0.0
        };
        Self {
            stage,
            sub_stage: Some(column.into()),
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: Some(index),
            items_total: Some(total),
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            progress: 1.0,
            ..Self::new(ImputationStage::Complete, message)
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(ImputationStage::Failed, message)
    }
}

/// Trait for receiving progress updates during imputation.
///
/// Implementations must be `Send + Sync` so an engine can be moved to a
/// worker thread while a UI thread consumes updates.
pub trait ProgressReporter: Send + Sync {
    /// Called at each stage change; keep it cheap and non-blocking.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(ImputationStage::Initializing, "Starting");
        assert_eq!(update.stage, ImputationStage::Initializing);
        assert!(update.sub_stage.is_none());
        assert_eq!(update.progress, 0.0);
        assert_eq!(update.message, "Starting");
    }

    #[test]
    fn test_progress_update_for_column() {
        let evaluating =
            ProgressUpdate::for_column(ImputationStage::Evaluating, "age", 1, 4, "Evaluating age");
        assert_eq!(evaluating.sub_stage, Some("age".to_string()));
        assert_eq!(evaluating.progress, 0.25);
        assert_eq!(evaluating.items_processed, Some(1));
        assert_eq!(evaluating.items_total, Some(4));

        let filling = ProgressUpdate::for_column(ImputationStage::Filling, "age", 1, 4, "Filling");
        assert!(filling.progress > evaluating.progress);
        assert!(filling.progress < 0.5);
    }

    #[test]
    fn test_progress_update_terminal() {
        assert_eq!(ProgressUpdate::complete("Done").progress, 1.0);
        assert_eq!(
            ProgressUpdate::failed("boom").stage,
            ImputationStage::Failed
        );
    }

    #[test]
    fn test_closure_progress_reporter() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let reporter = ClosureProgressReporter::new(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::new(ImputationStage::Initializing, "a"));
        reporter.report(ProgressUpdate::complete("b"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reporter_across_threads() {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let messages_clone = messages.clone();
        let reporter: Arc<dyn ProgressReporter> =
            Arc::new(ClosureProgressReporter::new(move |update: ProgressUpdate| {
                messages_clone.lock().unwrap().push(update.message);
            }));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let reporter = reporter.clone();
                std::thread::spawn(move || {
                    reporter.report(ProgressUpdate::new(
                        ImputationStage::Evaluating,
                        format!("thread {i}"),
                    ));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(messages.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&ImputationStage::Evaluating).unwrap();
        assert_eq!(json, "\"evaluating\"");
    }
}
