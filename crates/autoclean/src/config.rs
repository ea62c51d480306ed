//! Configuration for the imputation engine.
//!
//! Use [`EngineConfig::builder()`] for a validated configuration with a
//! fluent API, or deserialize one from JSON.

use serde::{Deserialize, Serialize};

use crate::error::ImputationError;
use crate::types::CandidateKind;

/// How feature columns with nulls inside the known rows are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FeatureMissingPolicy {
    /// Only use feature columns that are complete on the known rows.
    #[default]
    ExcludeIncomplete,
    /// Use every feature column, filling nulls with mean or mode.
    FillWithStatistics,
}

/// Which candidates the engine evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ModelSelection {
    /// Evaluate every candidate eligible for the task type and keep the best.
    #[default]
    Automatic,
    /// Evaluate and use a single candidate.
    Fixed(CandidateKind),
}

/// Configuration for [`ImputationEngine`](crate::engine::ImputationEngine).
///
/// # Example
///
/// ```rust,ignore
/// use autoclean::config::{EngineConfig, ModelSelection};
///
/// let config = EngineConfig::builder()
///     .seed(7)
///     .test_size(0.25)
///     .model_selection(ModelSelection::Automatic)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seed for the train/test shuffle and the random forests.
    /// Default: 42
    pub seed: u64,

    /// Share of known rows held out for scoring, exclusive (0.0 - 1.0).
    /// Default: 0.2
    pub test_size: f64,

    /// Minimum number of known rows needed to evaluate candidates.
    /// Default: 2
    pub min_known_rows: usize,

    /// Integral numeric columns with at most this many distinct values are
    /// treated as classification targets.
    /// Default: 10
    pub classification_max_cardinality: usize,

    /// Default: ExcludeIncomplete
    pub feature_missing_policy: FeatureMissingPolicy,

    /// Default: Automatic
    pub model_selection: ModelSelection,

    /// Break score ties by elapsed time before falling back to candidate
    /// priority. Timing is not reproducible across runs, so disable this
    /// when the winner must be deterministic.
    /// Default: true
    pub prefer_faster_on_tie: bool,

    /// Number of trees in the random forest candidate.
    /// Default: 100
    pub forest_trees: usize,

    /// Maximum tree depth, unlimited when `None`.
    /// Default: None
    pub forest_max_depth: Option<u16>,

    /// L2 penalty of the logistic regression candidate.
    /// Default: 0.0
    pub logistic_alpha: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_size: 0.2,
            min_known_rows: 2,
            classification_max_cardinality: 10,
            feature_missing_policy: FeatureMissingPolicy::default(),
            model_selection: ModelSelection::default(),
            prefer_faster_on_tie: true,
            forest_trees: 100,
            forest_max_depth: None,
            logistic_alpha: 0.0,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ConfigValidationError::InvalidFraction {
                field: "test_size".to_string(),
                value: self.test_size,
            });
        }

        if self.min_known_rows < 2 {
            return Err(ConfigValidationError::TooSmall {
                field: "min_known_rows".to_string(),
                value: self.min_known_rows,
                min: 2,
            });
        }

        if self.classification_max_cardinality < 2 {
            return Err(ConfigValidationError::TooSmall {
                field: "classification_max_cardinality".to_string(),
                value: self.classification_max_cardinality,
                min: 2,
            });
        }

        if self.forest_trees == 0 || self.forest_trees > u16::MAX as usize {
            return Err(ConfigValidationError::InvalidTreeCount(self.forest_trees));
        }

        if self.forest_max_depth == Some(0) {
            return Err(ConfigValidationError::TooSmall {
                field: "forest_max_depth".to_string(),
                value: 0,
                min: 1,
            });
        }

        if !self.logistic_alpha.is_finite() || self.logistic_alpha < 0.0 {
            return Err(ConfigValidationError::InvalidAlpha(self.logistic_alpha));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid fraction for '{field}': {value} (must be strictly between 0.0 and 1.0)")]
    InvalidFraction { field: String, value: f64 },

    #[error("Invalid value for '{field}': {value} (must be at least {min})")]
    TooSmall {
        field: String,
        value: usize,
        min: usize,
    },

    #[error("Invalid tree count: {0} (must be between 1 and 65535)")]
    InvalidTreeCount(usize),

    #[error("Invalid logistic alpha: {0} (must be finite and non-negative)")]
    InvalidAlpha(f64),
}

impl From<ConfigValidationError> for ImputationError {
    fn from(err: ConfigValidationError) -> Self {
        ImputationError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`EngineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    seed: Option<u64>,
    test_size: Option<f64>,
    min_known_rows: Option<usize>,
    classification_max_cardinality: Option<usize>,
    feature_missing_policy: Option<FeatureMissingPolicy>,
    model_selection: Option<ModelSelection>,
    prefer_faster_on_tie: Option<bool>,
    forest_trees: Option<usize>,
    forest_max_depth: Option<u16>,
    logistic_alpha: Option<f64>,
}

impl EngineConfigBuilder {
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the held-out share of known rows.
    ///
    /// # Arguments
    /// * `size` - Value strictly between 0.0 and 1.0 (e.g., 0.2 = 20%)
    #[must_use]
    pub fn test_size(mut self, size: f64) -> Self {
        self.test_size = Some(size);
        self
    }

    #[must_use]
    pub fn min_known_rows(mut self, rows: usize) -> Self {
        self.min_known_rows = Some(rows);
        self
    }

    #[must_use]
    pub fn classification_max_cardinality(mut self, cardinality: usize) -> Self {
        self.classification_max_cardinality = Some(cardinality);
        self
    }

    #[must_use]
    pub fn feature_missing_policy(mut self, policy: FeatureMissingPolicy) -> Self {
        self.feature_missing_policy = Some(policy);
        self
    }

    #[must_use]
    pub fn model_selection(mut self, selection: ModelSelection) -> Self {
        self.model_selection = Some(selection);
        self
    }

    /// Enable or disable the elapsed-time tie-break.
    #[must_use]
    pub fn prefer_faster_on_tie(mut self, prefer: bool) -> Self {
        self.prefer_faster_on_tie = Some(prefer);
        self
    }

    #[must_use]
    pub fn forest_trees(mut self, trees: usize) -> Self {
        self.forest_trees = Some(trees);
        self
    }

    #[must_use]
    pub fn forest_max_depth(mut self, depth: u16) -> Self {
        self.forest_max_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn logistic_alpha(mut self, alpha: f64) -> Self {
        self.logistic_alpha = Some(alpha);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `EngineConfig` or an error if validation fails.
    pub fn build(self) -> Result<EngineConfig, ConfigValidationError> {
        let defaults = EngineConfig::default();
        let config = EngineConfig {
            seed: self.seed.unwrap_or(defaults.seed),
            test_size: self.test_size.unwrap_or(defaults.test_size),
            min_known_rows: self.min_known_rows.unwrap_or(defaults.min_known_rows),
            classification_max_cardinality: self
                .classification_max_cardinality
                .unwrap_or(defaults.classification_max_cardinality),
            feature_missing_policy: self.feature_missing_policy.unwrap_or_default(),
            model_selection: self.model_selection.unwrap_or_default(),
            prefer_faster_on_tie: self
                .prefer_faster_on_tie
                .unwrap_or(defaults.prefer_faster_on_tie),
            forest_trees: self.forest_trees.unwrap_or(defaults.forest_trees),
            forest_max_depth: self.forest_max_depth.or(defaults.forest_max_depth),
            logistic_alpha: self.logistic_alpha.unwrap_or(defaults.logistic_alpha),
        };

        config.validate()?;
        Ok(config)
    }
}
