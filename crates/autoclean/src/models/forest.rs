use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::{Candidate, TargetValues, guarded, model_failed, not_fitted, wrong_target};
use crate::error::Result;
use crate::types::{CandidateKind, TaskType};

type Regressor = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;
type Classifier = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

#[derive(Debug)]
enum Forest {
    Regressor(Regressor),
    Classifier(Classifier),
}

/// Seeded random forest, a regressor or a classifier depending on the task.
#[derive(Debug)]
pub struct RandomForestCandidate {
    task_type: TaskType,
    trees: usize,
    max_depth: Option<u16>,
    seed: u64,
    model: Option<Forest>,
}

impl RandomForestCandidate {
    pub fn new(task_type: TaskType, trees: usize, max_depth: Option<u16>, seed: u64) -> Self {
        Self {
            task_type,
            trees,
            max_depth,
            seed,
            model: None,
        }
    }
}

impl Candidate for RandomForestCandidate {
    fn kind(&self) -> CandidateKind {
        CandidateKind::RandomForest
    }

    fn fit(&mut self, x: &DenseMatrix<f64>, y: &TargetValues) -> Result<()> {
        let kind = self.kind();
        let forest = match (self.task_type, y) {
            (TaskType::Regression, TargetValues::Continuous(y)) => {
                let mut params = RandomForestRegressorParameters::default()
                    .with_n_trees(self.trees)
                    .with_seed(self.seed);
                if let Some(depth) = self.max_depth {
                    params = params.with_max_depth(depth);
                }
                let model = guarded(kind, || {
                    RandomForestRegressor::fit(x, y, params).map_err(model_failed(kind))
                })?;
                Forest::Regressor(model)
            }
            (TaskType::Classification, TargetValues::Classes(y)) => {
                // validated to fit in u16 by EngineConfig
                let trees = u16::try_from(self.trees).unwrap_or(u16::MAX);
                let mut params = RandomForestClassifierParameters::default()
                    .with_n_trees(trees)
                    .with_seed(self.seed);
                if let Some(depth) = self.max_depth {
                    params = params.with_max_depth(depth);
                }
                let model = guarded(kind, || {
                    RandomForestClassifier::fit(x, y, params).map_err(model_failed(kind))
                })?;
                Forest::Classifier(model)
            }
            _ => return Err(wrong_target(kind)),
        };
        self.model = Some(forest);
        Ok(())
    }

    fn predict(&self, x: &DenseMatrix<f64>) -> Result<TargetValues> {
        let kind = self.kind();
        match self.model.as_ref().ok_or_else(|| not_fitted(kind))? {
            Forest::Regressor(model) => {
                let predictions = guarded(kind, || model.predict(x).map_err(model_failed(kind)))?;
                Ok(TargetValues::Continuous(predictions))
            }
            Forest::Classifier(model) => {
                let predictions = guarded(kind, || model.predict(x).map_err(model_failed(kind)))?;
                Ok(TargetValues::Classes(predictions))
            }
        }
    }
}
