use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{
    LinearRegression, LinearRegressionParameters, LinearRegressionSolverName,
};

use super::{Candidate, TargetValues, guarded, model_failed, not_fitted, wrong_target};
use crate::error::{ImputationError, Result};
use crate::types::CandidateKind;

type Model = LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Ordinary least squares, solved with SVD so collinear features still fit.
#[derive(Debug, Default)]
pub struct LinearRegressionCandidate {
    model: Option<Model>,
}

impl LinearRegressionCandidate {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Candidate for LinearRegressionCandidate {
    fn kind(&self) -> CandidateKind {
        CandidateKind::LinearRegression
    }

    fn fit(&mut self, x: &DenseMatrix<f64>, y: &TargetValues) -> Result<()> {
        let kind = self.kind();
        let TargetValues::Continuous(y) = y else {
            return Err(wrong_target(kind));
        };
        // the SVD solve panics when rows do not exceed features plus intercept
        let (rows, cols) = x.shape();
        if rows <= cols {
            return Err(ImputationError::ModelFailed {
                candidate: kind,
                reason: format!("{rows} training row(s) for {cols} feature(s)"),
            });
        }
        let params =
            LinearRegressionParameters::default().with_solver(LinearRegressionSolverName::SVD);
        let model = guarded(kind, || {
            LinearRegression::fit(x, y, params).map_err(model_failed(kind))
        })?;
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &DenseMatrix<f64>) -> Result<TargetValues> {
        let kind = self.kind();
        let model = self.model.as_ref().ok_or_else(|| not_fitted(kind))?;
        let predictions = guarded(kind, || model.predict(x).map_err(model_failed(kind)))?;
        Ok(TargetValues::Continuous(predictions))
    }
}
