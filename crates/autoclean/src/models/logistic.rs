use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};

use super::{Candidate, TargetValues, guarded, model_failed, not_fitted, wrong_target};
use crate::error::{ImputationError, Result};
use crate::types::CandidateKind;

type Model = LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Multinomial logistic regression with an optional L2 penalty.
#[derive(Debug)]
pub struct LogisticRegressionCandidate {
    alpha: f64,
    model: Option<Model>,
    /// Set when the training labels had a single class.
    constant: Option<i32>,
}

impl LogisticRegressionCandidate {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            model: None,
            constant: None,
        }
    }
}

impl Candidate for LogisticRegressionCandidate {
    fn kind(&self) -> CandidateKind {
        CandidateKind::LogisticRegression
    }

    fn fit(&mut self, x: &DenseMatrix<f64>, y: &TargetValues) -> Result<()> {
        let kind = self.kind();
        let TargetValues::Classes(y) = y else {
            return Err(wrong_target(kind));
        };
        let Some(&first) = y.first() else {
            return Err(ImputationError::ModelFailed {
                candidate: kind,
                reason: "no training rows".to_string(),
            });
        };

        // smartcore needs two classes; a single-class split predicts that class
        if y.iter().all(|&c| c == first) {
            self.model = None;
            self.constant = Some(first);
            return Ok(());
        }

        let params = LogisticRegressionParameters::default().with_alpha(self.alpha);
        let model = guarded(kind, || {
            LogisticRegression::fit(x, y, params).map_err(model_failed(kind))
        })?;
        self.model = Some(model);
        self.constant = None;
        Ok(())
    }

    fn predict(&self, x: &DenseMatrix<f64>) -> Result<TargetValues> {
        let kind = self.kind();
        if let Some(class) = self.constant {
            let (rows, _) = x.shape();
            return Ok(TargetValues::Classes(vec![class; rows]));
        }
        let model = self.model.as_ref().ok_or_else(|| not_fitted(kind))?;
        let predictions = guarded(kind, || model.predict(x).map_err(model_failed(kind)))?;
        Ok(TargetValues::Classes(predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::class_data;
    use crate::models::to_matrix;

    #[test]
    fn test_separates_classes() {
        let (x, y) = class_data();
        let matrix = to_matrix(&x).unwrap();
        let mut candidate = LogisticRegressionCandidate::new(0.0);
        candidate
            .fit(&matrix, &TargetValues::Classes(y.clone()))
            .unwrap();

        let TargetValues::Classes(predicted) = candidate.predict(&matrix).unwrap() else {
            panic!("expected class predictions");
        };
        let correct = predicted.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(correct as f64 / y.len() as f64 > 0.9);
    }

    #[test]
    fn test_single_class_predicts_that_class() {
        let (x, _) = class_data();
        let matrix = to_matrix(&x).unwrap();
        let mut candidate = LogisticRegressionCandidate::new(0.0);
        candidate
            .fit(&matrix, &TargetValues::Classes(vec![2; x.len()]))
            .unwrap();
        assert_eq!(
            candidate.predict(&matrix).unwrap(),
            TargetValues::Classes(vec![2; x.len()])
        );
    }

    #[test]
    fn test_rejects_continuous_targets() {
        let (x, _) = class_data();
        let matrix = to_matrix(&x).unwrap();
        let mut candidate = LogisticRegressionCandidate::new(0.0);
        assert!(
            candidate
                .fit(&matrix, &TargetValues::Continuous(vec![0.5; x.len()]))
                .is_err()
        );
    }
}
