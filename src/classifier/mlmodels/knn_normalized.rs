//! K-nearest-neighbour model on z-score normalized feature vectors

use std::collections::HashMap;
use std::sync::Arc;

use super::{KnnModel, LabelledPoint, MlModel, ModelTrainer, TrainingData};
use crate::common::Vector;
use crate::config::DEFAULT_KNN_NEIGHBOUR_COUNT;
use crate::error::{CoreError, Result};
use crate::perception::filters::{mean, stddev};

/// Per-feature mean and standard deviation of the training set
#[derive(Debug, Clone, PartialEq)]
pub struct Normalization {
    mean: Vector,
    std: Vector,
}

impl Normalization {
    /// Fit on `points`, which must be non-empty and of equal size
    ///
    /// Features that never vary get a divisor of 1 instead of 0.
    fn fit(points: &[LabelledPoint]) -> Result<Self> {
        let size = points
            .first()
            .map(|p| p.vector.size())
            .ok_or(CoreError::InsufficientTrainingData)?;

        let mut means = Vec::with_capacity(size);
        let mut stds = Vec::with_capacity(size);
        for feature in 0..size {
            let column = points
                .iter()
                .map(|p| {
                    p.vector.get(feature).ok_or(CoreError::SizeMismatch {
                        op: "normalize",
                        left: p.vector.size(),
                        right: size,
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            let std = stddev(&column);
            means.push(mean(&column));
            stds.push(if std > 0.0 { std } else { 1.0 });
        }

        Ok(Normalization {
            mean: Vector::new(means),
            std: Vector::new(stds),
        })
    }

    pub fn apply(&self, vector: &Vector) -> Result<Vector> {
        vector.subtract(&self.mean)?.divide(&self.std)
    }
}

/// KNN whose stored points and live input are normalized per feature
#[derive(Debug, Clone)]
pub struct KnnNormalizedModel {
    normalization: Normalization,
    inner: KnnModel,
}

impl KnnNormalizedModel {
    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }
}

impl MlModel for KnnNormalizedModel {
    fn predict(&self, features: &[f64]) -> Result<Vec<f64>> {
        let live = self.normalization.apply(&Vector::from(features))?;
        self.inner.predict(live.values())
    }

    fn name(&self) -> &str {
        "KNN (normalized)"
    }

    fn number_of_classes(&self) -> usize {
        self.inner.number_of_classes()
    }
}

/// Trains a [`KnnNormalizedModel`]
#[derive(Debug, Clone)]
pub struct KnnNormalizedModelTrainer {
    k: usize,
}

impl KnnNormalizedModelTrainer {
    pub fn new(k: usize) -> Self {
        KnnNormalizedModelTrainer { k }
    }
}

impl Default for KnnNormalizedModelTrainer {
    fn default() -> Self {
        KnnNormalizedModelTrainer::new(DEFAULT_KNN_NEIGHBOUR_COUNT)
    }
}

impl ModelTrainer for KnnNormalizedModelTrainer {
    fn train_model(&self, data: &TrainingData) -> Result<Arc<dyn MlModel>> {
        let points = data.labelled_points();
        let normalization = Normalization::fit(&points)?;

        let normalized = points
            .into_iter()
            .map(|p| {
                Ok(LabelledPoint {
                    class_index: p.class_index,
                    vector: normalization.apply(&p.vector)?,
                })
            })
            .collect::<Result<Vec<LabelledPoint>>>()?;

        let inner = KnnModel::new(self.k, data.number_of_classes(), normalized)?;
        Ok(Arc::new(KnnNormalizedModel {
            normalization,
            inner,
        }))
    }

    fn name(&self) -> &str {
        "KNN (normalized)"
    }

    fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        if let Some(&k) = params.get("k") {
            if k < 1.0 || k.fract() != 0.0 {
                return Err(CoreError::InvalidParameter(format!(
                    "k must be a positive integer, got {}",
                    k
                )));
            }
            self.k = k as usize;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::mlmodels::{GestureClass, KnnModelTrainer};

    fn class(samples: &[[f64; 2]]) -> GestureClass {
        GestureClass {
            samples: samples.iter().map(|s| Vector::from(&s[..])).collect(),
        }
    }

    // The first feature spans thousands, the second spans units: raw KNN is
    // dominated by the first, normalized KNN weighs both equally.
    fn skewed() -> TrainingData {
        TrainingData::new(vec![
            class(&[[1000.0, 0.0], [1010.0, 0.1]]),
            class(&[[1040.0, 5.0], [1050.0, 5.1]]),
        ])
    }

    #[test]
    fn test_normalization_changes_the_neighbourhood() {
        let live = [1020.0, 5.0];

        let raw = KnnModelTrainer::new(1).train_model(&skewed()).unwrap();
        assert_eq!(raw.predict(&live).unwrap(), vec![1.0, 0.0]);

        let normalized = KnnNormalizedModelTrainer::new(1)
            .train_model(&skewed())
            .unwrap();
        assert_eq!(normalized.predict(&live).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_constant_feature_does_not_divide_by_zero() {
        let data = TrainingData::new(vec![
            class(&[[1.0, 7.0], [2.0, 7.0]]),
            class(&[[5.0, 7.0], [6.0, 7.0]]),
        ]);
        let model = KnnNormalizedModelTrainer::new(2).train_model(&data).unwrap();
        let confidences = model.predict(&[5.5, 7.0]).unwrap();
        assert!(confidences.iter().all(|c| c.is_finite()));
        assert_eq!(confidences, vec![0.0, 1.0]);
    }

    #[test]
    fn test_empty_training_set_fails() {
        let data = TrainingData::new(vec![GestureClass::default()]);
        assert!(matches!(
            KnnNormalizedModelTrainer::default().train_model(&data),
            Err(CoreError::InsufficientTrainingData)
        ));
    }
}
