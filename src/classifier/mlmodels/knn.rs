//! K-nearest-neighbour model on raw (non-normalized) feature vectors

use std::collections::HashMap;
use std::sync::Arc;

use super::{LabelledPoint, MlModel, ModelTrainer, TrainingData};
use crate::common::Vector;
use crate::config::DEFAULT_KNN_NEIGHBOUR_COUNT;
use crate::error::{CoreError, Result};

/// KNN over stored points that keep their raw values
#[derive(Debug, Clone)]
pub struct KnnModel {
    k: usize,
    number_of_classes: usize,
    points: Vec<LabelledPoint>,
}

impl KnnModel {
    /// Create a model over `points`
    ///
    /// `k` must be at least 1 and at most the number of points.
    pub fn new(k: usize, number_of_classes: usize, points: Vec<LabelledPoint>) -> Result<Self> {
        if k == 0 {
            return Err(CoreError::InvalidParameter("k must be at least 1".to_string()));
        }
        if k > points.len() {
            return Err(CoreError::InvalidParameter(format!(
                "k ({}) exceeds the number of training points ({})",
                k,
                points.len()
            )));
        }
        if let Some(point) = points.iter().find(|p| p.class_index >= number_of_classes) {
            return Err(CoreError::InvalidParameter(format!(
                "class index {} is out of range for {} classes",
                point.class_index, number_of_classes
            )));
        }
        Ok(KnnModel {
            k,
            number_of_classes,
            points,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn points(&self) -> &[LabelledPoint] {
        &self.points
    }

    /// Rank the stored points by Euclidean distance to `live`
    ///
    /// The sort is stable, so equally distant points keep their training
    /// order.
    pub fn nearest(&self, live: &Vector) -> Result<Vec<&LabelledPoint>> {
        let mut ranked = self
            .points
            .iter()
            .map(|point| -> Result<(f64, &LabelledPoint)> {
                Ok((point.vector.distance(live)?, point))
            })
            .collect::<Result<Vec<_>>>()?;

        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(ranked.into_iter().take(self.k).map(|(_, p)| p).collect())
    }
}

impl MlModel for KnnModel {
    fn predict(&self, features: &[f64]) -> Result<Vec<f64>> {
        let live = Vector::from(features);
        let neighbours = self.nearest(&live)?;

        let mut confidences = vec![0.0; self.number_of_classes];
        for neighbour in &neighbours {
            confidences[neighbour.class_index] += 1.0;
        }
        for confidence in confidences.iter_mut() {
            *confidence /= self.k as f64;
        }

        log::debug!("KNN prediction: {:?}", confidences);
        Ok(confidences)
    }

    fn name(&self) -> &str {
        "KNN"
    }

    fn number_of_classes(&self) -> usize {
        self.number_of_classes
    }
}

/// Trains a [`KnnModel`]; points retain their raw values
#[derive(Debug, Clone)]
pub struct KnnModelTrainer {
    k: usize,
}

impl KnnModelTrainer {
    pub fn new(k: usize) -> Self {
        KnnModelTrainer { k }
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

impl Default for KnnModelTrainer {
    fn default() -> Self {
        KnnModelTrainer::new(DEFAULT_KNN_NEIGHBOUR_COUNT)
    }
}

impl ModelTrainer for KnnModelTrainer {
    fn train_model(&self, data: &TrainingData) -> Result<Arc<dyn MlModel>> {
        if data.number_of_samples() == 0 {
            return Err(CoreError::InsufficientTrainingData);
        }
        let model = KnnModel::new(self.k, data.number_of_classes(), data.labelled_points())?;
        Ok(Arc::new(model))
    }

    fn name(&self) -> &str {
        "KNN"
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
    use crate::classifier::mlmodels::GestureClass;

    fn class(samples: &[&[f64]]) -> GestureClass {
        GestureClass {
            samples: samples.iter().map(|s| Vector::from(*s)).collect(),
        }
    }

    fn three_class_fixture() -> TrainingData {
        TrainingData::new(vec![
            class(&[
                &[1.0, 1.0, 0.0, 0.0, 0.0, -2.0, 0.0, -3.0, 1.0],
                &[5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0],
            ]),
            class(&[
                &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                &[0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            ]),
            class(&[
                &[1.0, 1.0, 0.0, 0.0, 0.0, -2.0, 0.0, -3.0, -0.5],
                &[-5.0, -5.0, -5.0, -5.0, -5.0, -5.0, -5.0, -5.0, -5.0],
            ]),
        ])
    }

    #[test]
    fn test_three_class_fixture() {
        let model = KnnModelTrainer::new(2)
            .train_model(&three_class_fixture())
            .unwrap();

        assert_eq!(model.predict(&[0.0; 9]).unwrap(), vec![0.0, 1.0, 0.0]);
        assert_eq!(
            model
                .predict(&[1.0, 1.0, 0.0, 0.0, 0.0, -2.0, 0.0, -3.0, 0.0])
                .unwrap(),
            vec![0.5, 0.0, 0.5]
        );
    }

    #[test]
    fn test_confidences_sum_to_one() {
        let data = TrainingData::new(vec![
            class(&[&[0.0, 0.0], &[1.0, 0.0]]),
            class(&[&[0.0, 1.0]]),
        ]);
        let model = KnnModelTrainer::new(2).train_model(&data).unwrap();

        for live in [[0.0, 0.0], [0.9, 0.1], [0.0, 2.0], [-3.0, 7.0]] {
            let confidences = model.predict(&live).unwrap();
            assert_eq!(confidences.len(), 2);
            assert_eq!(confidences.iter().sum::<f64>(), 1.0);
            for c in confidences {
                assert!(c == 0.0 || c == 0.5 || c == 1.0);
            }
        }
    }

    #[test]
    fn test_ties_keep_training_order() {
        let data = TrainingData::new(vec![
            class(&[&[1.0]]),
            class(&[&[-1.0]]),
        ]);
        let model = KnnModelTrainer::new(1).train_model(&data).unwrap();
        assert_eq!(model.predict(&[0.0]).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_k_larger_than_training_set_fails() {
        let data = TrainingData::new(vec![class(&[&[0.0]]), class(&[&[1.0]])]);
        let result = KnnModelTrainer::new(3).train_model(&data);
        assert!(matches!(result, Err(CoreError::InvalidParameter(_))));
    }

    #[test]
    fn test_empty_training_set_fails() {
        let data = TrainingData::new(vec![GestureClass::default(), GestureClass::default()]);
        assert!(matches!(
            KnnModelTrainer::default().train_model(&data),
            Err(CoreError::InsufficientTrainingData)
        ));
    }

    #[test]
    fn test_live_vector_size_mismatch() {
        let data = TrainingData::new(vec![class(&[&[0.0, 0.0]])]);
        let model = KnnModelTrainer::new(1).train_model(&data).unwrap();
        assert!(matches!(
            model.predict(&[0.0]),
            Err(CoreError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_configure_k() {
        let mut trainer = KnnModelTrainer::default();
        let mut params = HashMap::new();
        params.insert("k".to_string(), 5.0);
        trainer.configure(&params).unwrap();
        assert_eq!(trainer.k(), 5);

        params.insert("k".to_string(), -1.0);
        assert!(trainer.configure(&params).is_err());
    }
}
