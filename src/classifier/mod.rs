//! Classification: feature extraction, model prediction and confidence
//! publication

pub mod input;
pub mod mlmodels;
pub mod model;

pub use input::ClassifierInput;
pub use mlmodels::{
    GestureClass, KnnModel, KnnModelTrainer, KnnNormalizedModel, KnnNormalizedModelTrainer,
    LabelledPoint, MlModel, ModelTrainer, TrainingData,
};
pub use model::{Model, ModelData, TrainingStatus};

use crate::confidence::Confidences;
use crate::error::{CoreError, Result};
use crate::gestures::Gestures;
use crate::perception::FilterSet;

/// Runs the active model over an input window and stores one confidence per
/// gesture
#[derive(Debug, Clone)]
pub struct Classifier {
    model: Model,
    filters: FilterSet,
    gestures: Gestures,
    confidences: Confidences,
}

impl Classifier {
    pub fn new(model: Model, filters: FilterSet, gestures: Gestures, confidences: Confidences) -> Self {
        Classifier {
            model,
            filters,
            gestures,
            confidences,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Predict on `input` and publish the confidences in class-index order
    ///
    /// Returns the raw confidence vector.
    pub fn classify(&self, input: &ClassifierInput) -> Result<Vec<f64>> {
        let features = input.features(&self.filters)?;
        let predictions = self.model.predict(&features)?;

        let ids = self.gestures.ids();
        if predictions.len() != ids.len() {
            return Err(CoreError::SizeMismatch {
                op: "assign confidences to gestures with",
                left: predictions.len(),
                right: ids.len(),
            });
        }
        for (&id, &confidence) in ids.iter().zip(predictions.iter()) {
            self.confidences.set_confidence(id, confidence)?;
        }
        Ok(predictions)
    }
}
