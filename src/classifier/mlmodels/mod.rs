//! Trainable models with multiple algorithm implementations

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::common::types::ClassIndex;
use crate::common::Vector;
use crate::config::{MIN_GESTURES, MIN_RECORDINGS_PER_GESTURE};
use crate::error::Result;

pub mod knn;
pub mod knn_normalized;

pub use knn::{KnnModel, KnnModelTrainer};
pub use knn_normalized::{KnnNormalizedModel, KnnNormalizedModelTrainer};

/// A trained model mapping a feature vector to per-class confidences
pub trait MlModel: Debug + Send + Sync {
    /// One confidence in [0, 1] per class, in class-index order
    fn predict(&self, features: &[f64]) -> Result<Vec<f64>>;

    /// Get the name of this model
    fn name(&self) -> &str;

    fn number_of_classes(&self) -> usize;
}

/// Builds an [`MlModel`] from labelled feature vectors
pub trait ModelTrainer: Debug + Send + Sync {
    /// Train a fresh model; nothing is carried over from earlier runs
    fn train_model(&self, data: &TrainingData) -> Result<Arc<dyn MlModel>>;

    /// Get the name of this trainer
    fn name(&self) -> &str;

    /// Configure the trainer with parameters
    fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()>;
}

/// A feature vector tagged with the class it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledPoint {
    pub class_index: ClassIndex,
    pub vector: Vector,
}

/// Feature vectors of one gesture, one per recording
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureClass {
    pub samples: Vec<Vector>,
}

/// Training input: one entry per class, in class-index order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingData {
    pub classes: Vec<GestureClass>,
}

impl TrainingData {
    pub fn new(classes: Vec<GestureClass>) -> Self {
        TrainingData { classes }
    }

    pub fn number_of_classes(&self) -> usize {
        self.classes.len()
    }

    /// Total number of feature vectors
    pub fn number_of_samples(&self) -> usize {
        self.classes.iter().map(|c| c.samples.len()).sum()
    }

    /// Flatten into labelled points, classes first then samples in order
    pub fn labelled_points(&self) -> Vec<LabelledPoint> {
        self.classes
            .iter()
            .enumerate()
            .flat_map(|(class_index, class)| {
                class.samples.iter().map(move |vector| LabelledPoint {
                    class_index,
                    vector: vector.clone(),
                })
            })
            .collect()
    }

    /// At least two classes, each with at least three samples
    pub fn has_sufficient_data(&self) -> bool {
        self.classes.len() >= MIN_GESTURES
            && self
                .classes
                .iter()
                .all(|c| c.samples.len() >= MIN_RECORDINGS_PER_GESTURE)
    }
}
