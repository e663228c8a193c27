pub mod classifier;
pub mod common;
pub mod confidence;
pub mod config;
pub mod engine;
pub mod error;
pub mod gestures;
pub mod perception;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::classifier::{
    Classifier, ClassifierInput, KnnModelTrainer, KnnNormalizedModelTrainer, Model, ModelTrainer,
};
use crate::common::types::GestureId;
use crate::config::Settings;
use crate::confidence::{best_prediction, Confidences, GesturePrediction};
use crate::engine::PollingPredictorEngine;
use crate::error::{CoreError, Result};
use crate::gestures::Gestures;
use crate::perception::sensors::accelerometer_labels;
use crate::perception::{FilterSet, LiveData, Recorder, Recording};

/// Which KNN variant [`GestureCore::train`] uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainerKind {
    #[default]
    Knn,
    KnnNormalized,
}

/// Core functionality for gesture recognition
///
/// Every component is created here and handed to the components that need
/// it; there is no global state. Clones are handles to the same core,
/// settings and trainer choice included.
#[derive(Debug, Clone)]
pub struct GestureCore {
    settings: Arc<RwLock<Settings>>,
    trainer: Arc<RwLock<TrainerKind>>,
    filters: FilterSet,
    confidences: Confidences,
    model: Model,
    gestures: Gestures,
    live_data: LiveData,
    recorder: Recorder,
    classifier: Classifier,
    engine: PollingPredictorEngine,
}

impl GestureCore {
    /// Create a new instance with default settings and every filter
    pub fn new() -> Self {
        GestureCore::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let filters = FilterSet::default();
        let confidences = Confidences::new();
        let model = Model::new();
        let gestures = Gestures::new(confidences.clone(), model.clone());
        let live_data = LiveData::new("accelerometer", accelerometer_labels(), settings.buffer_size);
        let classifier = Classifier::new(
            model.clone(),
            filters.clone(),
            gestures.clone(),
            confidences.clone(),
        );
        let engine = PollingPredictorEngine::new(classifier.clone(), live_data.clone(), &settings);

        GestureCore {
            settings: Arc::new(RwLock::new(settings)),
            trainer: Arc::new(RwLock::new(TrainerKind::default())),
            filters,
            confidences,
            model,
            gestures,
            live_data,
            recorder: Recorder::new(),
            classifier,
            engine,
        }
    }

    /// Apply run-time settings; see [`Settings::configure`]
    ///
    /// The buffer and engine keep the values they were created with.
    pub fn configure(&self, params: &HashMap<String, f64>) -> Result<()> {
        self.settings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .configure(params)
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn trainer(&self) -> TrainerKind {
        *self.trainer.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_trainer(&self, trainer: TrainerKind) {
        *self.trainer.write().unwrap_or_else(PoisonError::into_inner) = trainer;
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn confidences(&self) -> &Confidences {
        &self.confidences
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn gestures(&self) -> &Gestures {
        &self.gestures
    }

    pub fn live_data(&self) -> &LiveData {
        &self.live_data
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn engine(&self) -> &PollingPredictorEngine {
        &self.engine
    }

    /// Create a gesture using the configured required confidence
    pub fn create_gesture(&self, name: &str) -> Result<GestureId> {
        let id = self.gestures.create(name)?;
        self.gestures
            .get(id)?
            .confidence()
            .set_required_confidence(self.settings().required_confidence)?;
        Ok(id)
    }

    /// Record the live stream for the configured duration and attach the
    /// result to `gesture_id`
    ///
    /// Resolves to `None` when another recording was already running.
    pub async fn record(&self, gesture_id: GestureId, recording_id: u64) -> Result<Option<Recording>> {
        self.gestures.get(gesture_id)?;
        let duration = Duration::from_millis(self.settings().recording_duration_ms);
        let Some(recording) = self
            .recorder
            .record_for(&self.live_data, recording_id, duration)
            .await?
        else {
            return Ok(None);
        };
        self.gestures.add_recording(gesture_id, recording.clone())?;
        Ok(Some(recording))
    }

    /// Rebuild the training set from every recording and train a fresh model
    pub async fn train(&self) -> Result<()> {
        let data = self.gestures.training_data(&self.filters)?;
        if !data.has_sufficient_data() {
            return Err(CoreError::InsufficientTrainingData);
        }
        let k = self.settings().k;
        let trainer: Arc<dyn ModelTrainer> = match self.trainer() {
            TrainerKind::Knn => Arc::new(KnnModelTrainer::new(k)),
            TrainerKind::KnnNormalized => Arc::new(KnnNormalizedModelTrainer::new(k)),
        };
        self.model.train(trainer, data).await
    }

    /// Classify a window and publish the confidences
    pub fn classify(&self, input: &ClassifierInput) -> Result<Vec<f64>> {
        self.classifier.classify(input)
    }

    /// The confident gesture with the highest confidence, if any
    pub fn best_prediction(&self) -> Option<GesturePrediction> {
        best_prediction(self.gestures.all().iter().map(|gesture| GesturePrediction {
            gesture_id: gesture.id(),
            confidence: gesture.confidence().data(),
        }))
    }
}

impl Default for GestureCore {
    fn default() -> Self {
        Self::new()
    }
}
