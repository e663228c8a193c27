//! Training lifecycle and atomic swap of the active model

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::mlmodels::{MlModel, ModelTrainer, TrainingData};
use crate::common::{Observable, Subscription};
use crate::error::{CoreError, Result};

/// State of the most recent training run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingStatus {
    Untrained,
    InProgress,
    Success,
    Failure,
}

/// Snapshot published to model subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelData {
    pub status: TrainingStatus,
    pub is_training: bool,
    pub is_trained: bool,
    /// A model exists and can predict, even when `is_trained` is false
    pub has_model: bool,
}

impl ModelData {
    fn new(status: TrainingStatus, has_model: bool) -> Self {
        ModelData {
            status,
            is_training: status == TrainingStatus::InProgress,
            is_trained: status == TrainingStatus::Success,
            has_model,
        }
    }
}

/// Ends a training run even if the training future is dropped
///
/// A run that never reached the swap is reported as `Failure` before the
/// in-flight flag is cleared.
struct TrainingGuard<'a> {
    model: &'a Model,
    settled: bool,
}

impl TrainingGuard<'_> {
    fn settle(&mut self, status: TrainingStatus) {
        self.model.set_status(status);
        self.settled = true;
    }
}

impl Drop for TrainingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            log::warn!("Model: training cancelled, keeping previous model");
            self.model.set_status(TrainingStatus::Failure);
        }
        self.model.training.store(false, Ordering::SeqCst);
    }
}

/// Holds at most one trained model and replaces it wholesale on retrain
///
/// Cloning yields another handle to the same model.
#[derive(Debug, Clone)]
pub struct Model {
    data: Observable<ModelData>,
    current: Arc<RwLock<Option<Arc<dyn MlModel>>>>,
    training: Arc<AtomicBool>,
}

impl Model {
    /// Create an untrained model
    pub fn new() -> Self {
        Model {
            data: Observable::new(ModelData::new(TrainingStatus::Untrained, false)),
            current: Arc::new(RwLock::new(None)),
            training: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Train a fresh model off the async executor and swap it in
    ///
    /// A second call while a run is outstanding is rejected. On failure the
    /// previously active model stays in place.
    pub async fn train(&self, trainer: Arc<dyn ModelTrainer>, data: TrainingData) -> Result<()> {
        if self.training.swap(true, Ordering::SeqCst) {
            log::warn!("Model: training already in progress, request rejected");
            return Err(CoreError::TrainingInProgress);
        }
        let mut guard = TrainingGuard {
            model: self,
            settled: false,
        };

        log::info!(
            "Model: training {} on {} samples in {} classes",
            trainer.name(),
            data.number_of_samples(),
            data.number_of_classes()
        );
        self.set_status(TrainingStatus::InProgress);

        let outcome = tokio::task::spawn_blocking(move || trainer.train_model(&data))
            .await
            .map_err(|e| CoreError::Training(e.to_string()))
            .and_then(|result| result);

        match outcome {
            Ok(model) => {
                log::info!("Model: swapped in new {} model", model.name());
                *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(model);
                guard.settle(TrainingStatus::Success);
                Ok(())
            }
            Err(e) => {
                log::warn!("Model: training failed, keeping previous model: {}", e);
                guard.settle(TrainingStatus::Failure);
                Err(e)
            }
        }
    }

    /// Flag the model as stale; an existing model keeps predicting
    pub fn mark_as_untrained(&self) {
        if self.is_training() {
            return;
        }
        self.set_status(TrainingStatus::Untrained);
    }

    /// Per-class confidences from the active model
    pub fn predict(&self, features: &[f64]) -> Result<Vec<f64>> {
        let model = self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CoreError::NotTrained)?;
        model.predict(features)
    }

    pub fn status(&self) -> TrainingStatus {
        self.data.get().status
    }

    pub fn is_trained(&self) -> bool {
        self.data.get().is_trained
    }

    pub fn is_training(&self) -> bool {
        self.data.get().is_training
    }

    pub fn has_model(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of classes the active model predicts, 0 without a model
    pub fn number_of_classes(&self) -> usize {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, |m| m.number_of_classes())
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ModelData) + Send + Sync + 'static,
    {
        self.data.subscribe(callback)
    }

    fn set_status(&self, status: TrainingStatus) {
        self.data.set(ModelData::new(status, self.has_model()));
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::mlmodels::{GestureClass, KnnModelTrainer};
    use crate::common::Vector;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    fn data() -> TrainingData {
        TrainingData::new(vec![
            GestureClass {
                samples: vec![Vector::new(vec![0.0]), Vector::new(vec![0.1])],
            },
            GestureClass {
                samples: vec![Vector::new(vec![5.0]), Vector::new(vec![5.1])],
            },
        ])
    }

    #[derive(Debug)]
    struct FailingTrainer;

    impl ModelTrainer for FailingTrainer {
        fn train_model(&self, _data: &TrainingData) -> Result<Arc<dyn MlModel>> {
            Err(CoreError::Training("boom".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn configure(&mut self, _params: &HashMap<String, f64>) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct SlowTrainer(KnnModelTrainer);

    impl ModelTrainer for SlowTrainer {
        fn train_model(&self, data: &TrainingData) -> Result<Arc<dyn MlModel>> {
            std::thread::sleep(Duration::from_millis(100));
            self.0.train_model(data)
        }

        fn name(&self) -> &str {
            "slow"
        }

        fn configure(&mut self, _params: &HashMap<String, f64>) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_predict_before_training_fails() {
        let model = Model::new();
        assert_eq!(model.predict(&[0.0]), Err(CoreError::NotTrained));
        assert_eq!(model.status(), TrainingStatus::Untrained);
    }

    #[tokio::test]
    async fn test_train_swaps_in_model() {
        let model = Model::new();
        model
            .train(Arc::new(KnnModelTrainer::new(1)), data())
            .await
            .unwrap();

        assert!(model.is_trained());
        assert!(model.has_model());
        assert_eq!(model.number_of_classes(), 2);
        assert_eq!(model.predict(&[4.9]).unwrap(), vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_model() {
        let model = Model::new();
        model
            .train(Arc::new(KnnModelTrainer::new(1)), data())
            .await
            .unwrap();

        let result = model.train(Arc::new(FailingTrainer), data()).await;
        assert!(matches!(result, Err(CoreError::Training(_))));
        assert_eq!(model.status(), TrainingStatus::Failure);
        assert_eq!(model.predict(&[0.0]).unwrap(), vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_overlapping_training_is_rejected() {
        let model = Model::new();
        let first = {
            let model = model.clone();
            tokio::spawn(async move {
                model
                    .train(Arc::new(SlowTrainer(KnnModelTrainer::new(1))), data())
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = model.train(Arc::new(KnnModelTrainer::new(1)), data()).await;
        assert_eq!(second, Err(CoreError::TrainingInProgress));

        first.await.unwrap().unwrap();
        assert!(model.is_trained());
    }

    #[tokio::test]
    async fn test_cancelled_training_does_not_stick_in_progress() {
        let model = Model::new();
        let cancelled = tokio::time::timeout(
            Duration::from_millis(10),
            model.train(Arc::new(SlowTrainer(KnnModelTrainer::new(1))), data()),
        )
        .await;
        assert!(cancelled.is_err());

        assert_eq!(model.status(), TrainingStatus::Failure);
        assert!(!model.is_training());
        assert!(!model.has_model());

        model.mark_as_untrained();
        assert_eq!(model.status(), TrainingStatus::Untrained);

        model
            .train(Arc::new(KnnModelTrainer::new(1)), data())
            .await
            .unwrap();
        assert!(model.is_trained());
    }

    #[tokio::test]
    async fn test_mark_as_untrained_keeps_predicting() {
        let model = Model::new();
        model
            .train(Arc::new(KnnModelTrainer::new(1)), data())
            .await
            .unwrap();

        model.mark_as_untrained();
        assert!(!model.is_trained());
        assert!(model.has_model());
        assert!(model.predict(&[0.0]).is_ok());
    }

    #[tokio::test]
    async fn test_subscribers_follow_the_lifecycle() {
        let model = Model::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = model.subscribe(move |d| seen_clone.lock().unwrap().push(d.status));

        model
            .train(Arc::new(KnnModelTrainer::new(1)), data())
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                TrainingStatus::Untrained,
                TrainingStatus::InProgress,
                TrainingStatus::Success
            ]
        );
    }
}
