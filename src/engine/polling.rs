//! Predicts on the newest window of live data at a fixed interval

use std::future::Future;
use std::time::Duration;

use super::{Engine, EngineData};
use crate::classifier::{Classifier, ClassifierInput};
use crate::common::types::Millis;
use crate::common::{Observable, Subscription};
use crate::config::{
    Settings, POLLING_PREDICTION_MIN_SAMPLE_SIZE, POLLING_PREDICTION_SAMPLE_SIZE_SEARCH_STEP,
};
use crate::error::Result;
use crate::perception::LiveData;

/// Polls the live buffer and classifies whatever window it can get
///
/// Cloning yields another handle to the same engine.
#[derive(Debug, Clone)]
pub struct PollingPredictorEngine {
    classifier: Classifier,
    live_data: LiveData,
    running: Observable<bool>,
    sample_size: usize,
    sample_duration: Millis,
    interval: Duration,
}

impl PollingPredictorEngine {
    /// Create a new engine; it starts out running
    pub fn new(classifier: Classifier, live_data: LiveData, settings: &Settings) -> Self {
        PollingPredictorEngine {
            classifier,
            live_data,
            running: Observable::new(true),
            sample_size: settings.sample_size,
            sample_duration: settings.sample_duration_ms,
            // tokio::time::interval panics on a zero period
            interval: Duration::from_millis(settings.polling_interval_ms.max(1)),
        }
    }

    /// Run one prediction against the buffer as seen at `now`
    ///
    /// Returns `None` when the engine is paused, the model is not trained,
    /// or the buffer holds too few samples for the filters.
    pub fn tick(&self, now: Millis) -> Result<Option<Vec<f64>>> {
        if !self.classifier.model().is_trained() || !self.running.get() {
            return Ok(None);
        }

        let input = self.buffered_input(now);
        let required = self.classifier.filters().min_samples();
        if input.number_of_samples() == 0 || input.number_of_samples() < required {
            log::debug!(
                "Engine: {} buffered samples, {} required, skipping",
                input.number_of_samples(),
                required
            );
            return Ok(None);
        }

        self.classifier.classify(&input).map(Some)
    }

    /// Tick every polling interval until `shutdown` resolves
    ///
    /// Errors from a single tick are logged and polling continues.
    pub async fn run<C, S>(&self, now: C, shutdown: S)
    where
        C: Fn() -> Millis,
        S: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        log::info!("Engine: polling every {:?}", self.interval);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    if let Err(e) = self.tick(now()) {
                        log::warn!("Engine: prediction failed: {}", e);
                    }
                }
            }
        }
        log::info!("Engine: polling stopped");
    }

    /// The largest evenly spread window the buffer can serve, shrinking the
    /// request step by step; empty when even the smallest request fails
    fn buffered_input(&self, now: Millis) -> ClassifierInput {
        let mut size = self.sample_size;
        while size >= POLLING_PREDICTION_MIN_SAMPLE_SIZE {
            if let Ok(series) = self.live_data.series(now, self.sample_duration, size) {
                return ClassifierInput::from(series);
            }
            size = size.saturating_sub(POLLING_PREDICTION_SAMPLE_SIZE_SEARCH_STEP);
        }
        ClassifierInput::default()
    }
}

impl Engine for PollingPredictorEngine {
    fn start(&self) {
        self.running.set(true);
    }

    fn stop(&self) {
        self.running.set(false);
    }

    fn is_running(&self) -> bool {
        self.running.get()
    }

    fn name(&self) -> &str {
        "polling"
    }

    fn subscribe(&self, callback: Box<dyn Fn(&EngineData) + Send + Sync>) -> Subscription {
        self.running
            .subscribe(move |&is_running| callback(&EngineData { is_running }))
    }
}
