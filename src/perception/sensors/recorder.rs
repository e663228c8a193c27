//! Exclusive capture of fixed-duration recordings

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{LiveSample, LiveSource};
use crate::common::{Subscription, Vector};
use crate::config::POLLING_PREDICTION_SAMPLE_SIZE;
use crate::error::{CoreError, Result};

/// Anomalies detected while capturing; rendering them is up to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingWarning {
    /// Too few samples arrived, most likely the device disconnected
    DisconnectedDuringRecording,
}

/// A completed, immutable capture of N-axis samples
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    id: u64,
    samples: Vec<Vector>,
    labels: Arc<[String]>,
    warnings: Vec<RecordingWarning>,
}

impl Recording {
    /// Build a recording from already captured samples
    pub fn new(id: u64, samples: Vec<Vector>, labels: Arc<[String]>) -> Result<Self> {
        if labels.is_empty() {
            return Err(CoreError::NoLabels);
        }
        Ok(Recording {
            id,
            samples,
            labels,
            warnings: Vec::new(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn samples(&self) -> &[Vector] {
        &self.samples
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn warnings(&self) -> &[RecordingWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug)]
struct ActiveRecording {
    id: u64,
    samples: Vec<Vector>,
    labels: Option<Arc<[String]>>,
    source: Option<Subscription>,
}

/// Captures at most one recording at a time
///
/// Cloning yields another handle to the same recorder.
#[derive(Debug, Clone)]
pub struct Recorder {
    active: Arc<Mutex<Option<ActiveRecording>>>,
    min_samples: usize,
}

impl Recorder {
    pub fn new() -> Self {
        Recorder {
            active: Arc::new(Mutex::new(None)),
            min_samples: POLLING_PREDICTION_SAMPLE_SIZE,
        }
    }

    /// Recordings with this many samples or fewer are flagged
    pub fn with_min_samples(min_samples: usize) -> Self {
        Recorder {
            min_samples,
            ..Recorder::new()
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Begin capturing samples fed through [`Recorder::push`]
    ///
    /// Returns `false` without side effects when a recording is already
    /// in progress.
    pub fn start(&self, id: u64) -> bool {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.is_some() {
            log::warn!("Recording: failed to start recording {}, already recording", id);
            return false;
        }
        log::info!("Recording: creating new recording {}", id);
        *active = Some(ActiveRecording {
            id,
            samples: Vec::new(),
            labels: None,
            source: None,
        });
        true
    }

    /// Begin capturing every sample pushed by `source`
    pub fn start_from(&self, source: &dyn LiveSource, id: u64) -> bool {
        if !self.start(id) {
            return false;
        }
        let recorder = self.clone();
        let subscription = source.subscribe_samples(Box::new(move |sample: &LiveSample| {
            recorder.push(sample);
        }));

        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        match active.as_mut() {
            Some(recording) if recording.id == id => recording.source = Some(subscription),
            // Finished before the subscription was attached
            _ => subscription.unsubscribe(),
        }
        true
    }

    /// Append a sample to the active recording; ignored when idle
    pub fn push(&self, sample: &LiveSample) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(recording) = active.as_mut() {
            recording.samples.push(sample.vector.clone());
            recording.labels = Some(Arc::clone(&sample.labels));
        }
    }

    /// Stop capturing and hand out the recording
    pub fn finish(&self) -> Result<Recording> {
        let finished = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(CoreError::NotRecording)?;

        if let Some(source) = finished.source {
            source.unsubscribe();
        }

        let labels = match finished.labels {
            Some(labels) if !labels.is_empty() => labels,
            _ => return Err(CoreError::NoLabels),
        };

        let mut recording = Recording::new(finished.id, finished.samples, labels)?;
        if recording.len() <= self.min_samples {
            log::warn!(
                "Recording: {} holds only {} samples, the device may have disconnected",
                recording.id,
                recording.len()
            );
            recording
                .warnings
                .push(RecordingWarning::DisconnectedDuringRecording);
        }

        log::info!("Recording: created recording {}", recording.id);
        Ok(recording)
    }

    /// Drop the active recording without producing one
    ///
    /// Returns `false` when nothing was being recorded.
    pub fn abort(&self) -> bool {
        let aborted = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match aborted {
            Some(recording) => {
                discard(recording);
                true
            }
            None => false,
        }
    }

    /// Like [`Recorder::abort`], but leaves a newer recording alone
    fn abort_recording(&self, id: u64) {
        let aborted = {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            if active.as_ref().is_some_and(|recording| recording.id == id) {
                active.take()
            } else {
                None
            }
        };
        if let Some(recording) = aborted {
            discard(recording);
        }
    }

    /// Record everything `source` pushes during `duration`
    ///
    /// Resolves to `None` when another recording was already in progress.
    /// Dropping the future before it resolves aborts the capture.
    pub async fn record_for(
        &self,
        source: &dyn LiveSource,
        id: u64,
        duration: Duration,
    ) -> Result<Option<Recording>> {
        if !self.start_from(source, id) {
            return Ok(None);
        }
        let mut capture = CaptureGuard {
            recorder: self,
            id,
            armed: true,
        };
        tokio::time::sleep(duration).await;
        capture.armed = false;
        self.finish().map(Some)
    }
}

fn discard(recording: ActiveRecording) {
    if let Some(source) = recording.source {
        source.unsubscribe();
    }
    log::info!(
        "Recording: aborted recording {} after {} samples",
        recording.id,
        recording.samples.len()
    );
}

/// Aborts a timed capture whose future was dropped mid-way
struct CaptureGuard<'a> {
    recorder: &'a Recorder,
    id: u64,
    armed: bool,
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.recorder.abort_recording(self.id);
        }
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}
