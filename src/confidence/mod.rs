//! Per-gesture confidences and the threshold that makes a gesture active

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::common::types::GestureId;
use crate::common::{Observable, Subscription};
use crate::config::DEFAULT_REQUIRED_CONFIDENCE;
use crate::error::{CoreError, Result};

fn validate_unit(what: &'static str, value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(CoreError::OutOfRange { what, value })
    }
}

/// Latest confidence of every gesture, keyed by gesture ID
///
/// Cloning yields another handle to the same map.
#[derive(Debug, Clone)]
pub struct Confidences {
    values: Observable<HashMap<GestureId, f64>>,
}

impl Confidences {
    pub fn new() -> Self {
        Confidences {
            values: Observable::new(HashMap::new()),
        }
    }

    /// Store the confidence of `gesture_id`; must lie within 0..1
    pub fn set_confidence(&self, gesture_id: GestureId, confidence: f64) -> Result<()> {
        let confidence = validate_unit("confidence", confidence)?;
        self.values.update(|values| {
            values.insert(gesture_id, confidence);
        });
        Ok(())
    }

    pub fn confidence(&self, gesture_id: GestureId) -> Result<f64> {
        self.values
            .get()
            .get(&gesture_id)
            .copied()
            .ok_or(CoreError::UnknownGesture(gesture_id))
    }

    /// Forget the confidence of a removed gesture
    pub fn remove(&self, gesture_id: GestureId) {
        self.values.update(|values| {
            values.remove(&gesture_id);
        });
    }

    pub fn snapshot(&self) -> HashMap<GestureId, f64> {
        self.values.get()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&HashMap<GestureId, f64>) + Send + Sync + 'static,
    {
        self.values.subscribe(callback)
    }
}

impl Default for Confidences {
    fn default() -> Self {
        Self::new()
    }
}

/// Derived state of one gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceData {
    pub confidence: f64,
    pub required_confidence: f64,
    /// `confidence > required_confidence`; equality is not confident
    pub is_confident: bool,
}

impl ConfidenceData {
    pub fn new(confidence: f64, required_confidence: f64) -> Self {
        ConfidenceData {
            confidence,
            required_confidence,
            is_confident: confidence > required_confidence,
        }
    }
}

#[derive(Default)]
struct DerivedState {
    confidence: Option<f64>,
    required: Option<f64>,
    last: Option<ConfidenceData>,
}

impl DerivedState {
    /// The value to publish, if both inputs are known and it changed
    fn next(&mut self) -> Option<ConfidenceData> {
        let data = ConfidenceData::new(self.confidence?, self.required?);
        if self.last == Some(data) {
            return None;
        }
        self.last = Some(data);
        Some(data)
    }
}

/// Confidence of one gesture paired with its required threshold
///
/// A gesture without a stored confidence reads as 0. Cloning yields another
/// handle to the same threshold.
#[derive(Debug, Clone)]
pub struct GestureConfidence {
    gesture_id: GestureId,
    required: Observable<f64>,
    confidences: Confidences,
}

impl GestureConfidence {
    /// Create with the default required confidence
    pub fn new(gesture_id: GestureId, confidences: Confidences) -> Self {
        GestureConfidence {
            gesture_id,
            required: Observable::new(DEFAULT_REQUIRED_CONFIDENCE),
            confidences,
        }
    }

    pub fn with_required_confidence(
        gesture_id: GestureId,
        confidences: Confidences,
        required: f64,
    ) -> Result<Self> {
        let confidence = GestureConfidence::new(gesture_id, confidences);
        confidence.set_required_confidence(required)?;
        Ok(confidence)
    }

    pub fn gesture_id(&self) -> GestureId {
        self.gesture_id
    }

    pub fn set_required_confidence(&self, required: f64) -> Result<()> {
        let required = validate_unit("required confidence", required)?;
        self.required.set(required);
        Ok(())
    }

    pub fn required_confidence(&self) -> f64 {
        self.required.get()
    }

    pub fn current_confidence(&self) -> f64 {
        self.confidences.confidence(self.gesture_id).unwrap_or(0.0)
    }

    pub fn is_confident(&self) -> bool {
        self.data().is_confident
    }

    pub fn data(&self) -> ConfidenceData {
        ConfidenceData::new(self.current_confidence(), self.required_confidence())
    }

    /// Observe the derived state
    ///
    /// `callback` runs once on subscription and again whenever the
    /// confidence or the threshold changes the derived value.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ConfidenceData) + Send + Sync + 'static,
    {
        let state = Arc::new(Mutex::new(DerivedState::default()));
        let callback = Arc::new(callback);

        let on_confidences = {
            let state = Arc::clone(&state);
            let callback = Arc::clone(&callback);
            let gesture_id = self.gesture_id;
            self.confidences.subscribe(move |values| {
                let next = {
                    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                    state.confidence = Some(values.get(&gesture_id).copied().unwrap_or(0.0));
                    state.next()
                };
                if let Some(data) = next {
                    callback(&data);
                }
            })
        };

        let on_required = self.required.subscribe(move |&required| {
            let next = {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                state.required = Some(required);
                state.next()
            };
            if let Some(data) = next {
                callback(&data);
            }
        });

        Subscription::all(vec![on_confidences, on_required])
    }
}

/// A gesture together with its derived confidence state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GesturePrediction {
    pub gesture_id: GestureId,
    pub confidence: ConfidenceData,
}

/// The confident gesture with the highest confidence; the first one wins ties
pub fn best_prediction<I>(predictions: I) -> Option<GesturePrediction>
where
    I: IntoIterator<Item = GesturePrediction>,
{
    predictions
        .into_iter()
        .filter(|p| p.confidence.is_confident)
        .fold(None, |best: Option<GesturePrediction>, candidate| match best {
            Some(best) if best.confidence.confidence >= candidate.confidence.confidence => {
                Some(best)
            }
            _ => Some(candidate),
        })
}
