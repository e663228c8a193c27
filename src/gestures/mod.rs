//! Gestures and their recordings
//!
//! The position of a gesture in [`Gestures`] is its class index for
//! training and prediction.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::classifier::mlmodels::{GestureClass, TrainingData};
use crate::classifier::{ClassifierInput, Model};
use crate::common::types::GestureId;
use crate::common::{Observable, Subscription};
use crate::config::GESTURE_NAME_MAX_LENGTH;
use crate::confidence::{Confidences, GestureConfidence};
use crate::error::{CoreError, Result};
use crate::perception::{FilterSet, Recording};

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > GESTURE_NAME_MAX_LENGTH {
        return Err(CoreError::InvalidGestureName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

/// A named class with its training recordings
#[derive(Debug, Clone)]
pub struct Gesture {
    id: GestureId,
    name: String,
    recordings: Vec<Recording>,
    confidence: GestureConfidence,
}

impl Gesture {
    pub fn id(&self) -> GestureId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }

    pub fn confidence(&self) -> &GestureConfidence {
        &self.confidence
    }

    /// One feature vector per recording
    pub fn training_class(&self, filters: &FilterSet) -> Result<GestureClass> {
        let samples = self
            .recordings
            .iter()
            .map(|recording| {
                ClassifierInput::from(recording)
                    .features(filters)
                    .map(crate::common::Vector::new)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(GestureClass { samples })
    }
}

/// Ordered repository of gestures
///
/// Any change to the set of gestures or their recordings marks the model
/// untrained. Cloning yields another handle to the same repository.
#[derive(Debug, Clone)]
pub struct Gestures {
    gestures: Observable<Vec<Gesture>>,
    next_id: Arc<AtomicU64>,
    confidences: Confidences,
    model: Model,
}

impl Gestures {
    pub fn new(confidences: Confidences, model: Model) -> Self {
        Gestures {
            gestures: Observable::new(Vec::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            confidences,
            model,
        }
    }

    /// Create an empty gesture and return its ID
    pub fn create(&self, name: &str) -> Result<GestureId> {
        let name = validate_name(name)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let gesture = Gesture {
            id,
            name,
            recordings: Vec::new(),
            confidence: GestureConfidence::new(id, self.confidences.clone()),
        };
        log::info!("Gestures: created '{}' ({})", gesture.name, id);
        self.gestures.update(|gestures| gestures.push(gesture));
        self.model.mark_as_untrained();
        Ok(id)
    }

    pub fn remove(&self, id: GestureId) -> Result<()> {
        self.gestures.try_update(|gestures| {
            let position = gestures
                .iter()
                .position(|g| g.id == id)
                .ok_or(CoreError::UnknownGesture(id))?;
            gestures.remove(position);
            Ok(())
        })?;
        self.confidences.remove(id);
        self.model.mark_as_untrained();
        log::info!("Gestures: removed {}", id);
        Ok(())
    }

    pub fn rename(&self, id: GestureId, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        self.modify(id, |gesture| {
            gesture.name = name;
            Ok(())
        })
    }

    pub fn add_recording(&self, id: GestureId, recording: Recording) -> Result<()> {
        self.modify(id, |gesture| {
            gesture.recordings.push(recording);
            Ok(())
        })?;
        self.model.mark_as_untrained();
        Ok(())
    }

    /// Drop the recording with `recording_id`; no-op when absent
    pub fn remove_recording(&self, id: GestureId, recording_id: u64) -> Result<()> {
        let mut removed = false;
        self.modify(id, |gesture| {
            let before = gesture.recordings.len();
            gesture.recordings.retain(|r| r.id() != recording_id);
            removed = gesture.recordings.len() != before;
            Ok(())
        })?;
        if removed {
            self.model.mark_as_untrained();
        }
        Ok(())
    }

    pub fn get(&self, id: GestureId) -> Result<Gesture> {
        self.gestures
            .get()
            .into_iter()
            .find(|g| g.id == id)
            .ok_or(CoreError::UnknownGesture(id))
    }

    /// Snapshot in creation order
    pub fn all(&self) -> Vec<Gesture> {
        self.gestures.get()
    }

    pub fn ids(&self) -> Vec<GestureId> {
        self.gestures.get().iter().map(|g| g.id).collect()
    }

    pub fn count(&self) -> usize {
        self.gestures.get().len()
    }

    pub fn clear(&self) {
        for id in self.ids() {
            self.confidences.remove(id);
        }
        self.gestures.set(Vec::new());
        self.model.mark_as_untrained();
    }

    /// Feature vectors of every recording, one class per gesture
    pub fn training_data(&self, filters: &FilterSet) -> Result<TrainingData> {
        TrainingData::from_gestures(&self.all(), filters)
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Vec<Gesture>) + Send + Sync + 'static,
    {
        self.gestures.subscribe(callback)
    }

    fn modify<F>(&self, id: GestureId, f: F) -> Result<()>
    where
        F: FnOnce(&mut Gesture) -> Result<()>,
    {
        self.gestures.try_update(|gestures| {
            let gesture = gestures
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or(CoreError::UnknownGesture(id))?;
            f(gesture)
        })
    }
}

impl TrainingData {
    /// Apply `filters` to every recording, keeping gesture order as class order
    pub fn from_gestures(gestures: &[Gesture], filters: &FilterSet) -> Result<TrainingData> {
        let classes = gestures
            .iter()
            .map(|gesture| gesture.training_class(filters))
            .collect::<Result<Vec<_>>>()?;
        Ok(TrainingData::new(classes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TrainingStatus;
    use crate::common::Vector;
    use crate::perception::sensors::accelerometer_labels;
    use crate::perception::FilterType;

    fn gestures() -> Gestures {
        Gestures::new(Confidences::new(), Model::new())
    }

    fn recording(id: u64, xs: &[f64]) -> Recording {
        let samples = xs.iter().map(|&x| Vector::new(vec![x, 0.0, -x])).collect();
        Recording::new(id, samples, accelerometer_labels()).unwrap()
    }

    #[test]
    fn test_names_are_validated() {
        let gestures = gestures();
        assert!(gestures.create("shake").is_ok());
        assert!(matches!(
            gestures.create("  "),
            Err(CoreError::InvalidGestureName(_))
        ));
        assert!(gestures.create("a name that is far too long").is_err());
        assert!(gestures.create("exactly18chars....").is_ok());
    }

    #[test]
    fn test_creation_order_is_class_order() {
        let gestures = gestures();
        let a = gestures.create("a").unwrap();
        let b = gestures.create("b").unwrap();
        let c = gestures.create("c").unwrap();
        gestures.remove(b).unwrap();

        assert_eq!(gestures.ids(), vec![a, c]);
        assert_eq!(gestures.remove(b), Err(CoreError::UnknownGesture(b)));
    }

    #[test]
    fn test_training_data_from_recordings() {
        let gestures = gestures();
        let a = gestures.create("up").unwrap();
        let b = gestures.create("down").unwrap();
        gestures.add_recording(a, recording(1, &[1.0, 2.0, 3.0])).unwrap();
        gestures.add_recording(a, recording(2, &[2.0, 4.0])).unwrap();
        gestures.add_recording(b, recording(3, &[-1.0, -5.0])).unwrap();

        let filters = FilterSet::with_types(&[FilterType::Max, FilterType::Mean]).unwrap();
        let data = gestures.training_data(&filters).unwrap();

        assert_eq!(data.number_of_classes(), 2);
        assert_eq!(data.number_of_samples(), 3);
        assert_eq!(
            data.classes[0].samples[0].values(),
            &[3.0, 2.0, 0.0, 0.0, -1.0, -2.0]
        );
        assert_eq!(
            data.classes[1].samples[0].values(),
            &[-1.0, -3.0, 0.0, 0.0, 5.0, 3.0]
        );
        assert!(!data.has_sufficient_data());
    }

    #[tokio::test]
    async fn test_changes_mark_model_untrained() {
        let model = Model::new();
        let gestures = Gestures::new(Confidences::new(), model.clone());
        for name in ["a", "b"] {
            let id = gestures.create(name).unwrap();
            for r in 0..3 {
                gestures
                    .add_recording(id, recording(r, &[r as f64, 1.0, 2.0]))
                    .unwrap();
            }
        }

        let filters = FilterSet::with_types(&[FilterType::Mean]).unwrap();
        let data = gestures.training_data(&filters).unwrap();
        assert!(data.has_sufficient_data());
        model
            .train(Arc::new(crate::classifier::KnnModelTrainer::new(3)), data)
            .await
            .unwrap();
        assert!(model.is_trained());

        gestures.create("c").unwrap();
        assert_eq!(model.status(), TrainingStatus::Untrained);
        assert!(model.has_model());
    }

    #[test]
    fn test_remove_recording() {
        let gestures = gestures();
        let id = gestures.create("wave").unwrap();
        gestures.add_recording(id, recording(10, &[1.0])).unwrap();
        gestures.add_recording(id, recording(11, &[2.0])).unwrap();

        gestures.remove_recording(id, 10).unwrap();
        gestures.remove_recording(id, 99).unwrap();
        let ids: Vec<u64> = gestures.get(id).unwrap().recordings().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![11]);
    }
}
