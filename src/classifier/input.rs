//! Window of N-axis samples turned into a feature vector

use crate::common::Vector;
use crate::error::{CoreError, Result};
use crate::perception::sensors::{Recording, TimestampedData};
use crate::perception::FilterSet;

/// An ordered window of samples waiting to be classified
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierInput {
    samples: Vec<Vector>,
}

impl ClassifierInput {
    pub fn new(samples: Vec<Vector>) -> Self {
        ClassifierInput { samples }
    }

    pub fn number_of_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn number_of_axes(&self) -> usize {
        self.samples.first().map_or(0, |s| s.size())
    }

    /// Values of one axis across the window, in sample order
    pub fn axis(&self, axis: usize) -> Result<Vec<f64>> {
        let axes = self.number_of_axes();
        self.samples
            .iter()
            .map(|sample| {
                if sample.size() != axes {
                    return Err(CoreError::SizeMismatch {
                        op: "read an axis of",
                        left: sample.size(),
                        right: axes,
                    });
                }
                sample.get(axis).ok_or(CoreError::SizeMismatch {
                    op: "read an axis of",
                    left: axes,
                    right: axis + 1,
                })
            })
            .collect()
    }

    /// Feature vector laid out axis-major: every filter over axis 0, then
    /// every filter over axis 1, and so on
    pub fn features(&self, filters: &FilterSet) -> Result<Vec<f64>> {
        let mut features = Vec::with_capacity(self.number_of_axes() * filters.count());
        for axis in 0..self.number_of_axes() {
            features.extend(filters.compute(&self.axis(axis)?)?);
        }
        Ok(features)
    }
}

impl From<&Recording> for ClassifierInput {
    fn from(recording: &Recording) -> Self {
        ClassifierInput::new(recording.samples().to_vec())
    }
}

impl From<Vec<TimestampedData<Vector>>> for ClassifierInput {
    fn from(series: Vec<TimestampedData<Vector>>) -> Self {
        ClassifierInput::new(series.into_iter().map(|item| item.value).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::FilterType;

    fn input() -> ClassifierInput {
        ClassifierInput::new(vec![
            Vector::new(vec![1.0, 10.0, -1.0]),
            Vector::new(vec![3.0, 20.0, -2.0]),
            Vector::new(vec![2.0, 30.0, -3.0]),
        ])
    }

    #[test]
    fn test_features_are_axis_major() {
        let filters = FilterSet::with_types(&[FilterType::Max, FilterType::Min]).unwrap();
        assert_eq!(
            input().features(&filters).unwrap(),
            vec![3.0, 1.0, 30.0, 10.0, -1.0, -3.0]
        );
    }

    #[test]
    fn test_empty_input_gives_empty_features() {
        let filters = FilterSet::default();
        assert!(ClassifierInput::default().features(&filters).unwrap().is_empty());
    }

    #[test]
    fn test_ragged_samples_are_rejected() {
        let ragged = ClassifierInput::new(vec![
            Vector::new(vec![1.0, 2.0]),
            Vector::new(vec![1.0]),
        ]);
        let filters = FilterSet::with_types(&[FilterType::Mean]).unwrap();
        assert!(matches!(
            ragged.features(&filters),
            Err(CoreError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_short_window_propagates_filter_error() {
        let filters = FilterSet::with_types(&[FilterType::Peaks]).unwrap();
        assert!(matches!(
            input().features(&filters),
            Err(CoreError::TooShort { .. })
        ));
    }
}
