//! Perception: from raw samples to feature vectors
pub mod filters;
pub mod sensors;
pub mod smoothing;

pub use filters::{Filter, FilterSet, FilterType};
pub use sensors::{LiveData, LiveSample, LiveSource, Recorder, Recording};
pub use smoothing::{smoothen, smoothen_axes, Smoother};
