//! Error types shared by every stage of the pipeline

use thiserror::Error;

use crate::common::types::GestureId;
use crate::perception::filters::FilterType;

/// Errors raised by the gesture core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Attempted to {op} two vectors of unequal size. Vector1 size: {left} - Vector2 size: {right}")]
    SizeMismatch {
        op: &'static str,
        left: usize,
        right: usize,
    },

    #[error("{filter} filter: data sample is too short (need {required}, have {actual})")]
    TooShort {
        filter: FilterType,
        required: usize,
        actual: usize,
    },

    #[error("{filter} filter: cannot operate on an empty window")]
    EmptyInput { filter: FilterType },

    #[error("{what} must be within 0.0-1.0, got {value}")]
    OutOfRange { what: &'static str, value: f64 },

    #[error("Unknown filter type '{0}'")]
    UnknownFilter(String),

    #[error("Cannot add filter type {0}. Filters already has this type")]
    DuplicateFilter(FilterType),

    #[error("No labels were present during the recording")]
    NoLabels,

    #[error("No recording is in progress")]
    NotRecording,

    #[error("No gesture with ID {0}")]
    UnknownGesture(GestureId),

    #[error("Gesture name '{0}' is invalid")]
    InvalidGestureName(String),

    #[error("Model has not been trained")]
    NotTrained,

    #[error("A training run is already in progress")]
    TrainingInProgress,

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Insufficient training data")]
    InsufficientTrainingData,

    #[error("Insufficient buffer data: requested {requested}, available {available}")]
    InsufficientBufferData { requested: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
