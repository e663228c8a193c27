//! Static configuration and run-time settings

use std::collections::HashMap;

use crate::error::{CoreError, Result};

/// How long each recording lasts (ms)
pub const RECORDING_DURATION_MS: u64 = 1800;
/// Threshold a gesture starts with
pub const DEFAULT_REQUIRED_CONFIDENCE: f64 = 0.8;
/// Delay between two predictions of the polling engine (ms)
pub const POLLING_PREDICTION_INTERVAL_MS: u64 = 80;
/// Number of samples the engine tries to predict on
pub const POLLING_PREDICTION_SAMPLE_SIZE: usize = 35;
/// How far back the engine looks for samples (ms)
pub const POLLING_PREDICTION_SAMPLE_DURATION_MS: u64 = 1800;
/// When the buffer is too thin, try this many fewer samples next attempt
pub const POLLING_PREDICTION_SAMPLE_SIZE_SEARCH_STEP: usize = 3;
/// Below this sample count the engine gives up (the peaks filter needs 7)
pub const POLLING_PREDICTION_MIN_SAMPLE_SIZE: usize = 8;
/// Capacity of the accelerometer live buffer
pub const LIVE_DATA_BUFFER_SIZE: usize = 600;
pub const MIN_RECORDINGS_PER_GESTURE: usize = 3;
pub const MIN_GESTURES: usize = 2;
/// Default `k` of the KNN model
pub const DEFAULT_KNN_NEIGHBOUR_COUNT: usize = 3;
pub const GESTURE_NAME_MAX_LENGTH: usize = 18;
/// Weight of the newest raw sample when smoothing
pub const SMOOTHING_FACTOR: f64 = 0.25;

/// Run-time adjustable settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub k: usize,
    pub required_confidence: f64,
    pub polling_interval_ms: u64,
    pub sample_size: usize,
    pub sample_duration_ms: u64,
    pub buffer_size: usize,
    pub recording_duration_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            k: DEFAULT_KNN_NEIGHBOUR_COUNT,
            required_confidence: DEFAULT_REQUIRED_CONFIDENCE,
            polling_interval_ms: POLLING_PREDICTION_INTERVAL_MS,
            sample_size: POLLING_PREDICTION_SAMPLE_SIZE,
            sample_duration_ms: POLLING_PREDICTION_SAMPLE_DURATION_MS,
            buffer_size: LIVE_DATA_BUFFER_SIZE,
            recording_duration_ms: RECORDING_DURATION_MS,
        }
    }
}

impl Settings {
    /// Configure the settings with parameters
    ///
    /// Unknown keys are ignored. Every value is validated before any is
    /// applied, so a rejected map leaves the settings untouched.
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        let mut next = self.clone();

        if let Some(&k) = params.get("k") {
            next.k = positive_integer(k, "k")? as usize;
        }

        if let Some(&required) = params.get("required_confidence") {
            if !(0.0..=1.0).contains(&required) {
                return Err(CoreError::OutOfRange {
                    what: "required confidence",
                    value: required,
                });
            }
            next.required_confidence = required;
        }

        if let Some(&interval) = params.get("polling_interval_ms") {
            next.polling_interval_ms = positive_integer(interval, "polling_interval_ms")? as u64;
        }

        if let Some(&size) = params.get("sample_size") {
            next.sample_size = positive_integer(size, "sample_size")? as usize;
        }

        if let Some(&duration) = params.get("sample_duration_ms") {
            next.sample_duration_ms = positive_integer(duration, "sample_duration_ms")? as u64;
        }

        if let Some(&size) = params.get("buffer_size") {
            next.buffer_size = positive_integer(size, "buffer_size")? as usize;
        }

        if let Some(&duration) = params.get("recording_duration_ms") {
            next.recording_duration_ms = positive_integer(duration, "recording_duration_ms")? as u64;
        }

        *self = next;
        Ok(())
    }
}

/// Counts and millisecond values must be whole; 0.5 would truncate to 0
fn positive_integer(value: f64, name: &str) -> Result<f64> {
    if !value.is_finite() || value < 1.0 || value.fract() != 0.0 {
        return Err(CoreError::InvalidParameter(format!(
            "{} must be a positive integer, got {}",
            name, value
        )));
    }
    Ok(value)
}
