//! Live sample sources and recording
pub mod buffer;
pub mod live_data;
pub mod recorder;

use std::sync::Arc;

use crate::common::{Subscription, Vector};

pub use buffer::{LiveDataBuffer, TimestampedData};
pub use live_data::{LiveData, SmoothedLiveData};
pub use recorder::{Recorder, Recording, RecordingWarning};

/// One N-axis reading together with the labels of its axes
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSample {
    pub vector: Vector,
    pub labels: Arc<[String]>,
}

impl LiveSample {
    pub fn new(values: Vec<f64>, labels: Arc<[String]>) -> Self {
        LiveSample {
            vector: Vector::new(values),
            labels,
        }
    }
}

/// A push-based stream of live samples
pub trait LiveSource: Send + Sync {
    /// Get the source name
    fn name(&self) -> &str;

    /// Labels of the axes this source produces
    fn labels(&self) -> Arc<[String]>;

    /// Receive every sample pushed from now on
    fn subscribe_samples(&self, callback: Box<dyn Fn(&LiveSample) + Send + Sync>) -> Subscription;
}

/// Axis labels of a tri-axis accelerometer
pub fn accelerometer_labels() -> Arc<[String]> {
    Arc::from(vec!["x".to_string(), "y".to_string(), "z".to_string()])
}
