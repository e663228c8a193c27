//! Live sample stores fed by the transport layer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::{LiveDataBuffer, LiveSample, LiveSource, TimestampedData};
use crate::common::types::Millis;
use crate::common::{Observable, Subscription, Vector};
use crate::error::{CoreError, Result};
use crate::perception::smoothing::Smoother;

/// Subscribe to `latest`, skipping the replay of the value present at
/// subscription time
fn subscribe_new_samples(
    latest: &Observable<Option<LiveSample>>,
    callback: Box<dyn Fn(&LiveSample) + Send + Sync>,
) -> Subscription {
    let primed = AtomicBool::new(false);
    latest.subscribe(move |sample| {
        if !primed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(sample) = sample {
            callback(sample);
        }
    })
}

/// Buffered stream of raw samples
///
/// Cloning yields another handle to the same stream.
#[derive(Debug, Clone)]
pub struct LiveData {
    name: String,
    labels: Arc<[String]>,
    buffer: Arc<RwLock<LiveDataBuffer<Vector>>>,
    latest: Observable<Option<LiveSample>>,
}

impl LiveData {
    /// Create a new live data store holding up to `capacity` samples
    pub fn new(name: &str, labels: Arc<[String]>, capacity: usize) -> Self {
        LiveData {
            name: name.to_string(),
            labels,
            buffer: Arc::new(RwLock::new(LiveDataBuffer::new(capacity))),
            latest: Observable::new(None),
        }
    }

    /// Insert a sample received at `timestamp` and publish it
    pub fn put(&self, values: Vec<f64>, timestamp: Millis) -> Result<()> {
        if values.len() != self.labels.len() {
            return Err(CoreError::SizeMismatch {
                op: "push",
                left: values.len(),
                right: self.labels.len(),
            });
        }
        let sample = LiveSample::new(values, Arc::clone(&self.labels));
        self.buffer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add_value(sample.vector.clone(), timestamp);
        self.latest.set(Some(sample));
        Ok(())
    }

    /// See [`LiveDataBuffer::series`]
    pub fn series(
        &self,
        now: Millis,
        duration: Millis,
        count: usize,
    ) -> Result<Vec<TimestampedData<Vector>>> {
        self.buffer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .series(now, duration, count)
    }

    pub fn newest_values(&self, count: usize) -> Vec<Option<Vector>> {
        self.buffer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .newest_values(count)
    }

    pub fn buffer_utilization(&self) -> f64 {
        self.buffer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .utilization()
    }

    pub fn latest(&self) -> Option<LiveSample> {
        self.latest.get()
    }
}

impl LiveSource for LiveData {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> Arc<[String]> {
        Arc::clone(&self.labels)
    }

    fn subscribe_samples(&self, callback: Box<dyn Fn(&LiveSample) + Send + Sync>) -> Subscription {
        subscribe_new_samples(&self.latest, callback)
    }
}

/// Exponentially smoothed view of a [`LiveData`] stream, for display
///
/// Each axis is smoothed as `0.75 * previous + 0.25 * new`.
pub struct SmoothedLiveData {
    name: String,
    labels: Arc<[String]>,
    latest: Observable<Option<LiveSample>>,
    upstream: Option<Subscription>,
}

impl SmoothedLiveData {
    pub fn new(reference: &LiveData) -> Self {
        let labels = reference.labels();
        let latest: Observable<Option<LiveSample>> = Observable::new(None);
        let smoothers = Mutex::new(vec![Smoother::default(); labels.len()]);

        let publisher = latest.clone();
        let upstream = reference.subscribe_samples(Box::new(move |sample: &LiveSample| {
            let smoothed: Vec<f64> = {
                let mut smoothers = smoothers.lock().unwrap_or_else(PoisonError::into_inner);
                sample
                    .vector
                    .values()
                    .iter()
                    .zip(smoothers.iter_mut())
                    .map(|(&value, smoother)| smoother.process(value))
                    .collect()
            };
            publisher.set(Some(LiveSample::new(smoothed, Arc::clone(&sample.labels))));
        }));

        SmoothedLiveData {
            name: format!("{} (smoothed)", reference.name()),
            labels,
            latest,
            upstream: Some(upstream),
        }
    }

    pub fn latest(&self) -> Option<LiveSample> {
        self.latest.get()
    }
}

impl Drop for SmoothedLiveData {
    fn drop(&mut self) {
        if let Some(upstream) = self.upstream.take() {
            upstream.unsubscribe();
        }
    }
}

impl LiveSource for SmoothedLiveData {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> Arc<[String]> {
        Arc::clone(&self.labels)
    }

    fn subscribe_samples(&self, callback: Box<dyn Fn(&LiveSample) + Send + Sync>) -> Subscription {
        subscribe_new_samples(&self.latest, callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::sensors::accelerometer_labels;

    #[test]
    fn test_put_rejects_wrong_axis_count() {
        let live = LiveData::new("accelerometer", accelerometer_labels(), 10);
        assert!(live.put(vec![1.0, 2.0], 0).is_err());
        assert!(live.put(vec![1.0, 2.0, 3.0], 0).is_ok());
        assert_eq!(live.latest().unwrap().vector.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_subscribers_only_see_new_samples() {
        let live = LiveData::new("accelerometer", accelerometer_labels(), 10);
        live.put(vec![9.0, 9.0, 9.0], 0).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = live.subscribe_samples(Box::new(move |s: &LiveSample| {
            seen_clone.lock().unwrap().push(s.vector.values()[0]);
        }));
        live.put(vec![1.0, 0.0, 0.0], 10).unwrap();
        live.put(vec![2.0, 0.0, 0.0], 20).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_smoothed_stream_matches_batch_smoothing() {
        let live = LiveData::new("accelerometer", accelerometer_labels(), 10);
        let smoothed = SmoothedLiveData::new(&live);

        let ys = [4.0, 4.0, 12.0, 10.0, 10.0];
        let mut outputs = Vec::new();
        for (i, y) in ys.iter().enumerate() {
            live.put(vec![1.0, *y, 0.0], i as u64).unwrap();
            outputs.push(smoothed.latest().unwrap().vector.values()[1]);
        }
        assert_eq!(outputs, vec![4.0, 4.0, 6.0, 7.0, 7.75]);
    }
}
