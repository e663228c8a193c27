//! Fixed-capacity ring buffer of timestamped samples

use crate::common::types::Millis;
use crate::error::{CoreError, Result};

/// A value together with the time it was received
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampedData<T> {
    pub value: T,
    pub timestamp: Millis,
}

/// Ring buffer holding the newest `capacity` samples
///
/// Insertion is O(1); reads are O(n) in the number of items fetched.
#[derive(Debug, Clone)]
pub struct LiveDataBuffer<T> {
    buffer: Vec<Option<TimestampedData<T>>>,
    // Total number of insertions; never wraps back to zero
    write_ptr: usize,
    utilization: f64,
}

impl<T: Clone> LiveDataBuffer<T> {
    /// Create a new buffer. A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        LiveDataBuffer {
            buffer: vec![None; capacity.max(1)],
            write_ptr: 0,
            utilization: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of filled slots
    pub fn len(&self) -> usize {
        self.write_ptr.min(self.capacity())
    }

    pub fn is_empty(&self) -> bool {
        self.write_ptr == 0
    }

    pub fn add_value(&mut self, value: T, timestamp: Millis) {
        let index = self.write_ptr % self.capacity();
        self.buffer[index] = Some(TimestampedData { value, timestamp });
        self.write_ptr += 1;
    }

    /// The newest `count` values, newest first; `None` for unfilled slots
    pub fn newest_values(&self, count: usize) -> Vec<Option<T>> {
        (0..count)
            .map(|i| {
                if i >= self.len() {
                    return None;
                }
                let index = (self.write_ptr - 1 - i) % self.capacity();
                self.buffer[index].as_ref().map(|item| item.value.clone())
            })
            .collect()
    }

    /// `count` samples received within `duration` of `now`, oldest first
    ///
    /// The samples inside the time frame are thinned out evenly. Fails when
    /// fewer than `count` samples fall inside the time frame.
    pub fn series(
        &mut self,
        now: Millis,
        duration: Millis,
        count: usize,
    ) -> Result<Vec<TimestampedData<T>>> {
        let mut in_frame: Vec<&TimestampedData<T>> = Vec::new();
        for i in 0..self.len() {
            let index = (self.write_ptr - 1 - i) % self.capacity();
            let Some(element) = self.buffer[index].as_ref() else {
                break;
            };
            if now.saturating_sub(element.timestamp) > duration {
                break;
            }
            in_frame.push(element);
        }

        let capacity = self.capacity() as f64;
        self.utilization = (in_frame.len() as f64 / capacity).max(count as f64 / capacity);

        if in_frame.len() < count || count == 0 {
            return Err(CoreError::InsufficientBufferData {
                requested: count,
                available: in_frame.len(),
            });
        }

        let step = in_frame.len() / count;
        let mut series: Vec<TimestampedData<T>> =
            (0..count).map(|i| in_frame[step * i].clone()).collect();
        series.reverse();
        Ok(series)
    }

    /// Share of the buffer touched by the last [`LiveDataBuffer::series`] call
    pub fn utilization(&self) -> f64 {
        self.utilization
    }
}
