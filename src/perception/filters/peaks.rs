//! Z-score peak counting
//!
//! Walks the window with a rolling mean and standard deviation taken over a
//! damped copy of the signal. A sample further than `threshold` standard
//! deviations (and at least `MIN_DEVIATION`) from the rolling mean is a
//! signal. Only the step into a positive signal counts as a peak, so a
//! plateau above the baseline is counted once.

use super::{mean, require_samples, stddev, Filter, FilterLimits, FilterType};
use crate::error::Result;

/// Absolute floor below which a deviation is never a signal
const MIN_DEVIATION: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    None,
    Positive,
    Negative,
}

/// Peak counter over a single axis
#[derive(Debug, Clone)]
pub struct PeaksFilter {
    lag: usize,
    threshold: f64,
    influence: f64,
}

impl PeaksFilter {
    pub fn new() -> Self {
        PeaksFilter {
            lag: 5,
            threshold: 3.5,
            influence: 0.5,
        }
    }

    fn count_peaks(&self, values: &[f64]) -> usize {
        let lag = self.lag;
        let mut signals = vec![Signal::None; values.len()];
        let mut filtered = values.to_vec();

        let mut avg = mean(&values[..lag]);
        let mut std = stddev(&values[..lag]);
        let mut peaks = 0;

        for i in lag..values.len() {
            let deviation = (values[i] - avg).abs();

            if deviation > MIN_DEVIATION && deviation > self.threshold * std {
                if values[i] > avg {
                    signals[i] = Signal::Positive;
                    if signals[i - 1] != Signal::Positive {
                        peaks += 1;
                    }
                } else {
                    signals[i] = Signal::Negative;
                }
                filtered[i] = self.influence * values[i] + (1.0 - self.influence) * filtered[i - 1];
            } else {
                filtered[i] = values[i];
            }

            // The window ends before `i`, so the newest sample only affects
            // the statistics one step later.
            let window = &filtered[i - lag..i];
            avg = mean(window);
            std = stddev(window);
        }

        peaks
    }
}

impl Default for PeaksFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for PeaksFilter {
    fn filter(&self, values: &[f64]) -> Result<f64> {
        require_samples(FilterType::Peaks, values, self.min_samples())?;
        Ok(self.count_peaks(values) as f64)
    }

    fn filter_type(&self) -> FilterType {
        FilterType::Peaks
    }

    fn name(&self) -> &str {
        "Peaks"
    }

    fn description(&self) -> &str {
        "The number of distinct peaks in the recording"
    }

    fn min_samples(&self) -> usize {
        self.lag + 2
    }

    fn limits(&self) -> FilterLimits {
        FilterLimits { min: 0.0, max: 10.0 }
    }
}
