//! Exponential smoothing of raw sensor series

use crate::config::SMOOTHING_FACTOR;

/// Incremental exponential smoother
///
/// Each output is `percentage * previous + (1 - percentage) * input`. Without
/// an initial value the first input passes through unchanged.
#[derive(Debug, Clone)]
pub struct Smoother {
    percentage: f64,
    latest: Option<f64>,
}

impl Smoother {
    /// Create a smoother seeded by its first input
    ///
    /// `percentage` is how strongly previous outputs weigh in; it is clamped
    /// to [0.001, 0.999].
    pub fn new(percentage: f64) -> Self {
        let clamped = percentage.clamp(0.001, 0.999);
        if clamped != percentage {
            log::warn!(
                "Smoothing percentage {} is outside 0..1, using {}",
                percentage,
                clamped
            );
        }
        Smoother {
            percentage: clamped,
            latest: None,
        }
    }

    /// Create a smoother that starts from `initial`
    pub fn with_initial(percentage: f64, initial: f64) -> Self {
        let mut smoother = Smoother::new(percentage);
        smoother.latest = Some(initial);
        smoother
    }

    /// Feed one value and return the smoothed result
    pub fn process(&mut self, value: f64) -> f64 {
        let next = match self.latest {
            Some(previous) => previous * self.percentage + value * (1.0 - self.percentage),
            None => value,
        };
        self.latest = Some(next);
        next
    }

    /// Most recent output, if any
    pub fn latest(&self) -> Option<f64> {
        self.latest
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Smoother::new(1.0 - SMOOTHING_FACTOR)
    }
}

/// Smooth one axis: `0.25 * raw + 0.75 * previous`, seeded by the first sample
pub fn smoothen(series: &[f64]) -> Vec<f64> {
    let mut smoother = Smoother::default();
    series.iter().map(|&v| smoother.process(v)).collect()
}

/// Smooth every axis independently
pub fn smoothen_axes(axes: &[Vec<f64>]) -> Vec<Vec<f64>> {
    axes.iter().map(|axis| smoothen(axis)).collect()
}
