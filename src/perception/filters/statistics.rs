//! Windowed summary statistics

use super::{mean, require_samples, stddev, Filter, FilterLimits, FilterType};
use crate::error::Result;

const ACCELERATION_LIMITS: FilterLimits = FilterLimits { min: -2.4, max: 2.4 };

/// Largest sample in the window
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxFilter;

impl Filter for MaxFilter {
    fn filter(&self, values: &[f64]) -> Result<f64> {
        require_samples(FilterType::Max, values, self.min_samples())?;
        Ok(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }

    fn filter_type(&self) -> FilterType {
        FilterType::Max
    }

    fn name(&self) -> &str {
        "Max"
    }

    fn description(&self) -> &str {
        "The highest value in the recording"
    }

    fn limits(&self) -> FilterLimits {
        ACCELERATION_LIMITS
    }
}

/// Smallest sample in the window
#[derive(Debug, Clone, Copy, Default)]
pub struct MinFilter;

impl Filter for MinFilter {
    fn filter(&self, values: &[f64]) -> Result<f64> {
        require_samples(FilterType::Min, values, self.min_samples())?;
        Ok(values.iter().copied().fold(f64::INFINITY, f64::min))
    }

    fn filter_type(&self) -> FilterType {
        FilterType::Min
    }

    fn name(&self) -> &str {
        "Min"
    }

    fn description(&self) -> &str {
        "The lowest value in the recording"
    }

    fn limits(&self) -> FilterLimits {
        ACCELERATION_LIMITS
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MeanFilter;

impl Filter for MeanFilter {
    fn filter(&self, values: &[f64]) -> Result<f64> {
        require_samples(FilterType::Mean, values, self.min_samples())?;
        Ok(mean(values))
    }

    fn filter_type(&self) -> FilterType {
        FilterType::Mean
    }

    fn name(&self) -> &str {
        "Mean"
    }

    fn description(&self) -> &str {
        "The average of all values in the recording"
    }

    fn limits(&self) -> FilterLimits {
        ACCELERATION_LIMITS
    }
}

/// Population standard deviation (divides by n, not n - 1)
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDeviationFilter;

impl Filter for StandardDeviationFilter {
    fn filter(&self, values: &[f64]) -> Result<f64> {
        require_samples(FilterType::Std, values, self.min_samples())?;
        Ok(stddev(values))
    }

    fn filter_type(&self) -> FilterType {
        FilterType::Std
    }

    fn name(&self) -> &str {
        "Standard deviation"
    }

    fn description(&self) -> &str {
        "How much the values spread around their average"
    }

    fn limits(&self) -> FilterLimits {
        FilterLimits { min: 0.0, max: 2.4 }
    }
}

/// `sqrt(mean(x^2))`
#[derive(Debug, Clone, Copy, Default)]
pub struct RootMeanSquareFilter;

impl Filter for RootMeanSquareFilter {
    fn filter(&self, values: &[f64]) -> Result<f64> {
        require_samples(FilterType::Rms, values, self.min_samples())?;
        let sum_sq: f64 = values.iter().map(|v| v * v).sum();
        Ok((sum_sq / values.len() as f64).sqrt())
    }

    fn filter_type(&self) -> FilterType {
        FilterType::Rms
    }

    fn name(&self) -> &str {
        "Root mean square"
    }

    fn description(&self) -> &str {
        "The square root of the average squared value"
    }

    fn limits(&self) -> FilterLimits {
        FilterLimits { min: 0.0, max: 2.0 }
    }
}

/// Sum of absolute values over the window
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalAccFilter;

impl Filter for TotalAccFilter {
    fn filter(&self, values: &[f64]) -> Result<f64> {
        require_samples(FilterType::Acc, values, self.min_samples())?;
        Ok(values.iter().map(|v| v.abs()).sum())
    }

    fn filter_type(&self) -> FilterType {
        FilterType::Acc
    }

    fn name(&self) -> &str {
        "Total acceleration"
    }

    fn description(&self) -> &str {
        "The sum of all absolute values in the recording"
    }

    fn min_samples(&self) -> usize {
        2
    }

    fn limits(&self) -> FilterLimits {
        FilterLimits { min: 0.0, max: 160.0 }
    }
}
