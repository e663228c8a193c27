//! Filtering algorithms that reduce one axis of a window to a single feature

pub mod filter_set;
pub mod peaks;
pub mod statistics;
pub mod zero_crossing;

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use crate::error::{CoreError, Result};

pub use filter_set::FilterSet;
pub use peaks::PeaksFilter;
pub use statistics::{
    MaxFilter, MeanFilter, MinFilter, RootMeanSquareFilter, StandardDeviationFilter,
    TotalAccFilter,
};
pub use zero_crossing::ZeroCrossingRateFilter;

/// Tag identifying each filter kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    Max,
    Min,
    Mean,
    Std,
    Peaks,
    Acc,
    Zcr,
    Rms,
}

impl FilterType {
    const ALL: [FilterType; 8] = [
        FilterType::Max,
        FilterType::Min,
        FilterType::Mean,
        FilterType::Std,
        FilterType::Peaks,
        FilterType::Acc,
        FilterType::Zcr,
        FilterType::Rms,
    ];

    /// Every filter type, in declaration order
    pub fn all() -> impl Iterator<Item = FilterType> {
        Self::ALL.into_iter()
    }

    /// Build the filter implementing this tag
    pub fn create(self) -> Box<dyn Filter> {
        match self {
            FilterType::Max => Box::new(MaxFilter),
            FilterType::Min => Box::new(MinFilter),
            FilterType::Mean => Box::new(MeanFilter),
            FilterType::Std => Box::new(StandardDeviationFilter),
            FilterType::Peaks => Box::new(PeaksFilter::new()),
            FilterType::Acc => Box::new(TotalAccFilter),
            FilterType::Zcr => Box::new(ZeroCrossingRateFilter),
            FilterType::Rms => Box::new(RootMeanSquareFilter),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Max => "max",
            FilterType::Min => "min",
            FilterType::Mean => "mean",
            FilterType::Std => "std",
            FilterType::Peaks => "peaks",
            FilterType::Acc => "acc",
            FilterType::Zcr => "zcr",
            FilterType::Rms => "rms",
        }
    }
}

impl Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        FilterType::all()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownFilter(s.to_string()))
    }
}

/// Display range of a filter's output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterLimits {
    pub min: f64,
    pub max: f64,
}

/// A stateless reduction of same-axis samples to one scalar
pub trait Filter: Debug + Send + Sync {
    /// Filter the input window
    fn filter(&self, values: &[f64]) -> Result<f64>;

    fn filter_type(&self) -> FilterType;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Smallest window this filter can operate on
    fn min_samples(&self) -> usize {
        1
    }

    fn limits(&self) -> FilterLimits;
}

/// Fail unless `values` holds at least `min` samples
pub(crate) fn require_samples(filter: FilterType, values: &[f64], min: usize) -> Result<()> {
    if values.is_empty() {
        return Err(CoreError::EmptyInput { filter });
    }
    if values.len() < min {
        return Err(CoreError::TooShort {
            filter,
            required: min,
            actual: values.len(),
        });
    }
    Ok(())
}

/// Arithmetic mean. NaN on an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation. NaN on an empty slice.
pub(crate) fn stddev(values: &[f64]) -> f64 {
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (sum_sq / values.len() as f64).sqrt()
}
