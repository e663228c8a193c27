//! Zero-crossing rate

use super::{require_samples, Filter, FilterLimits, FilterType};
use crate::error::Result;

/// Fraction of consecutive sample pairs whose sign differs
///
/// A sample `>= 0` followed by one `< 0` (or the reverse) counts as one
/// crossing. The count is divided by `n - 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroCrossingRateFilter;

impl Filter for ZeroCrossingRateFilter {
    fn filter(&self, values: &[f64]) -> Result<f64> {
        require_samples(FilterType::Zcr, values, self.min_samples())?;

        let crossings = values
            .windows(2)
            .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
            .count();

        Ok(crossings as f64 / (values.len() - 1) as f64)
    }

    fn filter_type(&self) -> FilterType {
        FilterType::Zcr
    }

    fn name(&self) -> &str {
        "Zero crossing rate"
    }

    fn description(&self) -> &str {
        "How often the signal changes sign"
    }

    fn min_samples(&self) -> usize {
        2
    }

    fn limits(&self) -> FilterLimits {
        FilterLimits { min: 0.0, max: 1.0 }
    }
}
