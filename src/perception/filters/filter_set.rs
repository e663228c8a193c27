//! Ordered, de-duplicated collection of filters

use std::sync::Arc;

use super::{Filter, FilterType};
use crate::common::{Observable, Subscription};
use crate::error::{CoreError, Result};

/// Snapshot of the filters in registration order
pub type FilterList = Vec<Arc<dyn Filter>>;

/// The filters applied to every axis of a window
///
/// The order of registration is the order of the computed features, so it
/// must be identical between training and prediction. Every mutation swaps
/// the whole list and notifies subscribers with the new snapshot.
#[derive(Debug, Clone)]
pub struct FilterSet {
    filters: Observable<FilterList>,
}

impl FilterSet {
    /// Create an empty filter set
    pub fn new() -> Self {
        FilterSet {
            filters: Observable::new(Vec::new()),
        }
    }

    /// Create a filter set holding `types` in the given order
    pub fn with_types(types: &[FilterType]) -> Result<Self> {
        let set = FilterSet::new();
        set.set(types)?;
        Ok(set)
    }

    /// Every filter type, in declaration order
    pub fn with_all_filters() -> Self {
        FilterSet {
            filters: Observable::new(FilterType::all().map(|t| Arc::from(t.create())).collect()),
        }
    }

    /// Apply each filter to the same window, one scalar per filter
    pub fn compute(&self, values: &[f64]) -> Result<Vec<f64>> {
        self.filters
            .get()
            .iter()
            .map(|filter| filter.filter(values))
            .collect()
    }

    /// Like [`FilterSet::compute`] but each result is mapped from the
    /// filter's display limits onto 0..1
    pub fn compute_normalized(&self, values: &[f64]) -> Result<Vec<f64>> {
        self.filters
            .get()
            .iter()
            .map(|filter| {
                let value = filter.filter(values)?;
                let limits = filter.limits();
                Ok((value - limits.min) / (limits.max - limits.min))
            })
            .collect()
    }

    /// Append a filter; fails if one of the same type is present
    pub fn add(&self, filter_type: FilterType) -> Result<()> {
        self.filters.try_update(|filters| {
            if filters.iter().any(|f| f.filter_type() == filter_type) {
                return Err(CoreError::DuplicateFilter(filter_type));
            }
            filters.push(Arc::from(filter_type.create()));
            Ok(())
        })?;
        log::info!("Filters: added {}", filter_type);
        Ok(())
    }

    /// Remove the filter of `filter_type`; no-op when absent
    pub fn remove(&self, filter_type: FilterType) {
        if !self.has(filter_type) {
            return;
        }
        self.filters
            .update(|filters| filters.retain(|f| f.filter_type() != filter_type));
        log::info!("Filters: removed {}", filter_type);
    }

    /// Replace the whole collection
    pub fn set(&self, types: &[FilterType]) -> Result<()> {
        let mut next: FilterList = Vec::with_capacity(types.len());
        for &filter_type in types {
            if next.iter().any(|f| f.filter_type() == filter_type) {
                return Err(CoreError::DuplicateFilter(filter_type));
            }
            next.push(Arc::from(filter_type.create()));
        }
        log::info!("Filters: setting {:?}", types);
        self.filters.set(next);
        Ok(())
    }

    pub fn clear(&self) {
        self.filters.set(Vec::new());
    }

    pub fn has(&self, filter_type: FilterType) -> bool {
        self.filters
            .get()
            .iter()
            .any(|f| f.filter_type() == filter_type)
    }

    pub fn count(&self) -> usize {
        self.filters.get().len()
    }

    /// Filter types in registration order
    pub fn types(&self) -> Vec<FilterType> {
        self.filters.get().iter().map(|f| f.filter_type()).collect()
    }

    /// Largest minimum window among the filters, 0 when empty
    pub fn min_samples(&self) -> usize {
        self.filters
            .get()
            .iter()
            .map(|f| f.min_samples())
            .max()
            .unwrap_or(0)
    }

    /// Observe the filter list
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&FilterList) + Send + Sync + 'static,
    {
        self.filters.subscribe(callback)
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        Self::with_all_filters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_add_rejects_duplicates() {
        let set = FilterSet::new();
        set.add(FilterType::Max).unwrap();
        assert_eq!(
            set.add(FilterType::Max),
            Err(CoreError::DuplicateFilter(FilterType::Max))
        );
        assert_eq!(set.count(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let set = FilterSet::with_types(&[FilterType::Min]).unwrap();
        set.remove(FilterType::Rms);
        assert_eq!(set.types(), vec![FilterType::Min]);
        set.remove(FilterType::Min);
        assert_eq!(set.count(), 0);
    }

    #[test]
    fn test_compute_preserves_registration_order() {
        let set = FilterSet::new();
        set.add(FilterType::Min).unwrap();
        set.add(FilterType::Max).unwrap();
        set.add(FilterType::Mean).unwrap();

        let values = [1.0, 5.0, 3.0];
        for _ in 0..3 {
            assert_eq!(set.compute(&values).unwrap(), vec![1.0, 5.0, 3.0]);
        }
    }

    #[test]
    fn test_set_replaces_and_rejects_duplicates() {
        let set = FilterSet::with_all_filters();
        assert_eq!(set.count(), 8);

        set.set(&[FilterType::Rms, FilterType::Acc]).unwrap();
        assert_eq!(set.types(), vec![FilterType::Rms, FilterType::Acc]);

        assert!(set.set(&[FilterType::Zcr, FilterType::Zcr]).is_err());
        assert_eq!(set.types(), vec![FilterType::Rms, FilterType::Acc]);
    }

    #[test]
    fn test_compute_normalized_uses_limits() {
        let set = FilterSet::with_types(&[FilterType::Max, FilterType::Zcr]).unwrap();
        let normalized = set.compute_normalized(&[0.0, 1.2, -1.0]).unwrap();
        assert!((normalized[0] - 0.75).abs() < 1e-12);
        assert!((normalized[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_min_samples_follows_strictest_filter() {
        let set = FilterSet::with_types(&[FilterType::Mean, FilterType::Zcr]).unwrap();
        assert_eq!(set.min_samples(), 2);
        set.add(FilterType::Peaks).unwrap();
        assert_eq!(set.min_samples(), 7);
        set.clear();
        assert_eq!(set.min_samples(), 0);
    }

    #[test]
    fn test_subscribers_see_each_mutation() {
        let set = FilterSet::new();
        let counts = Arc::new(Mutex::new(Vec::new()));
        let counts_clone = Arc::clone(&counts);
        let _sub = set.subscribe(move |filters| counts_clone.lock().unwrap().push(filters.len()));

        set.add(FilterType::Max).unwrap();
        set.add(FilterType::Min).unwrap();
        let _ = set.add(FilterType::Min);
        set.clear();

        assert_eq!(*counts.lock().unwrap(), vec![0, 1, 2, 0]);
    }
}
