//! Engines that drive prediction on live data
pub mod polling;

pub use polling::PollingPredictorEngine;

use crate::common::Subscription;

/// Snapshot published to engine subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineData {
    pub is_running: bool,
}

/// A prediction driver that can be paused and resumed
pub trait Engine: Send + Sync {
    /// Resume predicting
    fn start(&self);

    /// Pause predicting; confidences keep their last values
    fn stop(&self);

    fn is_running(&self) -> bool;

    /// Get the name of this engine
    fn name(&self) -> &str;

    fn subscribe(&self, callback: Box<dyn Fn(&EngineData) + Send + Sync>) -> Subscription;
}
