//! Common utilities and types for the gesture core
pub mod observable;
pub mod vector;

pub use observable::{Observable, Subscription};
pub use vector::Vector;

/// Common types used across the codebase
pub mod types {
    /// Stable identifier of a gesture
    pub type GestureId = u64;

    /// Dense, zero-based position of a gesture in the training set
    pub type ClassIndex = usize;

    /// Milliseconds on the caller's clock
    pub type Millis = u64;
}
