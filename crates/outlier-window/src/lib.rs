//! Incremental sliding-window aggregation
//!
//! [`SlidingWindowTransform`] turns a time-ordered record stream into one
//! aggregate record per window slide. The aggregate itself is pluggable through
//! [`WindowAggregate`]; it is updated by delta (records added, records expired)
//! so each slide costs time proportional to the slide.
//!
//! ## Usage
//!
//! ```rust
//! use outlier_core::{Record, Stage, WindowConfig};
//! use outlier_window::{IncrementalCount, SlidingWindowTransform};
//!
//! let mut windows = SlidingWindowTransform::new(
//!     IncrementalCount::new(),
//!     WindowConfig::new(10.0, 5.0),
//!     0,
//! );
//! windows.initialize().unwrap();
//! windows
//!     .consume([0.0, 1.0, 6.0, 11.0].iter().map(|t| Record::new(vec![*t])).collect())
//!     .unwrap();
//! windows.shutdown().unwrap();
//!
//! let starts: Vec<f64> = windows.stream().drain().iter().map(|r| r.metrics()[0]).collect();
//! assert_eq!(starts, vec![0.0, 5.0, 10.0]);
//! ```

pub mod aggregate;
pub mod sliding;

pub use aggregate::{
    aggregate_for, BoxedAggregate, IncrementalAverage, IncrementalCount, IncrementalMax,
    IncrementalSum, WindowAggregate,
};
pub use sliding::{SlidingWindowTransform, WindowState};
