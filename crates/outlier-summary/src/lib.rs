//! Outlier summarization
//!
//! A summarizer is a [`Stage`](outlier_core::Stage) from classification
//! results to [`Summary`] values: outlier and inlier counts plus the attribute
//! values that best explain the outliers.

pub mod summarizer;
pub mod summary;

pub use summarizer::{risk_ratio, BatchSummarizer, Summarizer};
pub use summary::{ExplanationItem, ItemsetResult, Summary};
