//! Core types and stage contracts for outlier pipelines
//!
//! This crate provides the pieces every other outlier-stream crate builds on:
//!
//! - [`Record`]: the unit of data flow, positional metrics plus attributes
//! - [`ResultStream`]: single-use append/drain buffer between stages
//! - [`Stage`] / [`OutlierClassifier`]: the push- and pull-style stage contracts
//! - [`PipelineConfig`]: explicit, immutable run configuration
//! - [`PipelineContext`]: per-run trace ID and phase timing
//!
//! # Example
//!
//! ```rust
//! use outlier_core::{Record, ResultStream};
//!
//! let mut stream = ResultStream::new();
//! stream.push(Record::new(vec![0.0, 1.5]));
//! assert_eq!(stream.drain().len(), 1);
//! assert!(stream.drain().is_empty());
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod record;
pub mod stage;
pub mod stream;

// Re-export core types
pub use config::{AggregateKind, PipelineConfig, TransformKind, WindowConfig};
pub use context::PipelineContext;
pub use error::{Error, Result};
pub use record::{ClassificationResult, Record};
pub use stage::{BoxedClassifier, BoxedTransform, FeatureTransform, OutlierClassifier, Stage};
pub use stream::ResultStream;
