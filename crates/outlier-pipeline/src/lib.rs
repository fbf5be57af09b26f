//! Batch outlier analysis
//!
//! [`AnalysisPipeline`] wires the other outlier-stream crates together:
//!
//! ```text
//! DataIngester -> [SlidingWindowTransform] -> BatchScoreTransform (+ dump decorators)
//!              -> PercentileClassifier [+ DumpClassifier] -> BatchSummarizer -> AnalysisResult
//! ```
//!
//! # Example
//!
//! ```rust
//! use outlier_core::{PipelineConfig, Record};
//! use outlier_pipeline::{AnalysisPipeline, MemoryIngester};
//!
//! let records: Vec<Record> = (0..50)
//!     .map(|i| Record::new(vec![if i == 25 { 1000.0 } else { (i % 5) as f64 }]))
//!     .collect();
//!
//! let mut pipeline = AnalysisPipeline::new(PipelineConfig::new().with_target_percentile(0.95));
//! pipeline.initialize().unwrap();
//! let result = pipeline.run(&mut MemoryIngester::new(records)).unwrap();
//! assert_eq!(result.total_records(), 50);
//! assert!(result.num_outliers >= 1);
//! ```

pub mod ingest;
pub mod pipeline;
pub mod result;

pub use ingest::{CsvIngester, CsvSource, DataIngester, MemoryIngester};
pub use pipeline::AnalysisPipeline;
pub use result::AnalysisResult;
