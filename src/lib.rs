//! Sliding-window aggregation and composable outlier scoring pipelines
//!
//! This crate re-exports the workspace members:
//!
//! - [`core`]: records, result streams, stage contracts, configuration
//! - [`window`]: incremental sliding-window aggregation
//! - [`score`]: scoring models, the batch scoring stage, reporting decorators
//! - [`classify`]: percentile classifier and classification dumps
//! - [`summary`]: outlier summaries and attribute explanations
//! - [`pipeline`]: ingesters and the end-to-end analysis pipeline

pub use outlier_classify as classify;
pub use outlier_core as core;
pub use outlier_pipeline as pipeline;
pub use outlier_score as score;
pub use outlier_summary as summary;
pub use outlier_window as window;

pub mod prelude {
    pub use outlier_core::{
        ClassificationResult, Error, FeatureTransform, OutlierClassifier, PipelineConfig, Record,
        Result, ResultStream, Stage, WindowConfig,
    };
    pub use outlier_pipeline::{AnalysisPipeline, AnalysisResult, DataIngester, MemoryIngester};
}
