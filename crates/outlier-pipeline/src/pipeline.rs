//! Batch analysis pipeline
//!
//! One run: drain the ingester, optionally aggregate into sliding windows,
//! score (with whatever reporting decorators the configuration asks for),
//! classify, and summarize into an [`AnalysisResult`].

use crate::ingest::DataIngester;
use crate::result::AnalysisResult;
use outlier_classify::classifier_for;
use outlier_core::{
    BoxedTransform, ClassificationResult, Error, PipelineConfig, PipelineContext, Record, Result,
    Stage,
};
use outlier_score::{BatchScoreTransform, BeforeAfterDumpingTransform, GridDumpingTransform};
use outlier_summary::{BatchSummarizer, Summary};
use outlier_window::SlidingWindowTransform;
use tracing::{info, info_span};

pub struct AnalysisPipeline {
    config: PipelineConfig,
    initialized: bool,
}

/// Push a whole batch through a transform: initialize, consume, shutdown, drain
fn run_transform<T: Stage<Input = Record, Output = Record> + ?Sized>(
    transform: &mut T,
    records: Vec<Record>,
    name: &str,
) -> Result<Vec<Record>> {
    transform.initialize()?;
    transform.consume(records)?;
    transform.shutdown()?;
    transform.stream().try_drain(name)
}

impl AnalysisPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            initialized: false,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate the configuration; required before [`run`](Self::run)
    pub fn initialize(&mut self) -> Result<&mut Self> {
        self.config.validate()?;
        self.initialized = true;
        Ok(self)
    }

    /// The scoring chain: scorer, grid/mixture reporting, optional before/after dump
    fn scoring_chain(&self) -> BoxedTransform {
        let scorer = BatchScoreTransform::from_config(&self.config);
        let reported = GridDumpingTransform::from_config(scorer, &self.config);
        match &self.config.dump_before_after {
            Some(suffix) => Box::new(BeforeAfterDumpingTransform::new(
                reported,
                self.config.dump_directory.clone(),
                suffix.clone(),
            )),
            None => Box::new(reported),
        }
    }

    fn transform(&self, records: Vec<Record>) -> Result<Vec<Record>> {
        let records = if self.config.window.is_some() {
            let mut windows = SlidingWindowTransform::from_config(&self.config)?;
            let windowed = run_transform(&mut windows, records, "window")?;
            info!(windows = windowed.len(), "records aggregated into windows");
            windowed
        } else {
            records
        };
        run_transform(self.scoring_chain().as_mut(), records, "scoring")
    }

    fn classify(&self, scored: Vec<Record>) -> Result<Vec<ClassificationResult>> {
        let mut classifier = classifier_for(&self.config)?;
        classifier.initialize()?;
        classifier.consume(scored)?;
        Ok(classifier.stream()?.drain())
    }

    fn summarize(&self, results: Vec<ClassificationResult>) -> Result<Summary> {
        let mut summarizer = BatchSummarizer::from_config(&self.config)?;
        summarizer.initialize()?;
        summarizer.consume(results)?;
        summarizer.shutdown()?;
        summarizer
            .stream()
            .try_drain("summary")?
            .into_iter()
            .next()
            .ok_or_else(|| Error::ContractViolation("summarizer produced no summary".to_string()))
    }

    /// Run the pipeline once over everything `ingester` holds
    pub fn run(&mut self, ingester: &mut dyn DataIngester) -> Result<AnalysisResult> {
        if !self.initialized {
            return Err(Error::ContractViolation(
                "pipeline run before initialize".to_string(),
            ));
        }
        let mut context = PipelineContext::new();
        let span = info_span!("run", trace_id = %context.trace_id, query = %self.config.query_name);
        let _guard = span.enter();

        let records = context.time_stage("load", || ingester.drain())?;
        let load_time = context.stage_timing("load");
        info!(records = records.len(), ?load_time, "data loaded");

        let scored = context.time_stage("transform", || self.transform(records))?;
        let results = context.time_stage("classify", || self.classify(scored))?;
        let summary = context.time_stage("summarize", || self.summarize(results))?;

        let total = context.elapsed().saturating_sub(load_time);
        let summarization_time = summary.creation_time;
        let execution_time = total.saturating_sub(summarization_time);
        let analysis = AnalysisResult {
            num_outliers: summary.num_outliers,
            num_inliers: summary.num_inliers,
            load_time,
            execution_time,
            summarization_time,
            itemsets: summary.itemsets,
        };
        info!(
            outliers = analysis.num_outliers,
            inliers = analysis.num_inliers,
            itemsets = analysis.itemsets.len(),
            ?total,
            tuples_per_sec = analysis.throughput(),
            "pipeline finished"
        );
        Ok(analysis)
    }
}
