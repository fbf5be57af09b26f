//! Pipeline configuration
//!
//! One immutable [`PipelineConfig`] value is built up front (in code or from
//! JSON) and handed to every component constructor. Nothing reads process-wide
//! state.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Incremental aggregate applied to each window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    /// Per-metric sum over the window
    #[default]
    Sum,
    /// Number of records in the window
    Count,
    /// Per-metric mean over the window
    Average,
    /// Per-metric maximum over the window
    Max,
}

impl AggregateKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Count => "count",
            Self::Average => "average",
            Self::Max => "max",
        }
    }
}

/// Scoring model used by the batch score transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// Multivariate normal fit, Mahalanobis distance score
    #[default]
    Gaussian,
    /// Per-dimension median absolute deviation, robust z-score
    Mad,
}

/// Sliding window parameters
///
/// Sizes are durations in the units of the time column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub window_size: f64,
    pub slide_size: f64,
    #[serde(default)]
    pub aggregate: AggregateKind,
}

impl WindowConfig {
    /// Window of `window_size` advancing by `slide_size`, summing metrics
    pub fn new(window_size: f64, slide_size: f64) -> Self {
        Self {
            window_size,
            slide_size,
            aggregate: AggregateKind::default(),
        }
    }

    /// Tumbling (non-overlapping) window
    pub fn tumbling(window_size: f64) -> Self {
        Self::new(window_size, window_size)
    }

    pub fn with_aggregate(mut self, aggregate: AggregateKind) -> Self {
        self.aggregate = aggregate;
        self
    }

    /// Check sizes are usable
    pub fn validate(&self) -> Result<()> {
        if !(self.window_size.is_finite() && self.window_size > 0.0) {
            return Err(Error::invalid_option(
                "window_size",
                format!("{} must be a positive finite duration", self.window_size),
            ));
        }
        if !(self.slide_size.is_finite() && self.slide_size > 0.0) {
            return Err(Error::invalid_option(
                "slide_size",
                format!("{} must be a positive finite duration", self.slide_size),
            ));
        }
        if self.slide_size > self.window_size {
            return Err(Error::invalid_option(
                "slide_size",
                format!(
                    "{} must not exceed window_size {}",
                    self.slide_size, self.window_size
                ),
            ));
        }
        Ok(())
    }
}

/// Complete configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run name, used to name dump artifacts
    pub query_name: String,
    /// Metric index holding the time coordinate
    pub time_column: usize,
    /// Optional sliding window applied before scoring
    pub window: Option<WindowConfig>,
    pub transform: TransformKind,
    /// Scores at or above this percentile of the batch are outliers
    pub target_percentile: f64,
    /// Dump every classification as `<index>,<flag>`
    pub classifier_dump: bool,
    pub dump_directory: PathBuf,
    /// File name for the scored grid dump
    pub dump_score_grid: Option<String>,
    pub score_grid_points_per_dimension: usize,
    /// Suffix for mixture parameter dumps
    pub dump_mixture_components: Option<String>,
    /// Suffix for before/after record dumps
    pub dump_before_after: Option<String>,
    pub min_support: f64,
    pub min_risk_ratio: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            query_name: "default".to_string(),
            time_column: 0,
            window: None,
            transform: TransformKind::default(),
            target_percentile: 0.99,
            classifier_dump: false,
            dump_directory: PathBuf::from("dump_out"),
            dump_score_grid: None,
            score_grid_points_per_dimension: 20,
            dump_mixture_components: None,
            dump_before_after: None,
            min_support: 0.01,
            min_risk_ratio: 3.0,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; unspecified options take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_query_name(mut self, name: impl Into<String>) -> Self {
        self.query_name = name.into();
        self
    }

    pub fn with_time_column(mut self, column: usize) -> Self {
        self.time_column = column;
        self
    }

    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_transform(mut self, transform: TransformKind) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_target_percentile(mut self, percentile: f64) -> Self {
        self.target_percentile = percentile;
        self
    }

    pub fn with_classifier_dump(mut self, enabled: bool) -> Self {
        self.classifier_dump = enabled;
        self
    }

    pub fn with_dump_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_directory = dir.into();
        self
    }

    pub fn with_score_grid_dump(mut self, file: impl Into<String>, points_per_dimension: usize) -> Self {
        self.dump_score_grid = Some(file.into());
        self.score_grid_points_per_dimension = points_per_dimension;
        self
    }

    pub fn with_mixture_dump(mut self, suffix: impl Into<String>) -> Self {
        self.dump_mixture_components = Some(suffix.into());
        self
    }

    pub fn with_before_after_dump(mut self, suffix: impl Into<String>) -> Self {
        self.dump_before_after = Some(suffix.into());
        self
    }

    pub fn with_explanation_thresholds(mut self, min_support: f64, min_risk_ratio: f64) -> Self {
        self.min_support = min_support;
        self.min_risk_ratio = min_risk_ratio;
        self
    }

    /// The window parameters, or a configuration error if none were given
    pub fn require_window(&self) -> Result<&WindowConfig> {
        self.window
            .as_ref()
            .ok_or_else(|| Error::missing_option("window"))
    }

    /// Path of a dump artifact inside the dump directory
    pub fn dump_path(&self, file_name: &str) -> PathBuf {
        self.dump_directory.join(file_name)
    }

    /// Validate every option a batch run depends on
    pub fn validate(&self) -> Result<()> {
        if self.query_name.trim().is_empty() {
            return Err(Error::invalid_option("query_name", "must not be empty"));
        }
        if let Some(window) = &self.window {
            window.validate()?;
        }
        if !(self.target_percentile > 0.0 && self.target_percentile < 1.0) {
            return Err(Error::invalid_option(
                "target_percentile",
                format!("{} must be in (0, 1)", self.target_percentile),
            ));
        }
        if self.dump_score_grid.is_some() && self.score_grid_points_per_dimension < 2 {
            return Err(Error::invalid_option(
                "score_grid_points_per_dimension",
                "a grid needs at least 2 points per dimension",
            ));
        }
        if !(self.min_support > 0.0 && self.min_support <= 1.0) {
            return Err(Error::invalid_option(
                "min_support",
                format!("{} must be in (0, 1]", self.min_support),
            ));
        }
        if !(self.min_risk_ratio.is_finite() && self.min_risk_ratio > 0.0) {
            return Err(Error::invalid_option(
                "min_risk_ratio",
                format!("{} must be positive", self.min_risk_ratio),
            ));
        }
        Ok(())
    }
}
