//! Median absolute deviation scoring
//!
//! Per dimension, the fit keeps the median and a scale estimate. A point's
//! score is its largest robust z-score across dimensions.

use crate::model::BatchTrainScore;
use outlier_core::{Error, Result};
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Makes MAD a consistent estimator of the standard deviation under normality
const MAD_CONSISTENCY: f64 = 1.4826;
/// Same, for the mean absolute deviation fallback
const MEAN_AD_CONSISTENCY: f64 = 1.2533;

#[derive(Debug, Clone, PartialEq)]
struct DimensionFit {
    median: f64,
    /// Zero when the dimension has no spread at all
    scale: f64,
}

/// Robust univariate scoring applied per dimension
#[derive(Debug, Clone, Default)]
pub struct MadModel {
    fits: Vec<DimensionFit>,
}

impl MadModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Median and scale per dimension, in dimension order
    pub fn parameters(&self) -> Vec<(f64, f64)> {
        self.fits.iter().map(|f| (f.median, f.scale)).collect()
    }

    fn fit_dimension(values: Vec<f64>) -> DimensionFit {
        let median = Data::new(values.clone()).quantile(0.5);
        let deviations: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
        let mad = Data::new(deviations.clone()).quantile(0.5);
        // Over half the values equal the median: fall back to the mean deviation
        let scale = if mad > 0.0 {
            mad * MAD_CONSISTENCY
        } else {
            deviations.iter().mean() * MEAN_AD_CONSISTENCY
        };
        DimensionFit { median, scale }
    }
}

impl BatchTrainScore for MadModel {
    fn train(&mut self, points: &[Vec<f64>]) -> Result<()> {
        let Some(first) = points.first() else {
            return Err(Error::InsufficientData {
                expected: 1,
                actual: 0,
            });
        };
        let dims = first.len();
        if let Some(bad) = points.iter().find(|p| p.len() != dims) {
            return Err(Error::dimension_mismatch(dims, bad.len(), "MAD fit"));
        }

        self.fits = (0..dims)
            .map(|d| Self::fit_dimension(points.iter().map(|p| p[d]).collect()))
            .collect();
        Ok(())
    }

    fn score(&self, point: &[f64]) -> Result<f64> {
        if self.fits.is_empty() {
            return Err(Error::Computation("MAD model scored before training".to_string()));
        }
        if point.len() != self.fits.len() {
            return Err(Error::dimension_mismatch(self.fits.len(), point.len(), "MAD score"));
        }
        // Dimensions without spread carry no information and are skipped
        Ok(self
            .fits
            .iter()
            .zip(point)
            .filter(|(fit, _)| fit.scale > 0.0)
            .map(|(fit, value)| (value - fit.median).abs() / fit.scale)
            .fold(0.0, f64::max))
    }

    fn name(&self) -> &'static str {
        "mad"
    }
}
