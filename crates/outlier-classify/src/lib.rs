//! Outlier classifiers
//!
//! Classifiers follow the pull contract of
//! [`OutlierClassifier`](outlier_core::OutlierClassifier): consume scored
//! records, then iterate to get one [`ClassificationResult`] per record, in
//! order.
//!
//! ```rust
//! use outlier_classify::PercentileClassifier;
//! use outlier_core::{OutlierClassifier, Record};
//!
//! let mut classifier = PercentileClassifier::new(0.75).unwrap();
//! classifier
//!     .consume([0.1, 0.2, 0.3, 9.0].iter().map(|s| Record::new(vec![*s])).collect())
//!     .unwrap();
//! let flags: Vec<bool> = classifier.map(|r| r.unwrap().is_outlier()).collect();
//! assert_eq!(flags, vec![false, false, false, true]);
//! ```
//!
//! [`ClassificationResult`]: outlier_core::ClassificationResult

pub mod dump;
pub mod percentile;

pub use dump::DumpClassifier;
pub use percentile::PercentileClassifier;

use outlier_core::{BoxedClassifier, PipelineConfig, Result};

/// The configured classifier, wrapped in a dump decorator when requested
pub fn classifier_for(config: &PipelineConfig) -> Result<BoxedClassifier> {
    let classifier = PercentileClassifier::from_config(config)?;
    if config.classifier_dump {
        Ok(Box::new(DumpClassifier::create(classifier, config)?))
    } else {
        Ok(Box::new(classifier))
    }
}
