//! Batch scoring and score reporting
//!
//! Scoring is a [`BatchTrainScore`] model driven by [`BatchScoreTransform`]:
//! each consumed batch trains the model and is scored against it. Two
//! decorators report on the scorer without changing its output:
//!
//! - [`GridDumpingTransform`]: scored grid over the batch bounds, mixture
//!   parameters
//! - [`BeforeAfterDumpingTransform`]: CSV dumps of records in and out
//!
//! ```rust
//! use outlier_core::{Record, Stage};
//! use outlier_score::{BatchScoreTransform, MadModel};
//!
//! let mut scorer = BatchScoreTransform::new(MadModel::new());
//! scorer
//!     .consume([1.0, 2.0, 3.0, 40.0].iter().map(|v| Record::new(vec![*v])).collect())
//!     .unwrap();
//! let scores: Vec<f64> = scorer.stream().drain().iter().map(|r| r.metrics()[0]).collect();
//! assert!(scores[3] > scores[0]);
//! ```

pub mod before_after;
pub mod dump;
pub mod gaussian;
pub mod grid;
pub mod mad;
pub mod model;
pub mod transform;

pub use before_after::BeforeAfterDumpingTransform;
pub use dump::{DataArray, ScoredPoint};
pub use gaussian::GaussianModel;
pub use grid::{BoundingBox, GridDumpingTransform, MAX_GRID_POINTS};
pub use mad::MadModel;
pub use model::{model_for, BatchTrainScore, BoxedModel, MixtureModel};
pub use transform::{BatchScoreTransform, Projection, ScoredTransform};
