//! Stage contracts
//!
//! Every unit of a pipeline obeys one of two contracts:
//!
//! - [`Stage`]: push style. The caller hands over batches with
//!   [`consume`](Stage::consume), later drains [`stream`](Stage::stream), and
//!   calls [`shutdown`](Stage::shutdown) to flush end-of-input state.
//! - [`OutlierClassifier`]: pull style. After consuming, the classifier is a
//!   finite, non-restartable iterator yielding one result per consumed record.
//!
//! Decorators implement the same trait as the stage they wrap and forward to
//! it, so wrapping never changes what the inner stage produces.

use crate::error::Result;
use crate::record::{ClassificationResult, Record};
use crate::stream::ResultStream;

/// Push-style pipeline stage
pub trait Stage {
    /// Item type accepted by [`consume`](Stage::consume)
    type Input;
    /// Item type produced into the output stream
    type Output;

    /// One-time setup, called before the first `consume`
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Process a finite batch; may be called any number of times
    fn consume(&mut self, batch: Vec<Self::Input>) -> Result<()>;

    /// The stage's output stream. Does not drain it.
    fn stream(&mut self) -> &mut ResultStream<Self::Output>;

    /// Flush end-of-input state and release held resources
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: Stage + ?Sized> Stage for Box<S> {
    type Input = S::Input;
    type Output = S::Output;

    fn initialize(&mut self) -> Result<()> {
        (**self).initialize()
    }

    fn consume(&mut self, batch: Vec<Self::Input>) -> Result<()> {
        (**self).consume(batch)
    }

    fn stream(&mut self) -> &mut ResultStream<Self::Output> {
        (**self).stream()
    }

    fn shutdown(&mut self) -> Result<()> {
        (**self).shutdown()
    }
}

/// A stage mapping records to records (scoring, windowing, reporting wrappers)
pub trait FeatureTransform: Stage<Input = Record, Output = Record> {}

impl<T> FeatureTransform for T where T: Stage<Input = Record, Output = Record> + ?Sized {}

/// Boxed transform used when the transform chain is assembled at runtime
pub type BoxedTransform = Box<dyn FeatureTransform>;

/// Pull-style classifier
///
/// `next` consumes one upstream record and yields its classification, in
/// order. Once `next` has returned `None` the classifier is exhausted; any
/// external resource it holds must be released by then.
pub trait OutlierClassifier: Iterator<Item = Result<ClassificationResult>> {
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Load a batch of scored records to classify
    fn consume(&mut self, records: Vec<Record>) -> Result<()>;

    /// Exhaust the classifier into a stream
    ///
    /// The first error aborts collection and is returned.
    fn stream(&mut self) -> Result<ResultStream<ClassificationResult>> {
        let mut stream = ResultStream::new();
        while let Some(result) = self.next() {
            stream.push(result?);
        }
        Ok(stream)
    }
}

impl<C: OutlierClassifier + ?Sized> OutlierClassifier for Box<C> {
    fn initialize(&mut self) -> Result<()> {
        (**self).initialize()
    }

    fn consume(&mut self, records: Vec<Record>) -> Result<()> {
        (**self).consume(records)
    }

    fn stream(&mut self) -> Result<ResultStream<ClassificationResult>> {
        (**self).stream()
    }
}

/// Boxed classifier used when an optional decorator is applied at runtime
pub type BoxedClassifier = Box<dyn OutlierClassifier>;
