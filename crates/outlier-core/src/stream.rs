//! Single-use result streams
//!
//! A [`ResultStream`] decouples what a stage produces from when its consumer
//! picks it up. Producers append; exactly one consumer drains. Draining hands
//! over the whole buffer and leaves the stream empty, so a second drain can
//! only ever observe an empty sequence.

use crate::error::{Error, Result};
use tracing::warn;

/// Append/drain buffer owned by a single stage
#[derive(Debug, Clone)]
pub struct ResultStream<T> {
    buffer: Vec<T>,
    drained: bool,
}

impl<T> ResultStream<T> {
    /// Create an empty stream
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            drained: false,
        }
    }

    /// Append one item
    ///
    /// Producing after a drain starts a new logical stream.
    pub fn push(&mut self, item: T) {
        self.drained = false;
        self.buffer.push(item);
    }

    /// Append every item of `items` in order
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        self.drained = false;
        self.buffer.extend(items);
    }

    /// Hand over everything buffered so far
    ///
    /// A second drain without intervening production returns an empty vector.
    pub fn drain(&mut self) -> Vec<T> {
        if self.drained {
            warn!("result stream drained again; returning an empty batch");
        }
        self.drained = true;
        std::mem::take(&mut self.buffer)
    }

    /// Like [`drain`](Self::drain) but reports a re-drain as a contract violation
    pub fn try_drain(&mut self, stream: &str) -> Result<Vec<T>> {
        if self.drained {
            return Err(Error::redrain(stream));
        }
        Ok(self.drain())
    }

    /// Read-only view of the items buffered and not yet drained
    pub fn buffered(&self) -> &[T] {
        &self.buffer
    }

    /// Number of items currently buffered
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether the last operation on this stream was a drain
    pub fn is_drained(&self) -> bool {
        self.drained
    }
}

impl<T> Default for ResultStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for ResultStream<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            buffer: iter.into_iter().collect(),
            drained: false,
        }
    }
}
