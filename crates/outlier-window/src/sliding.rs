//! Sliding window transform
//!
//! Drives a [`WindowAggregate`] over a time-ordered record stream. Windows are
//! half-open intervals `[start, start + window_size)`; each slide advances
//! `start` by `slide_size` and emits one aggregate record stamped with the
//! window start.
//!
//! The engine keeps two buffers:
//!
//! - the **window**: records already merged into the aggregate, oldest first
//! - the **slide**: records that arrived since the last emission
//!
//! An emission expires the window prefix with `time < start`, merges the slide,
//! and hands exactly those two deltas to the aggregate. Input is assumed sorted
//! by time; it is not re-sorted.

use crate::aggregate::{aggregate_for, BoxedAggregate, WindowAggregate};
use outlier_core::{Error, PipelineConfig, Record, Result, ResultStream, Stage, WindowConfig};
use std::collections::VecDeque;
use tracing::{debug, instrument};

/// Lifecycle of the window engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowState {
    /// No record seen yet; there is no window
    Uninitialized,
    /// Windows start at `origin + n * slide_size`
    Active { origin: f64 },
    /// Shut down; terminal
    Draining,
}

/// Sliding window engine over an incremental aggregate
pub struct SlidingWindowTransform<A: WindowAggregate = BoxedAggregate> {
    aggregate: A,
    config: WindowConfig,
    time_column: usize,
    initialized: bool,
    state: WindowState,
    /// Number of windows emitted so far
    emitted: u64,
    window: VecDeque<Record>,
    slide: Vec<Record>,
    output: ResultStream<Record>,
}

impl SlidingWindowTransform<BoxedAggregate> {
    /// Build the engine and its aggregate from a pipeline configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let window = config.require_window()?;
        Ok(Self::new(
            aggregate_for(window.aggregate),
            window.clone(),
            config.time_column,
        ))
    }
}

impl<A: WindowAggregate> SlidingWindowTransform<A> {
    pub fn new(aggregate: A, config: WindowConfig, time_column: usize) -> Self {
        Self {
            aggregate,
            config,
            time_column,
            initialized: false,
            state: WindowState::Uninitialized,
            emitted: 0,
            window: VecDeque::new(),
            slide: Vec::new(),
            output: ResultStream::new(),
        }
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Start of the current window, `None` before the first record
    pub fn window_start(&self) -> Option<f64> {
        match self.state {
            WindowState::Active { origin } => Some(self.start_at(origin)),
            _ => None,
        }
    }

    /// Records currently merged into the window
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Records waiting for the next emission
    pub fn pending_len(&self) -> usize {
        self.slide.len()
    }

    pub fn aggregate(&self) -> &A {
        &self.aggregate
    }

    /// Computed from the origin rather than accumulated, so emission times
    /// carry no rounding drift.
    fn start_at(&self, origin: f64) -> f64 {
        origin + self.emitted as f64 * self.config.slide_size
    }

    fn time_of(&self, record: &Record) -> Result<f64> {
        let time = record.time(self.time_column)?;
        if !time.is_finite() {
            return Err(Error::InvalidInput(format!(
                "time column {} holds non-finite value {time}",
                self.time_column
            )));
        }
        Ok(time)
    }

    /// Emit the aggregate for the window starting at `origin + emitted * slide`
    fn emit(&mut self, origin: f64) -> Result<()> {
        let start = self.start_at(origin);

        let mut expired_len = 0;
        for record in &self.window {
            if self.time_of(record)? < start {
                expired_len += 1;
            } else {
                break;
            }
        }
        // Nothing leaves the window until the aggregate has accepted the delta
        let expired = &self.window.make_contiguous()[..expired_len];
        let mut aggregated = self.aggregate.update_window(&self.slide, expired)?;
        aggregated.stamp_time(self.time_column, start)?;

        debug!(
            window_start = start,
            added = self.slide.len(),
            expired = expired_len,
            "emitting window"
        );

        self.window.drain(..expired_len);
        self.window.extend(self.slide.drain(..));
        self.output.push(aggregated);
        self.emitted += 1;
        Ok(())
    }
}

impl<A: WindowAggregate> Stage for SlidingWindowTransform<A> {
    type Input = Record;
    type Output = Record;

    fn initialize(&mut self) -> Result<()> {
        self.config.validate()?;
        self.initialized = true;
        Ok(())
    }

    #[instrument(skip(self, batch), fields(aggregate = self.aggregate.name(), batch_len = batch.len()))]
    fn consume(&mut self, batch: Vec<Record>) -> Result<()> {
        if !self.initialized {
            return Err(Error::ContractViolation(
                "sliding window consumed before initialize".to_string(),
            ));
        }
        let Some(first) = batch.first() else {
            return Ok(());
        };
        let origin = match self.state {
            WindowState::Active { origin } => origin,
            WindowState::Uninitialized => {
                let origin = self.time_of(first)?;
                self.state = WindowState::Active { origin };
                origin
            }
            WindowState::Draining => {
                return Err(Error::ContractViolation(
                    "sliding window consumed after shutdown".to_string(),
                ))
            }
        };

        for record in batch {
            let time = self.time_of(&record)?;
            while time >= self.start_at(origin) + self.config.window_size {
                self.emit(origin)?;
            }
            self.slide.push(record);
        }
        Ok(())
    }

    fn stream(&mut self) -> &mut ResultStream<Record> {
        &mut self.output
    }

    /// Flush the pending slide, then keep emitting while the window still
    /// holds a record at or after the next window start.
    fn shutdown(&mut self) -> Result<()> {
        let WindowState::Active { origin } = self.state else {
            self.state = WindowState::Draining;
            return Ok(());
        };

        self.emit(origin)?;
        while let Some(last) = self.window.back() {
            if self.time_of(last)? < self.start_at(origin) {
                break;
            }
            self.emit(origin)?;
        }

        debug!(windows = self.emitted, "sliding window drained");
        self.state = WindowState::Draining;
        Ok(())
    }
}
