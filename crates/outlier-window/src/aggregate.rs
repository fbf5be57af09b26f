//! Incremental window aggregates
//!
//! A [`WindowAggregate`] owns the sufficient statistics for one window and
//! updates them by delta: the records that just joined the window and the
//! records that just left it. It never sees the full window contents, so the
//! cost of a slide is proportional to the slide, not the window.
//!
//! Every aggregate produces a record with the same number of metrics as its
//! inputs. The window engine overwrites the time column of that record
//! afterwards. An empty window aggregates to all-zero metrics.

use ordered_float::OrderedFloat;
use outlier_core::{AggregateKind, Error, Record, Result};
use std::collections::BTreeMap;

/// Incremental summary maintained across window slides
pub trait WindowAggregate {
    /// Fold `added` into the state, remove `expired` from it, and summarize
    fn update_window(&mut self, added: &[Record], expired: &[Record]) -> Result<Record>;

    fn name(&self) -> &'static str;
}

impl<A: WindowAggregate + ?Sized> WindowAggregate for Box<A> {
    fn update_window(&mut self, added: &[Record], expired: &[Record]) -> Result<Record> {
        (**self).update_window(added, expired)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

pub type BoxedAggregate = Box<dyn WindowAggregate>;

/// Build the aggregate named by the configuration
pub fn aggregate_for(kind: AggregateKind) -> BoxedAggregate {
    match kind {
        AggregateKind::Sum => Box::new(IncrementalSum::new()),
        AggregateKind::Count => Box::new(IncrementalCount::new()),
        AggregateKind::Average => Box::new(IncrementalAverage::new()),
        AggregateKind::Max => Box::new(IncrementalMax::new()),
    }
}

/// Width of the records seen so far, fixed by the first one
#[derive(Debug, Clone, Default)]
struct Dimensions(Option<usize>);

impl Dimensions {
    fn check(&mut self, record: &Record, context: &str) -> Result<usize> {
        let actual = record.dimensions();
        match self.0 {
            Some(expected) if expected != actual => {
                Err(Error::dimension_mismatch(expected, actual, context))
            }
            Some(expected) => Ok(expected),
            None => {
                self.0 = Some(actual);
                Ok(actual)
            }
        }
    }

    fn get(&self) -> usize {
        self.0.unwrap_or(0)
    }
}

/// Running per-metric sum
#[derive(Debug, Clone, Default)]
pub struct IncrementalSum {
    dims: Dimensions,
    sums: Vec<f64>,
}

impl IncrementalSum {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&mut self, records: &[Record], sign: f64) -> Result<()> {
        for record in records {
            let dims = self.dims.check(record, "window sum")?;
            self.sums.resize(dims, 0.0);
            for (sum, value) in self.sums.iter_mut().zip(record.metrics()) {
                *sum += sign * value;
            }
        }
        Ok(())
    }

    /// Current sums, one per metric
    pub fn sums(&self) -> &[f64] {
        &self.sums
    }
}

impl WindowAggregate for IncrementalSum {
    fn update_window(&mut self, added: &[Record], expired: &[Record]) -> Result<Record> {
        self.apply(added, 1.0)?;
        self.apply(expired, -1.0)?;
        self.sums.resize(self.dims.get(), 0.0);
        Ok(Record::new(self.sums.clone()))
    }

    fn name(&self) -> &'static str {
        "sum"
    }
}

/// Number of records in the window, repeated in every metric
#[derive(Debug, Clone, Default)]
pub struct IncrementalCount {
    dims: Dimensions,
    count: usize,
}

impl IncrementalCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl WindowAggregate for IncrementalCount {
    fn update_window(&mut self, added: &[Record], expired: &[Record]) -> Result<Record> {
        for record in added.iter().chain(expired) {
            self.dims.check(record, "window count")?;
        }
        if expired.len() > self.count + added.len() {
            return Err(Error::Computation(format!(
                "{} records expired from a window holding {}",
                expired.len(),
                self.count + added.len()
            )));
        }
        self.count = self.count + added.len() - expired.len();
        Ok(Record::new(vec![self.count as f64; self.dims.get()]))
    }

    fn name(&self) -> &'static str {
        "count"
    }
}

/// Per-metric mean, built from a running sum and count
#[derive(Debug, Clone, Default)]
pub struct IncrementalAverage {
    sum: IncrementalSum,
    count: IncrementalCount,
}

impl IncrementalAverage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowAggregate for IncrementalAverage {
    fn update_window(&mut self, added: &[Record], expired: &[Record]) -> Result<Record> {
        let sums = self.sum.update_window(added, expired)?;
        self.count.update_window(added, expired)?;
        let n = self.count.count();
        if n == 0 {
            return Ok(Record::new(vec![0.0; sums.dimensions()]));
        }
        Ok(Record::new(
            sums.metrics().iter().map(|s| s / n as f64).collect(),
        ))
    }

    fn name(&self) -> &'static str {
        "average"
    }
}

/// Per-metric maximum, kept as one ordered multiset per metric
#[derive(Debug, Clone, Default)]
pub struct IncrementalMax {
    dims: Dimensions,
    values: Vec<BTreeMap<OrderedFloat<f64>, usize>>,
}

impl IncrementalMax {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowAggregate for IncrementalMax {
    fn update_window(&mut self, added: &[Record], expired: &[Record]) -> Result<Record> {
        for record in added {
            let dims = self.dims.check(record, "window max")?;
            self.values.resize_with(dims, BTreeMap::new);
            for (set, value) in self.values.iter_mut().zip(record.metrics()) {
                *set.entry(OrderedFloat(*value)).or_insert(0) += 1;
            }
        }
        for record in expired {
            self.dims.check(record, "window max")?;
            for (set, value) in self.values.iter_mut().zip(record.metrics()) {
                let key = OrderedFloat(*value);
                match set.get_mut(&key) {
                    Some(n) if *n > 1 => *n -= 1,
                    Some(_) => {
                        set.remove(&key);
                    }
                    None => {
                        return Err(Error::Computation(format!(
                            "expired value {value} was never part of the window"
                        )))
                    }
                }
            }
        }
        let maxima = (0..self.dims.get())
            .map(|d| {
                self.values
                    .get(d)
                    .and_then(|set| set.keys().next_back())
                    .map_or(0.0, |max| max.0)
            })
            .collect();
        Ok(Record::new(maxima))
    }

    fn name(&self) -> &'static str {
        "max"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn records(rows: &[[f64; 2]]) -> Vec<Record> {
        rows.iter().map(|r| Record::new(r.to_vec())).collect()
    }

    #[test]
    fn test_sum_adds_and_subtracts() {
        let mut agg = IncrementalSum::new();
        let first = records(&[[1.0, 10.0], [2.0, 20.0]]);
        let out = agg.update_window(&first, &[]).unwrap();
        assert_eq!(out.metrics(), &[3.0, 30.0]);

        let second = records(&[[4.0, 40.0]]);
        let out = agg.update_window(&second, &first[..1]).unwrap();
        assert_eq!(out.metrics(), &[6.0, 60.0]);
    }

    #[test]
    fn test_count_tracks_membership() {
        let mut agg = IncrementalCount::new();
        let rows = records(&[[0.0, 1.0], [1.0, 1.0], [2.0, 1.0]]);
        assert_eq!(agg.update_window(&rows, &[]).unwrap().metrics(), &[3.0, 3.0]);
        assert_eq!(agg.update_window(&[], &rows[..2]).unwrap().metrics(), &[1.0, 1.0]);
        assert!(agg.update_window(&[], &rows).is_err());
    }

    #[test]
    fn test_average() {
        let mut agg = IncrementalAverage::new();
        let rows = records(&[[1.0, 2.0], [3.0, 6.0]]);
        let out = agg.update_window(&rows, &[]).unwrap();
        assert_relative_eq!(out.metrics()[0], 2.0);
        assert_relative_eq!(out.metrics()[1], 4.0);

        let out = agg.update_window(&[], &rows).unwrap();
        assert_eq!(out.metrics(), &[0.0, 0.0]);
    }

    #[test]
    fn test_max_survives_expiry_of_duplicates() {
        let mut agg = IncrementalMax::new();
        let rows = records(&[[5.0, 1.0], [5.0, 2.0], [3.0, 9.0]]);
        let out = agg.update_window(&rows, &[]).unwrap();
        assert_eq!(out.metrics(), &[5.0, 9.0]);

        let out = agg.update_window(&[], &rows[..1]).unwrap();
        assert_eq!(out.metrics(), &[5.0, 9.0]);

        let out = agg.update_window(&[], &rows[1..2]).unwrap();
        assert_eq!(out.metrics(), &[3.0, 9.0]);

        let out = agg.update_window(&[], &rows[2..]).unwrap();
        assert_eq!(out.metrics(), &[0.0, 0.0]);
    }

    #[test]
    fn test_max_rejects_unknown_expiry() {
        let mut agg = IncrementalMax::new();
        agg.update_window(&records(&[[1.0, 1.0]]), &[]).unwrap();
        assert!(agg.update_window(&[], &records(&[[7.0, 1.0]])).is_err());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut agg = IncrementalSum::new();
        agg.update_window(&[Record::new(vec![1.0, 2.0])], &[]).unwrap();
        let err = agg.update_window(&[Record::new(vec![1.0])], &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_factory_names() {
        for kind in [
            AggregateKind::Sum,
            AggregateKind::Count,
            AggregateKind::Average,
            AggregateKind::Max,
        ] {
            assert_eq!(aggregate_for(kind).name(), kind.name());
        }
    }
}
