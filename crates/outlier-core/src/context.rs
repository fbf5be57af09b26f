//! Per-run context
//!
//! One [`PipelineContext`] accompanies each pipeline run. It tags the run's log
//! spans with a trace ID and accumulates the wall time spent in each phase
//! (`load`, `transform`, `classify`, `summarize`).

use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Correlates every log line of one run
    pub trace_id: Uuid,
    pub start_time: Instant,
    phase_timings: HashMap<String, Duration>,
}

impl PipelineContext {
    /// Fresh context with a random trace ID, clock started now
    pub fn new() -> Self {
        Self::with_trace_id(Uuid::new_v4())
    }

    pub fn with_trace_id(trace_id: Uuid) -> Self {
        Self {
            trace_id,
            start_time: Instant::now(),
            phase_timings: HashMap::new(),
        }
    }

    /// Add `duration` to the phase total
    pub fn record_stage_timing(&mut self, phase: impl Into<String>, duration: Duration) {
        *self.phase_timings.entry(phase.into()).or_default() += duration;
    }

    /// Run `f`, charging its wall time to `phase`
    pub fn time_stage<F, R>(&mut self, phase: impl Into<String>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let started = Instant::now();
        let out = f();
        self.record_stage_timing(phase, started.elapsed());
        out
    }

    /// Wall time since the context was created
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Total for one phase; zero if it never ran
    pub fn stage_timing(&self, phase: &str) -> Duration {
        self.phase_timings.get(phase).copied().unwrap_or_default()
    }

    pub fn stage_timings(&self) -> &HashMap<String, Duration> {
        &self.phase_timings
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_creation() {
        let ctx = PipelineContext::new();
        assert!(ctx.stage_timings().is_empty());
        assert_eq!(ctx.stage_timing("load"), Duration::ZERO);
    }

    #[test]
    fn test_context_timing() {
        let mut ctx = PipelineContext::new();

        let result = ctx.time_stage("load", || {
            std::thread::sleep(Duration::from_millis(10));
            42
        });

        assert_eq!(result, 42);
        assert!(ctx.stage_timing("load") >= Duration::from_millis(10));
        assert!(ctx.elapsed() >= ctx.stage_timing("load"));
    }

    #[test]
    fn test_timings_accumulate() {
        let mut ctx = PipelineContext::with_trace_id(Uuid::nil());
        ctx.record_stage_timing("classify", Duration::from_millis(3));
        ctx.record_stage_timing("classify", Duration::from_millis(4));
        assert_eq!(ctx.stage_timing("classify"), Duration::from_millis(7));
        assert_eq!(ctx.trace_id, Uuid::nil());
    }
}
