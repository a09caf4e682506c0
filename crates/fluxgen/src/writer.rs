// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batch write execution with per-batch failure containment.
//!
//! Batches are written strictly in sequence order; the fan-out already
//! happened at encode time, so the remote sink sees exactly one in-flight
//! request per stream. One bad batch never aborts the remaining batches of
//! the cycle, and cancellation stops the loop between (or during) writes
//! without being treated as an error.

use crate::batch::Batch;
use crate::point::PointId;
use crate::sink::{PointSink, SinkError};
use crate::stats::ThroughputCounter;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Default number of rejected points sampled into the log.
pub const DEFAULT_SAMPLE_LIMIT: usize = 5;

/// What happened to one cycle's batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleWriteReport {
    /// Points acknowledged by the sink.
    pub written_points: u64,
    /// Batches acknowledged by the sink.
    pub written_batches: u64,
    /// Batches dropped after a classified failure.
    pub dropped_batches: u64,
    /// Whether the loop stopped early on cancellation.
    pub cancelled: bool,
}

/// Writes one cycle's batches to the sink, classifying failures per batch.
pub struct WriteExecutor {
    sink: Arc<dyn PointSink>,
    counter: Arc<ThroughputCounter>,
    shutdown: CancellationToken,
    sample_limit: usize,
}

impl WriteExecutor {
    /// Create an executor over a shared sink and counter.
    pub fn new(
        sink: Arc<dyn PointSink>,
        counter: Arc<ThroughputCounter>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            sink,
            counter,
            shutdown,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }

    /// Override the rejection sample limit.
    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = limit;
        self
    }

    /// Write all batches in sequence order.
    pub async fn write_batches(&self, batches: &[Batch]) -> CycleWriteReport {
        let mut report = CycleWriteReport::default();

        for batch in batches {
            let outcome = tokio::select! {
                // Abort the in-flight call as soon as shutdown fires.
                biased;
                _ = self.shutdown.cancelled() => Err(SinkError::Cancelled),
                result = self.sink.write(batch) => result,
            };

            match outcome {
                Ok(written) => {
                    self.counter.add_points(written as u64);
                    report.written_points += written as u64;
                    report.written_batches += 1;
                    tracing::debug!(
                        sequence = batch.sequence,
                        points = written,
                        "batch written"
                    );
                }
                Err(SinkError::Cancelled) => {
                    tracing::debug!(
                        sequence = batch.sequence,
                        "write loop cancelled, skipping remaining batches"
                    );
                    report.cancelled = true;
                    return report;
                }
                Err(SinkError::Rejected { detail }) => {
                    log_rejected(batch, &detail, self.sample_limit);
                    report.dropped_batches += 1;
                }
                Err(SinkError::Transport { detail }) => {
                    tracing::error!(
                        sequence = batch.sequence,
                        points = batch.len(),
                        detail = %detail,
                        "transport failure, batch dropped"
                    );
                    report.dropped_batches += 1;
                }
                Err(SinkError::Unknown { detail }) => {
                    tracing::error!(
                        sequence = batch.sequence,
                        points = batch.len(),
                        detail = %detail,
                        "unclassified write failure, batch dropped"
                    );
                    report.dropped_batches += 1;
                }
            }
        }

        report
    }
}

/// Bounded diagnostic extraction from a rejected batch.
///
/// Returns at most `limit` identifying projections; never serializes the
/// full tag/field payload and never fails.
pub fn sample_rejected(batch: &Batch, limit: usize) -> Vec<PointId> {
    batch.points.iter().take(limit).map(|p| p.id()).collect()
}

fn log_rejected(batch: &Batch, detail: &str, limit: usize) {
    let sample = sample_rejected(batch, limit);
    let rendered: Vec<String> = sample.iter().map(|id| id.to_string()).collect();
    tracing::warn!(
        sequence = batch.sequence,
        rejected = batch.len(),
        sampled = rendered.len(),
        sample = %rendered.join(", "),
        detail = %detail,
        "batch rejected by sink, dropped"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::split_into_batches;
    use crate::point::Point;
    use crate::sink::{InjectedFailure, MemorySink};

    fn make_batches(n: usize, capacity: usize) -> Vec<Batch> {
        let points = (0..n)
            .map(|i| {
                Point::builder("m")
                    .field("i", i as i64)
                    .timestamp_ns(i as u64)
                    .build()
                    .unwrap()
            })
            .collect();
        split_into_batches(points, capacity)
    }

    fn executor(sink: Arc<MemorySink>) -> (WriteExecutor, Arc<ThroughputCounter>) {
        let counter = Arc::new(ThroughputCounter::new());
        let exec = WriteExecutor::new(sink, Arc::clone(&counter), CancellationToken::new());
        (exec, counter)
    }

    #[tokio::test]
    async fn test_all_batches_succeed() {
        let sink = Arc::new(MemorySink::new());
        let (exec, counter) = executor(Arc::clone(&sink));

        let report = exec.write_batches(&make_batches(12_345, 5_000)).await;

        assert_eq!(report.written_batches, 3);
        assert_eq!(report.written_points, 12_345);
        assert_eq!(report.dropped_batches, 0);
        assert!(!report.cancelled);
        assert_eq!(counter.peek().points_written, 12_345);
        assert_eq!(counter.take().points_written, 12_345);
        assert_eq!(counter.peek().points_written, 0);
    }

    #[tokio::test]
    async fn test_rejected_batch_is_isolated() {
        let sink = Arc::new(MemorySink::new());
        sink.fail_sequence(1, InjectedFailure::Rejected);
        let (exec, counter) = executor(Arc::clone(&sink));

        let report = exec.write_batches(&make_batches(9, 3)).await;

        assert_eq!(report.written_batches, 2);
        assert_eq!(report.dropped_batches, 1);
        assert_eq!(report.written_points, 6);
        assert_eq!(counter.peek().points_written, 6);
        assert_eq!(sink.accepted_sequences(), vec![0, 2]);
    }

    #[tokio::test]
    async fn test_transport_failure_continues() {
        let sink = Arc::new(MemorySink::new());
        sink.fail_sequence(0, InjectedFailure::Transport);
        sink.fail_sequence(2, InjectedFailure::Unknown);
        let (exec, counter) = executor(Arc::clone(&sink));

        let report = exec.write_batches(&make_batches(12, 3)).await;

        assert_eq!(report.written_batches, 2);
        assert_eq!(report.dropped_batches, 2);
        assert_eq!(counter.peek().points_written, 6);
        assert_eq!(sink.accepted_sequences(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_cancellation_stops_mid_cycle() {
        let sink = Arc::new(MemorySink::new());
        let counter = Arc::new(ThroughputCounter::new());
        let shutdown = CancellationToken::new();
        let exec = WriteExecutor::new(Arc::clone(&sink) as _, Arc::clone(&counter), shutdown.clone());

        // Cancel before the loop starts: nothing may be written.
        shutdown.cancel();
        let report = exec.write_batches(&make_batches(10, 2)).await;

        assert!(report.cancelled);
        assert_eq!(report.written_batches, 0);
        assert_eq!(counter.peek().points_written, 0);
        assert!(sink.accepted_sequences().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cycle() {
        let sink = Arc::new(MemorySink::new());
        let (exec, _) = executor(sink);
        let report = exec.write_batches(&[]).await;
        assert_eq!(report, CycleWriteReport::default());
    }

    #[test]
    fn test_sample_rejected_bounded() {
        let batches = make_batches(100, 100);
        let sample = sample_rejected(&batches[0], 5);
        assert_eq!(sample.len(), 5);
        assert_eq!(sample[0].measurement, "m");
    }

    #[test]
    fn test_sample_rejected_small_batch() {
        let batches = make_batches(2, 100);
        assert_eq!(sample_rejected(&batches[0], 5).len(), 2);
    }
}
