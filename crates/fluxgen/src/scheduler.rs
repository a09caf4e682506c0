// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-stream cycle driver.
//!
//! One [`StreamDriver`] task per telemetry stream runs the repeating
//! generate -> encode -> batch -> write -> delay cycle. At most one cycle is
//! ever in flight per stream: the loop body is strictly sequential, and the
//! next cycle cannot start before the previous one reached its delay.
//!
//! Failure containment is scoped tightly: batch failures stay inside
//! the write loop, cycle failures are logged here and the loop continues
//! after the delay, and cancellation only ever stops this stream.

use crate::batch::split_into_batches;
use crate::encode::encode_parallel;
use crate::generate::RecordSource;
use crate::sink::PointSink;
use crate::stats::ThroughputCounter;
use crate::writer::{CycleWriteReport, WriteExecutor, DEFAULT_SAMPLE_LIMIT};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Per-stream tuning knobs.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Stream name, used in logs.
    pub name: String,
    /// Points generated per cycle.
    pub points_per_cycle: usize,
    /// Maximum points per remote write call.
    pub batch_capacity: usize,
    /// Inter-cycle delay.
    pub delay: Duration,
    /// Worker count for the encode phase.
    pub encode_parallelism: usize,
    /// Rejected-point sample limit for diagnostics.
    pub sample_limit: usize,
}

impl StreamConfig {
    /// Defaults matching the simulator's stock load shape.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points_per_cycle: 10_000,
            batch_capacity: 5_000,
            delay: Duration::from_secs(1),
            encode_parallelism: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }
}

enum CycleEnd {
    /// The write phase ran to the end (possibly dropping batches).
    Completed(CycleWriteReport),
    /// Generation/encoding failed; the cycle was skipped.
    Skipped,
    /// Cancellation observed at a phase boundary or mid-write.
    Cancelled,
}

/// Drives one stream's cycle loop until cancelled.
pub struct StreamDriver<S: RecordSource> {
    config: StreamConfig,
    source: S,
    sink: Arc<dyn PointSink>,
    counter: Arc<ThroughputCounter>,
    shutdown: CancellationToken,
}

impl<S: RecordSource> StreamDriver<S> {
    /// Create a driver over a shared sink and counter.
    pub fn new(
        config: StreamConfig,
        source: S,
        sink: Arc<dyn PointSink>,
        counter: Arc<ThroughputCounter>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            source,
            sink,
            counter,
            shutdown,
        }
    }

    /// Run the cycle loop. Returns once the cancellation signal fires.
    pub async fn run(self) {
        tracing::info!(
            stream = %self.config.name,
            points_per_cycle = self.config.points_per_cycle,
            batch_capacity = self.config.batch_capacity,
            delay_ms = self.config.delay.as_millis() as u64,
            "stream started"
        );

        let executor = WriteExecutor::new(
            Arc::clone(&self.sink),
            Arc::clone(&self.counter),
            self.shutdown.clone(),
        )
        .with_sample_limit(self.config.sample_limit);

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            match self.run_cycle(&executor).await {
                CycleEnd::Completed(report) => {
                    if report.cancelled {
                        // Partial cycle; its written points are already
                        // counted, but it does not count as completed.
                        break;
                    }
                    self.counter.add_cycle();
                    if report.dropped_batches > 0 {
                        tracing::warn!(
                            stream = %self.config.name,
                            written = report.written_points,
                            dropped_batches = report.dropped_batches,
                            "cycle completed with dropped batches"
                        );
                    } else {
                        tracing::debug!(
                            stream = %self.config.name,
                            written = report.written_points,
                            batches = report.written_batches,
                            "cycle completed"
                        );
                    }
                }
                CycleEnd::Skipped => {
                    // Already logged with cause; fall through to the delay.
                }
                CycleEnd::Cancelled => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.delay) => {}
                _ = self.shutdown.cancelled() => break,
            }
        }

        tracing::info!(stream = %self.config.name, "stream stopped");
    }

    async fn run_cycle(&self, executor: &WriteExecutor) -> CycleEnd {
        // Generate.
        let records = self.source.generate(self.config.points_per_cycle);
        if self.shutdown.is_cancelled() {
            return CycleEnd::Cancelled;
        }

        // Encode on the blocking pool: the workers are plain threads and the
        // join must not stall the async runtime. A conversion error is
        // cycle-fatal, never loop-fatal: the data is discarded and
        // regenerated fresh next cycle.
        let parallelism = self.config.encode_parallelism;
        let encoded =
            tokio::task::spawn_blocking(move || encode_parallel(&records, parallelism)).await;
        let points = match encoded {
            Ok(Ok(points)) => points,
            Ok(Err(err)) => {
                tracing::error!(
                    stream = %self.config.name,
                    error = %err,
                    "encoding failed, skipping cycle"
                );
                return CycleEnd::Skipped;
            }
            Err(err) => {
                tracing::error!(
                    stream = %self.config.name,
                    error = %err,
                    "encode task failed, skipping cycle"
                );
                return CycleEnd::Skipped;
            }
        };
        if self.shutdown.is_cancelled() {
            return CycleEnd::Cancelled;
        }

        // Batch, then write strictly in sequence order.
        let batches = split_into_batches(points, self.config.batch_capacity);
        let report = executor.write_batches(&batches).await;
        CycleEnd::Completed(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::VehicleSource;
    use crate::sink::MemorySink;

    fn small_config() -> StreamConfig {
        StreamConfig {
            name: "vehicle".to_string(),
            points_per_cycle: 10,
            batch_capacity: 4,
            delay: Duration::from_millis(5),
            encode_parallelism: 2,
            sample_limit: 5,
        }
    }

    #[tokio::test]
    async fn test_driver_runs_cycles_until_cancelled() {
        let sink = Arc::new(MemorySink::new());
        let counter = Arc::new(ThroughputCounter::new());
        let shutdown = CancellationToken::new();

        let driver = StreamDriver::new(
            small_config(),
            VehicleSource,
            Arc::clone(&sink) as Arc<dyn PointSink>,
            Arc::clone(&counter),
            shutdown.clone(),
        );

        let task = tokio::spawn(driver.run());
        tokio::time::sleep(Duration::from_millis(40)).await;
        shutdown.cancel();
        task.await.unwrap();

        let stats = counter.peek();
        assert!(stats.cycles_completed >= 1);
        // 10 points per cycle, all accepted.
        assert_eq!(stats.points_written, stats.cycles_completed * 10);
        assert_eq!(sink.accepted_points() as u64, stats.points_written);
    }

    #[tokio::test]
    async fn test_driver_stops_promptly_when_cancelled_before_start() {
        let sink = Arc::new(MemorySink::new());
        let counter = Arc::new(ThroughputCounter::new());
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let driver = StreamDriver::new(
            small_config(),
            VehicleSource,
            Arc::clone(&sink) as Arc<dyn PointSink>,
            Arc::clone(&counter),
            shutdown,
        );

        driver.run().await;
        assert_eq!(counter.peek().cycles_completed, 0);
        assert_eq!(sink.accepted_points(), 0);
    }

    #[tokio::test]
    async fn test_encode_phase_keeps_runtime_responsive() {
        use crate::point::{IntoPoint, Point, PointError};

        #[derive(serde::Serialize)]
        struct SlowRecord;

        impl IntoPoint for SlowRecord {
            fn into_point(&self) -> Result<Point, PointError> {
                std::thread::sleep(Duration::from_millis(50));
                Point::builder("slow").field("v", 1i64).build()
            }
        }

        struct SlowSource;

        impl RecordSource for SlowSource {
            type Record = SlowRecord;

            fn generate(&self, count: usize) -> Vec<SlowRecord> {
                (0..count).map(|_| SlowRecord).collect()
            }

            fn payload_key(&self) -> &'static str {
                "SLOW"
            }
        }

        let mut config = small_config();
        config.points_per_cycle = 4;
        config.encode_parallelism = 1;

        let sink = Arc::new(MemorySink::new());
        let counter = Arc::new(ThroughputCounter::new());
        let shutdown = CancellationToken::new();

        let driver = StreamDriver::new(
            config,
            SlowSource,
            sink as Arc<dyn PointSink>,
            counter,
            shutdown.clone(),
        );
        let task = tokio::spawn(driver.run());

        // Encoding takes ~200ms off-runtime; this test runs on a
        // single-threaded runtime, so a timer can only fire this quickly if
        // the encode join is not holding the runtime thread.
        let start = std::time::Instant::now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(start.elapsed() < Duration::from_millis(100));

        shutdown.cancel();
        task.await.unwrap();
    }

    #[test]
    fn test_stream_config_defaults() {
        let config = StreamConfig::new("vehicle");
        assert_eq!(config.points_per_cycle, 10_000);
        assert_eq!(config.batch_capacity, 5_000);
        assert_eq!(config.delay, Duration::from_secs(1));
        assert!(config.encode_parallelism >= 1);
    }
}
