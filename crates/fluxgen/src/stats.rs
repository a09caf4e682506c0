// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Throughput accounting.
//!
//! [`ThroughputCounter`] is the only mutable state shared between streams.
//! Writers bump it with relaxed atomic adds; the periodic reporter drains it
//! with one atomic swap per field, so increments landing between "read" and
//! "reset" are never lost or double-counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Atomic counters for points written and cycles completed.
#[derive(Debug, Default)]
pub struct ThroughputCounter {
    points_written: AtomicU64,
    cycles_completed: AtomicU64,
}

/// One reporting window's totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub points_written: u64,
    pub cycles_completed: u64,
}

impl ThroughputCounter {
    /// Create a zeroed counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` points successfully written.
    pub fn add_points(&self, count: u64) {
        self.points_written.fetch_add(count, Ordering::Relaxed);
    }

    /// Record one completed cycle.
    pub fn add_cycle(&self) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the totals without resetting.
    pub fn peek(&self) -> CycleStats {
        CycleStats {
            points_written: self.points_written.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
        }
    }

    /// Drain the totals accumulated since the last call, zeroing them.
    ///
    /// One atomic exchange per field; safe against concurrent adds.
    pub fn take(&self) -> CycleStats {
        CycleStats {
            points_written: self.points_written.swap(0, Ordering::Relaxed),
            cycles_completed: self.cycles_completed.swap(0, Ordering::Relaxed),
        }
    }
}

/// Periodic throughput reporter.
///
/// Runs on its own cadence, decoupled from the write cycles; communicates
/// with them only through the counter. Emits a final window on shutdown.
pub async fn run_reporter(
    counter: Arc<ThroughputCounter>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // First tick fires immediately; skip it so the first window is full-length.
    ticker.tick().await;
    let mut window_start = tokio::time::Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                report(&counter, window_start.elapsed());
                window_start = tokio::time::Instant::now();
            }
            _ = shutdown.cancelled() => {
                // The final window is usually shorter than the interval;
                // the rate uses its real length.
                report(&counter, window_start.elapsed());
                tracing::debug!("throughput reporter stopped");
                return;
            }
        }
    }
}

fn report(counter: &ThroughputCounter, window: Duration) {
    let stats = counter.take();
    tracing::info!(
        points = stats.points_written,
        cycles = stats.cycles_completed,
        points_per_sec = format_args!("{:.0}", points_per_sec(stats.points_written, window)),
        "throughput window"
    );
}

fn points_per_sec(points: u64, window: Duration) -> f64 {
    let secs = window.as_secs_f64();
    if secs > 0.0 {
        points as f64 / secs
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_counter_accumulates() {
        let counter = ThroughputCounter::new();
        counter.add_points(5_000);
        counter.add_points(5_000);
        counter.add_points(2_345);
        counter.add_cycle();

        let stats = counter.peek();
        assert_eq!(stats.points_written, 12_345);
        assert_eq!(stats.cycles_completed, 1);
    }

    #[test]
    fn test_take_resets() {
        let counter = ThroughputCounter::new();
        counter.add_points(12_345);
        counter.add_cycle();

        let first = counter.take();
        assert_eq!(first.points_written, 12_345);
        assert_eq!(first.cycles_completed, 1);

        let second = counter.take();
        assert_eq!(second.points_written, 0);
        assert_eq!(second.cycles_completed, 0);
    }

    #[test]
    fn test_no_loss_across_concurrent_windows() {
        // Increments racing with take() must appear in exactly one window.
        let counter = Arc::new(ThroughputCounter::new());
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        counter.add_points(1);
                    }
                })
            })
            .collect();

        let mut observed = 0u64;
        for _ in 0..1_000 {
            observed += counter.take().points_written;
        }
        for w in writers {
            w.join().unwrap();
        }
        observed += counter.take().points_written;

        assert_eq!(observed, 40_000);
    }

    #[test]
    fn test_points_per_sec_uses_window_length() {
        // A half-length final window must not halve the reported rate.
        assert_eq!(points_per_sec(600, Duration::from_secs(60)), 10.0);
        assert_eq!(points_per_sec(600, Duration::from_secs(30)), 20.0);
        assert_eq!(points_per_sec(600, Duration::ZERO), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_drains_on_shutdown() {
        let counter = Arc::new(ThroughputCounter::new());
        let shutdown = CancellationToken::new();

        counter.add_points(10);
        let task = tokio::spawn(run_reporter(
            Arc::clone(&counter),
            Duration::from_secs(60),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(10)).await;
        shutdown.cancel();
        task.await.unwrap();

        // The reporter's final flush took the pending window.
        assert_eq!(counter.peek().points_written, 0);
    }
}
