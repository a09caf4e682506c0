// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parallel record-to-point conversion.
//!
//! The encoder partitions the input into contiguous, roughly-equal slices and
//! converts each slice on its own worker thread. Workers share nothing; each
//! sees only its own slice. Order is preserved within a partition but not
//! across partitions (outputs are concatenated in whatever balanced layout the
//! partitioner chose, which is stable but not the generation order).
//!
//! A conversion failure for a single record fails that worker's whole
//! partition and is surfaced to the caller. Silently skipping bad records
//! would mask encoding bugs as missing load.

use crate::point::{IntoPoint, Point, PointError};
use std::thread;
use thiserror::Error;

/// Errors from a parallel encode pass.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("worker {worker} failed to convert a record: {source}")]
    Worker {
        worker: usize,
        #[source]
        source: PointError,
    },
}

/// Convert `records` into points using up to `parallelism` worker threads.
///
/// `parallelism` is clamped to `1..=records.len()`. Returns the concatenated
/// worker outputs; the total point count always equals the input record count
/// when every record converts cleanly.
pub fn encode_parallel<R>(records: &[R], parallelism: usize) -> Result<Vec<Point>, EncodeError>
where
    R: IntoPoint + Sync,
{
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let workers = parallelism.clamp(1, records.len());
    if workers == 1 {
        return encode_slice(records).map_err(|source| EncodeError::Worker { worker: 0, source });
    }

    let partitions = partition(records, workers);

    let results: Vec<Result<Vec<Point>, PointError>> = thread::scope(|scope| {
        let handles: Vec<_> = partitions
            .iter()
            .map(|&slice| scope.spawn(move || encode_slice(slice)))
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("encoder worker panicked"))
            .collect()
    });

    let mut points = Vec::with_capacity(records.len());
    for (worker, result) in results.into_iter().enumerate() {
        let converted = result.map_err(|source| EncodeError::Worker { worker, source })?;
        points.extend(converted);
    }
    Ok(points)
}

/// Split `records` into `workers` contiguous slices whose lengths differ by
/// at most one (e.g. 10 records over 4 workers -> 3, 3, 2, 2).
fn partition<R>(records: &[R], workers: usize) -> Vec<&[R]> {
    let base = records.len() / workers;
    let extra = records.len() % workers;

    let mut slices = Vec::with_capacity(workers);
    let mut start = 0;
    for i in 0..workers {
        let len = base + usize::from(i < extra);
        slices.push(&records[start..start + len]);
        start += len;
    }
    slices
}

fn encode_slice<R: IntoPoint>(records: &[R]) -> Result<Vec<Point>, PointError> {
    records.iter().map(|r| r.into_point()).collect()
}
