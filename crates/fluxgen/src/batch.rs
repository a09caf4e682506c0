// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batching: splits one cycle's points into capacity-bounded chunks.
//!
//! For N points and capacity C this yields exactly ceil(N / C) batches. Every
//! batch except possibly the last is exactly at capacity; the last holds the
//! remainder and never exceeds capacity. Sequence numbers are contiguous from
//! zero, and concatenating the batches in sequence order reproduces the input.

use crate::point::Point;

/// An ordered, bounded-length group of points sent in one remote write call.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Monotonically increasing within a cycle, starting at 0.
    pub sequence: u64,
    /// The points in this batch. Never empty.
    pub points: Vec<Point>,
}

impl Batch {
    /// Number of points in this batch.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether this batch is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Split `points` into sequence-numbered batches of at most `capacity` points.
///
/// Single pass over the input; each point is moved exactly once.
pub fn split_into_batches(points: Vec<Point>, capacity: usize) -> Vec<Batch> {
    debug_assert!(capacity >= 1, "batch capacity must be at least 1");
    let capacity = capacity.max(1);

    if points.is_empty() {
        return Vec::new();
    }

    let count = points.len().div_ceil(capacity);
    let mut batches = Vec::with_capacity(count);
    let mut points = points.into_iter();
    let mut sequence = 0u64;

    loop {
        let chunk: Vec<Point> = points.by_ref().take(capacity).collect();
        if chunk.is_empty() {
            break;
        }
        batches.push(Batch {
            sequence,
            points: chunk,
        });
        sequence += 1;
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;

    fn make_points(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| {
                Point::builder("m")
                    .field("i", i as i64)
                    .timestamp_ns(i as u64)
                    .build()
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        assert!(split_into_batches(Vec::new(), 100).is_empty());
    }

    #[test]
    fn test_exact_multiple() {
        let batches = split_into_batches(make_points(10), 5);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 5);
        assert_eq!(batches[1].len(), 5);
    }

    #[test]
    fn test_remainder_in_last_batch() {
        // 12,345 points at capacity 5,000 -> 5000, 5000, 2345
        let batches = split_into_batches(make_points(12_345), 5_000);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 5_000);
        assert_eq!(batches[1].len(), 5_000);
        assert_eq!(batches[2].len(), 2_345);
    }

    #[test]
    fn test_sequence_numbers_contiguous() {
        let batches = split_into_batches(make_points(7), 2);
        let sequences: Vec<u64> = batches.iter().map(|b| b.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_concatenation_reproduces_input() {
        let points = make_points(13);
        let expected: Vec<u64> = points.iter().map(|p| p.timestamp_ns()).collect();

        let batches = split_into_batches(points, 4);
        let total: usize = batches.iter().map(|b| b.len()).sum();
        assert_eq!(total, 13);

        let actual: Vec<u64> = batches
            .iter()
            .flat_map(|b| b.points.iter().map(|p| p.timestamp_ns()))
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_single_undersized_batch() {
        let batches = split_into_batches(make_points(3), 100);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[0].sequence, 0);
    }
}
