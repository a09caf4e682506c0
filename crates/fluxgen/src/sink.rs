// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sink seam: where batches leave the engine.
//!
//! Bindings implement [`PointSink`] and classify their native failures into
//! [`SinkError`] themselves. The engine never infers a category by parsing
//! error strings; the distinction between "your payload is bad" and "the
//! network is bad" must be observable at this boundary.

use crate::batch::Batch;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Classified write failure.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The write was aborted by shutdown. Expected, not logged as an error.
    #[error("write cancelled")]
    Cancelled,

    /// The sink judged the payload semantically invalid. Not retried; the
    /// data is regenerated next cycle anyway.
    #[error("batch rejected by sink: {detail}")]
    Rejected { detail: String },

    /// Network/protocol-level failure; expected to self-heal by next cycle.
    #[error("transport failure: {detail}")]
    Transport { detail: String },

    /// Anything else.
    #[error("unclassified sink failure: {detail}")]
    Unknown { detail: String },
}

/// A remote store that accepts bulk point writes.
///
/// Implementations are stateless per call and shared read-only across
/// concurrent streams (`Arc<dyn PointSink>`).
#[async_trait]
pub trait PointSink: Send + Sync {
    /// Write one batch, returning the number of points written.
    async fn write(&self, batch: &Batch) -> Result<usize, SinkError>;
}

/// Failure script entry for [`MemorySink`].
#[derive(Debug, Clone)]
pub enum InjectedFailure {
    Rejected,
    Transport,
    Unknown,
}

/// In-memory sink for tests and dry runs.
///
/// Records every accepted batch; individual sequence numbers can be scripted
/// to fail with a chosen classification.
#[derive(Default)]
pub struct MemorySink {
    accepted: Mutex<Vec<Batch>>,
    failures: Mutex<HashMap<u64, InjectedFailure>>,
}

impl MemorySink {
    /// Create an empty sink that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the batch with the given sequence number to fail.
    pub fn fail_sequence(&self, sequence: u64, failure: InjectedFailure) {
        self.failures
            .lock()
            .expect("failures lock")
            .insert(sequence, failure);
    }

    /// Sequence numbers of accepted batches, in arrival order.
    pub fn accepted_sequences(&self) -> Vec<u64> {
        self.accepted
            .lock()
            .expect("accepted lock")
            .iter()
            .map(|b| b.sequence)
            .collect()
    }

    /// Total points accepted so far.
    pub fn accepted_points(&self) -> usize {
        self.accepted
            .lock()
            .expect("accepted lock")
            .iter()
            .map(|b| b.len())
            .sum()
    }
}

#[async_trait]
impl PointSink for MemorySink {
    async fn write(&self, batch: &Batch) -> Result<usize, SinkError> {
        let scripted = self
            .failures
            .lock()
            .expect("failures lock")
            .get(&batch.sequence)
            .cloned();

        if let Some(failure) = scripted {
            return Err(match failure {
                InjectedFailure::Rejected => SinkError::Rejected {
                    detail: format!("injected rejection for batch {}", batch.sequence),
                },
                InjectedFailure::Transport => SinkError::Transport {
                    detail: format!("injected transport failure for batch {}", batch.sequence),
                },
                InjectedFailure::Unknown => SinkError::Unknown {
                    detail: format!("injected failure for batch {}", batch.sequence),
                },
            });
        }

        let len = batch.len();
        self.accepted.lock().expect("accepted lock").push(batch.clone());
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::split_into_batches;
    use crate::point::Point;

    fn batches(n: usize, capacity: usize) -> Vec<Batch> {
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

    #[tokio::test]
    async fn test_memory_sink_accepts() {
        let sink = MemorySink::new();
        for batch in batches(10, 4) {
            let n = sink.write(&batch).await.expect("write");
            assert_eq!(n, batch.len());
        }
        assert_eq!(sink.accepted_sequences(), vec![0, 1, 2]);
        assert_eq!(sink.accepted_points(), 10);
    }

    #[tokio::test]
    async fn test_memory_sink_injected_rejection() {
        let sink = MemorySink::new();
        sink.fail_sequence(1, InjectedFailure::Rejected);

        let mut outcomes = Vec::new();
        for batch in batches(9, 3) {
            outcomes.push(sink.write(&batch).await);
        }

        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1], Err(SinkError::Rejected { .. })));
        assert!(outcomes[2].is_ok());
        assert_eq!(sink.accepted_sequences(), vec![0, 2]);
    }
}
