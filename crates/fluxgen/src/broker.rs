// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Broker publish path.
//!
//! This is the non-core side of the simulator: serialize a burst of records
//! to JSON and hand it to a publish/subscribe broker. Publishing is
//! fire-and-forget; connection and reconnect management live behind the
//! [`Publisher`] trait, outside this crate.

use crate::generate::RecordSource;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Publish failure. Losing individual messages is acceptable for a load
/// generator; errors are logged and the loop keeps going.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publish failed: {0}")]
    Failed(String),
}

/// Fire-and-forget enqueue into a publish/subscribe broker.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

/// Counts and drops every message. Useful for measuring the generator-side
/// load shape without a broker attached.
#[derive(Debug, Default)]
pub struct BlackholePublisher {
    messages: AtomicU64,
    bytes: AtomicU64,
}

impl BlackholePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> u64 {
        self.messages.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Publisher for BlackholePublisher {
    async fn publish(&self, _topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        self.messages.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(payload.len() as u64, Ordering::Relaxed);
        Ok(())
    }
}

/// Message/byte counters for one publish loop, drained with atomic swaps.
#[derive(Debug, Default)]
pub struct PublishStats {
    messages: AtomicU64,
    bytes: AtomicU64,
}

impl PublishStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, bytes: u64) {
        self.messages.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Drain the window: (messages, bytes) since the last call.
    pub fn take(&self) -> (u64, u64) {
        (
            self.messages.swap(0, Ordering::Relaxed),
            self.bytes.swap(0, Ordering::Relaxed),
        )
    }
}

/// Repeatedly generates a record burst, serializes it, and publishes it.
pub struct PublishDriver<S: RecordSource> {
    topic: String,
    records_per_message: usize,
    delay: Duration,
    source: S,
    publisher: Arc<dyn Publisher>,
    stats: Arc<PublishStats>,
    shutdown: CancellationToken,
}

impl<S: RecordSource> PublishDriver<S> {
    pub fn new(
        topic: impl Into<String>,
        records_per_message: usize,
        delay: Duration,
        source: S,
        publisher: Arc<dyn Publisher>,
        stats: Arc<PublishStats>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            topic: topic.into(),
            records_per_message,
            delay,
            source,
            publisher,
            stats,
            shutdown,
        }
    }

    /// Run the publish loop until cancelled.
    pub async fn run(self) {
        tracing::info!(
            topic = %self.topic,
            records_per_message = self.records_per_message,
            "publish loop started"
        );

        while !self.shutdown.is_cancelled() {
            let records = self.source.generate(self.records_per_message);
            match encode_payload(self.source.payload_key(), &records) {
                Ok(payload) => {
                    let len = payload.len() as u64;
                    match self.publisher.publish(&self.topic, payload).await {
                        Ok(()) => self.stats.record(len),
                        Err(err) => {
                            tracing::warn!(topic = %self.topic, error = %err, "publish failed");
                        }
                    }
                }
                Err(err) => {
                    tracing::error!(topic = %self.topic, error = %err, "payload serialization failed");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                _ = self.shutdown.cancelled() => break,
            }
        }

        tracing::info!(topic = %self.topic, "publish loop stopped");
    }
}

/// JSON payload keyed by record kind, e.g. `{"VEHICLE": [...]}`.
fn encode_payload<R: Serialize>(key: &str, records: &[R]) -> Result<Vec<u8>, serde_json::Error> {
    let mut keyed = BTreeMap::new();
    keyed.insert(key, records);
    serde_json::to_vec(&keyed)
}

/// Periodic publish-rate reporter, one window per interval.
pub async fn run_publish_reporter(
    topic: String,
    stats: Arc<PublishStats>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => report(&topic, &stats),
            _ = shutdown.cancelled() => {
                report(&topic, &stats);
                return;
            }
        }
    }
}

fn report(topic: &str, stats: &PublishStats) {
    let (messages, bytes) = stats.take();
    let megabytes = bytes as f64 / (1024.0 * 1024.0);
    tracing::info!(
        topic = %topic,
        messages,
        data_mb = format_args!("{:.2}", megabytes),
        "publish window"
    );
}
