// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluxgen - synthetic telemetry load generator.
//!
//! Generates high-volume randomized vehicle, transport-job, and facility
//! records and pushes them continuously into downstream sinks to load-test
//! ingestion pipelines.
//!
//! The heart of the crate is the resilient bulk-write engine:
//!
//! ```text
//! RecordSource --> encode_parallel --> split_into_batches --> WriteExecutor --> PointSink
//!      (raw records)    (Points, P workers)   (seq-numbered)     (per-batch
//!                                                                 classification)
//! ```
//!
//! One [`scheduler::StreamDriver`] task per stream repeats the
//! generate -> encode -> batch -> write -> delay cycle; a shared
//! [`stats::ThroughputCounter`] is flushed by an independent periodic
//! reporter. Failures are contained at the smallest scope that can absorb
//! them: a bad batch never kills a cycle, a bad cycle never kills a stream,
//! and cancelling one stream never touches its siblings.
//!
//! Sink bindings (e.g. the InfluxDB v2 binding in `fluxgen-influx`) implement
//! [`sink::PointSink`] and classify their failures into [`sink::SinkError`].

pub mod batch;
pub mod broker;
pub mod config;
pub mod encode;
pub mod generate;
pub mod point;
pub mod scheduler;
pub mod sink;
pub mod stats;
pub mod writer;

pub use batch::{split_into_batches, Batch};
pub use config::{ConfigError, SimulatorConfig, StreamKind, StreamSettings};
pub use encode::{encode_parallel, EncodeError};
pub use point::{FieldValue, IntoPoint, Point, PointError, PointId};
pub use scheduler::{StreamConfig, StreamDriver};
pub use sink::{MemorySink, PointSink, SinkError};
pub use stats::{run_reporter, CycleStats, ThroughputCounter};
pub use writer::{CycleWriteReport, WriteExecutor};
