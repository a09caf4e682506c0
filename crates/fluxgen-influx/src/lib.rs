// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluxgen InfluxDB Binding
//!
//! Implements the engine's `PointSink` seam against InfluxDB v2.
//!
//! This crate provides:
//! - InfluxDB v2 Line Protocol rendering of engine points
//! - An HTTP client for `/api/v2/write` with token authentication
//! - Failure classification onto the engine's `SinkError` taxonomy
//! - A `/health` probe for the startup connectivity check
//!
//! # Overview
//!
//! ```text
//! Batch --> Line Protocol body --> POST /api/v2/write --> Result<usize, SinkError>
//! ```

pub mod client;
pub mod line;

pub use client::{InfluxClient, InfluxConfig, InfluxError};
pub use line::{encode_batch, encode_point};
