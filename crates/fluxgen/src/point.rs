// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Telemetry point model.
//!
//! A [`Point`] is one immutable observation: a measurement name, low-cardinality
//! tag pairs, at least one typed field, and a nanosecond timestamp. Points are
//! built through [`PointBuilder`], which enforces the structural invariants so
//! that downstream stages (batching, sink encoding) never have to re-validate.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors building or converting points.
#[derive(Debug, Error)]
pub enum PointError {
    #[error("measurement name is empty")]
    EmptyMeasurement,

    #[error("point '{0}' has no fields")]
    NoFields(String),

    #[error("record conversion failed: {0}")]
    Conversion(String),
}

/// A typed scalar value stored in a point field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit floating point.
    Float(f64),
    /// 64-bit signed integer.
    Integer(i64),
    /// UTF-8 string.
    String(String),
    /// Boolean value.
    Boolean(bool),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

/// One immutable telemetry observation.
///
/// Invariants (enforced by [`PointBuilder::build`]):
/// - `measurement` is non-empty
/// - `fields` is non-empty
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
    timestamp_ns: u64,
}

impl Point {
    /// Start building a point for the given measurement.
    pub fn builder(measurement: impl Into<String>) -> PointBuilder {
        PointBuilder {
            measurement: measurement.into(),
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp_ns: None,
        }
    }

    /// Measurement name.
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// Tag key/value pairs, in insertion order.
    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    /// Field key/value pairs, in insertion order. Never empty.
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Timestamp in nanoseconds since the Unix epoch.
    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    /// Minimal identifying projection for diagnostics.
    ///
    /// Total: always succeeds, never serializes tag/field payloads.
    pub fn id(&self) -> PointId {
        PointId {
            measurement: self.measurement.clone(),
            timestamp_ns: self.timestamp_ns,
        }
    }
}

/// Builder for [`Point`]. A missing timestamp defaults to "now".
#[derive(Debug)]
pub struct PointBuilder {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
    timestamp_ns: Option<u64>,
}

impl PointBuilder {
    /// Add a tag pair.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// Add a field pair.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Set the timestamp (nanoseconds since the Unix epoch).
    pub fn timestamp_ns(mut self, ns: u64) -> Self {
        self.timestamp_ns = Some(ns);
        self
    }

    /// Finalize the point, validating the structural invariants.
    pub fn build(self) -> Result<Point, PointError> {
        if self.measurement.is_empty() {
            return Err(PointError::EmptyMeasurement);
        }
        if self.fields.is_empty() {
            return Err(PointError::NoFields(self.measurement));
        }
        Ok(Point {
            measurement: self.measurement,
            tags: self.tags,
            fields: self.fields,
            timestamp_ns: self.timestamp_ns.unwrap_or_else(now_ns),
        })
    }
}

/// Identifying projection of a point: measurement + timestamp only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointId {
    pub measurement: String,
    pub timestamp_ns: u64,
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.measurement, self.timestamp_ns)
    }
}

/// Conversion seam from a raw generated record into the engine's [`Point`].
///
/// Implementations must be pure with respect to shared state: the parallel
/// encoder calls them concurrently from independent partitions.
pub trait IntoPoint {
    /// Convert this record into a point.
    fn into_point(&self) -> Result<Point, PointError>;
}

/// Current wall-clock time in nanoseconds since the Unix epoch.
pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_builder_basic() {
        let point = Point::builder("vehicle")
            .tag("vehicle", "AGV_001")
            .field("x", 42.0)
            .field("battery", 87i64)
            .timestamp_ns(1_000_000_000)
            .build()
            .expect("valid point");

        assert_eq!(point.measurement(), "vehicle");
        assert_eq!(point.tags().len(), 1);
        assert_eq!(point.fields().len(), 2);
        assert_eq!(point.timestamp_ns(), 1_000_000_000);
    }

    #[test]
    fn test_point_requires_fields() {
        let err = Point::builder("vehicle")
            .tag("vehicle", "AGV_001")
            .build()
            .unwrap_err();
        assert!(matches!(err, PointError::NoFields(_)));
    }

    #[test]
    fn test_point_requires_measurement() {
        let err = Point::builder("").field("x", 1.0).build().unwrap_err();
        assert!(matches!(err, PointError::EmptyMeasurement));
    }

    #[test]
    fn test_point_default_timestamp_is_now() {
        let before = now_ns();
        let point = Point::builder("m").field("f", true).build().unwrap();
        assert!(point.timestamp_ns() >= before);
    }

    #[test]
    fn test_point_id_projection() {
        let point = Point::builder("facility")
            .field("temperature", 17.0)
            .timestamp_ns(123)
            .build()
            .unwrap();

        let id = point.id();
        assert_eq!(id.measurement, "facility");
        assert_eq!(id.timestamp_ns, 123);
        assert_eq!(id.to_string(), "facility@123");
    }

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(FieldValue::from(1.5), FieldValue::Float(1.5));
        assert_eq!(FieldValue::from(3i64), FieldValue::Integer(3));
        assert_eq!(FieldValue::from("s"), FieldValue::String("s".into()));
        assert_eq!(FieldValue::from(true), FieldValue::Boolean(true));
    }
}
