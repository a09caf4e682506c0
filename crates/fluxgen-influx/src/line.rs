// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InfluxDB v2 Line Protocol rendering.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! See: <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use fluxgen::batch::Batch;
use fluxgen::point::{FieldValue, Point};

/// Render one point as a Line Protocol line.
///
/// Tags are sorted by key for canonical form. The point's invariants
/// (non-empty measurement, at least one field) are guaranteed by its builder.
pub fn encode_point(point: &Point) -> String {
    let mut line = escape_measurement(point.measurement());

    let mut tags: Vec<_> = point.tags().iter().collect();
    tags.sort_by_key(|(k, _)| k.as_str());
    for (key, value) in tags {
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    line.push(' ');
    for (i, (key, value)) in point.fields().iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&render_value(value));
    }

    line.push(' ');
    line.push_str(&point.timestamp_ns().to_string());
    line
}

/// Render a whole batch as newline-joined Line Protocol.
pub fn encode_batch(batch: &Batch) -> String {
    let lines: Vec<String> = batch.points.iter().map(encode_point).collect();
    lines.join("\n")
}

/// Render a field value per Line Protocol rules:
/// floats as-is, integers with an `i` suffix, strings quoted with inner
/// quotes escaped, booleans as `true`/`false`.
fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => format!("{}", v),
        FieldValue::Integer(v) => format!("{}i", v),
        FieldValue::String(v) => {
            let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{}\"", escaped)
        }
        FieldValue::Boolean(v) => {
            if *v {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
    }
}

/// Escape measurement name: spaces and commas.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Escape tag keys/values and field keys: commas, equals signs, spaces.
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
