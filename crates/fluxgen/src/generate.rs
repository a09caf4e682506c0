// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Randomized record sources.
//!
//! Each source produces a burst of raw records on demand. Sources are
//! stateless apart from the thread-local RNG, so multiple streams can call
//! them concurrently. Conversion to engine points happens later, in the
//! parallel encoder, through the [`IntoPoint`] impls here.

use crate::point::{IntoPoint, Point, PointError, now_ns};
use serde::Serialize;

const VEHICLE_NAMES: [&str; 8] = [
    "AGV_001", "AGV_002", "AGV_003", "AGV_004", "AGV_005", "AGV_006", "AGV_007", "AGV_008",
];

const CARRIER_IDS: [&str; 12] = [
    "2F38678", "2F49727", "3F84077", "3F16198", "2F27631", "3F48241", "3F40768", "2F13414",
    "3F54193", "2F49674", "3F00689", "3F11802",
];

const EQUIPMENT_IDS: [&str; 16] = [
    "HFB09ICS0600", "HFF09AGN0200", "HFF11AGN0400", "HFF11CNV0500", "HFF09AGM0100",
    "HFF11AGC0100", "HFF11AGN0100", "HFF09AGM0200", "HFB09ICS0100", "HFF09AGC0200",
    "HFF09AGC0300", "HFF11AGN0600", "HFF09AGN0500", "HFF09AGN0700", "HFF11AGN0200",
    "HFF09ICS0800",
];

const SYSTEM_NAMES: [&str; 3] = ["TC", "ADS", "MCS"];

const MOVE_STATES: [&str; 3] = ["MOVING", "COMPLETE", "RECEIVE"];

const LINE_IDS: [&str; 8] = [
    "LINE01-ASSEMBLY-001",
    "LINE02-PACKAGING-002",
    "LINE03-WAREHOUSE-003",
    "LINE04-MATERIAL-004",
    "LINE05-MATERIAL-005",
    "LINE06-MATERIAL-006",
    "LINE10-PAINTING-010",
    "LINE11-WAREHOUSE-011",
];

/// Produces a burst of raw records on demand.
pub trait RecordSource: Send + Sync {
    type Record: IntoPoint + Serialize + Send + Sync + 'static;

    /// Generate `count` fresh randomized records.
    fn generate(&self, count: usize) -> Vec<Self::Record>;

    /// Key under which a broker payload groups these records
    /// (e.g. `{"VEHICLE": [...]}`).
    fn payload_key(&self) -> &'static str;
}

fn pick<'a>(pool: &[&'a str]) -> &'a str {
    pool[fastrand::usize(..pool.len())]
}

fn rounded_range(min: f64, max: f64) -> f64 {
    let v = min + fastrand::f64() * (max - min);
    (v * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Vehicle positions
// ---------------------------------------------------------------------------

/// One vehicle position/status observation.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleRecord {
    #[serde(rename = "VEHICLE_NAME")]
    pub name: String,
    #[serde(rename = "X")]
    pub x: i64,
    #[serde(rename = "Y")]
    pub y: i64,
    #[serde(rename = "STATE")]
    pub state: String,
    #[serde(rename = "BATTERY")]
    pub battery: i64,
    #[serde(rename = "SUB_GOAL")]
    pub sub_goal: i64,
    #[serde(rename = "FINAL_GOAL")]
    pub final_goal: i64,
    #[serde(rename = "HEADING")]
    pub heading: i64,
    #[serde(rename = "TIMESTAMP")]
    pub timestamp_ns: u64,
}

impl IntoPoint for VehicleRecord {
    fn into_point(&self) -> Result<Point, PointError> {
        Point::builder("vehicle")
            .tag("vehicle", self.name.clone())
            .field("x", self.x as f64)
            .field("y", self.y as f64)
            .field("state", self.state.clone())
            .field("battery", self.battery as f64)
            .field("sub_goal", self.sub_goal as f64)
            .field("final_goal", self.final_goal as f64)
            .field("heading", self.heading)
            .timestamp_ns(self.timestamp_ns)
            .build()
    }
}

/// Source of randomized [`VehicleRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct VehicleSource;

impl RecordSource for VehicleSource {
    type Record = VehicleRecord;

    fn generate(&self, count: usize) -> Vec<VehicleRecord> {
        (0..count)
            .map(|_| VehicleRecord {
                name: pick(&VEHICLE_NAMES).to_string(),
                x: fastrand::i64(0..100),
                y: fastrand::i64(0..100),
                state: "RUNNING".to_string(),
                battery: fastrand::i64(0..100),
                sub_goal: fastrand::i64(0..100),
                final_goal: fastrand::i64(0..100),
                heading: fastrand::i64(0..100),
                timestamp_ns: now_ns(),
            })
            .collect()
    }

    fn payload_key(&self) -> &'static str {
        "VEHICLE"
    }
}

// ---------------------------------------------------------------------------
// Transport jobs
// ---------------------------------------------------------------------------

/// One transport-job state observation.
#[derive(Debug, Clone, Serialize)]
pub struct TransportRecord {
    #[serde(rename = "JOB_ID")]
    pub job_id: String,
    #[serde(rename = "CARRIER_ID")]
    pub carrier_id: String,
    #[serde(rename = "REQ_SYSTEM")]
    pub req_system: String,
    #[serde(rename = "FROM_EQP")]
    pub from_equipment: String,
    #[serde(rename = "FROM_PORT")]
    pub from_port: String,
    #[serde(rename = "TO_EQP")]
    pub to_equipment: String,
    #[serde(rename = "TO_PORT")]
    pub to_port: String,
    #[serde(rename = "CUR_EQP")]
    pub current_equipment: String,
    #[serde(rename = "MOVE_STATUS")]
    pub move_status: String,
    #[serde(rename = "TIMESTAMP")]
    pub timestamp_ns: u64,
}

impl IntoPoint for TransportRecord {
    fn into_point(&self) -> Result<Point, PointError> {
        Point::builder("transport_job")
            .tag("carrier", self.carrier_id.clone())
            .tag("status", self.move_status.clone())
            .tag("system", self.req_system.clone())
            .field("job_id", self.job_id.clone())
            .field("from_equipment", self.from_equipment.clone())
            .field("from_port", self.from_port.clone())
            .field("to_equipment", self.to_equipment.clone())
            .field("to_port", self.to_port.clone())
            .field("current_equipment", self.current_equipment.clone())
            .timestamp_ns(self.timestamp_ns)
            .build()
    }
}

/// Source of randomized [`TransportRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportSource;

impl RecordSource for TransportSource {
    type Record = TransportRecord;

    fn generate(&self, count: usize) -> Vec<TransportRecord> {
        (0..count)
            .map(|_| {
                let carrier = pick(&CARRIER_IDS);
                let from = pick(&EQUIPMENT_IDS);
                let to = pick(&EQUIPMENT_IDS);
                TransportRecord {
                    job_id: format!("{}_{}", carrier, fastrand::u32(0..1_000_000)),
                    carrier_id: carrier.to_string(),
                    req_system: pick(&SYSTEM_NAMES).to_string(),
                    from_equipment: from.to_string(),
                    from_port: format!("{}_{}", from, fastrand::u32(0..100)),
                    to_equipment: to.to_string(),
                    to_port: format!("{}_{}", to, fastrand::u32(0..100)),
                    current_equipment: pick(&EQUIPMENT_IDS).to_string(),
                    move_status: pick(&MOVE_STATES).to_string(),
                    timestamp_ns: now_ns(),
                }
            })
            .collect()
    }

    fn payload_key(&self) -> &'static str {
        "TRANSPORT_JOB"
    }
}

// ---------------------------------------------------------------------------
// Facility environment
// ---------------------------------------------------------------------------

/// One facility line environment observation.
#[derive(Debug, Clone, Serialize)]
pub struct FacilityRecord {
    #[serde(rename = "LINE_ID")]
    pub line_id: String,
    #[serde(rename = "TEMPERATURE")]
    pub temperature: f64,
    #[serde(rename = "HUMIDITY")]
    pub humidity: f64,
    #[serde(rename = "LINE_SPEED")]
    pub line_speed: f64,
    #[serde(rename = "UTILIZATION_RATE")]
    pub utilization_rate: f64,
    #[serde(rename = "PRODUCTIVITY")]
    pub productivity: f64,
    #[serde(rename = "TIMESTAMP")]
    pub timestamp_ns: u64,
}

impl IntoPoint for FacilityRecord {
    fn into_point(&self) -> Result<Point, PointError> {
        Point::builder("facility")
            .tag("line", self.line_id.clone())
            .field("temperature", self.temperature)
            .field("humidity", self.humidity)
            .field("line_speed", self.line_speed)
            .field("utilization_rate", self.utilization_rate)
            .field("productivity", self.productivity)
            .timestamp_ns(self.timestamp_ns)
            .build()
    }
}

/// Source of randomized [`FacilityRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacilitySource;

impl RecordSource for FacilitySource {
    type Record = FacilityRecord;

    fn generate(&self, count: usize) -> Vec<FacilityRecord> {
        (0..count)
            .map(|_| FacilityRecord {
                line_id: pick(&LINE_IDS).to_string(),
                temperature: rounded_range(16.5, 17.5),
                humidity: rounded_range(64.0, 66.0),
                line_speed: rounded_range(0.45, 0.55),
                utilization_rate: rounded_range(88.5, 90.5),
                productivity: rounded_range(88.5, 90.5),
                timestamp_ns: now_ns(),
            })
            .collect()
    }

    fn payload_key(&self) -> &'static str {
        "FACILITY"
    }
}
