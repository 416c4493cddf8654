//! Conversions applied when results are serialized.
//!
//! Internally a failed round is `None` and timestamps are `DateTime<Utc>`.
//! On the wire a failed round is `-1` and timestamps are RFC3339 strings
//! with second precision.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;
use serde::ser::SerializeSeq;

pub const FAILED_RTT: f64 = -1.0;

pub fn rfc3339(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn serialize_timestamp<S: Serializer>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&rfc3339(timestamp))
}

pub fn serialize_timestamps<S: Serializer>(
    timestamps: &[DateTime<Utc>],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(timestamps.len()))?;
    for timestamp in timestamps {
        seq.serialize_element(&rfc3339(timestamp))?;
    }
    seq.end()
}

pub fn serialize_rtts<S: Serializer>(
    rtts: &[Option<f64>],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(rtts.len()))?;
    for rtt in rtts {
        seq.serialize_element(&rtt.unwrap_or(FAILED_RTT))?;
    }
    seq.end()
}
