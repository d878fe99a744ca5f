use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::core::QueueEntry;
use crate::error::SimResult;
use serde::{Deserialize, Serialize};

/// Channel name every position is reported under
pub const LOCATION_CHANNEL: &str = "location";

/// Altitude placeholder; the logs carry no altitude
pub const DEFAULT_ALTITUDE: f64 = 0.0;

/// One vehicle's report as it goes over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleReport {
    pub vin: String,
    /// ISO-8601 with an explicit `+00:00` offset
    #[serde(with = "rfc3339")]
    pub timestamp: DateTime<Utc>,
    pub data: Vec<ChannelData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelData {
    pub channel: String,
    pub value: LocationValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationValue {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl From<&QueueEntry> for VehicleReport {
    // Occupancy is parsed but not reported yet
    fn from(entry: &QueueEntry) -> Self {
        Self {
            vin: entry.vehicle_id.clone(),
            timestamp: entry.timestamp,
            data: vec![ChannelData {
                channel: LOCATION_CHANNEL.to_string(),
                value: LocationValue {
                    lat: entry.lat,
                    lon: entry.lon,
                    alt: DEFAULT_ALTITUDE,
                },
            }],
        }
    }
}

mod rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Trait for outbound telemetry transports
///
/// Implementations:
/// - JSON-RPC over HTTP to a telemetry node
/// - Logging only, for dry runs
/// - Recording mock for tests
#[async_trait]
pub trait Transport: Send {
    /// Get the name of this transport, for diagnostics
    fn name(&self) -> &str;

    /// Deliver reports to the given destination service
    ///
    /// Failures are returned for reporting only; callers do not retry.
    async fn send(&mut self, destination: &str, reports: &[VehicleReport]) -> SimResult<()>;
}
