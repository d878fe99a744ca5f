use crate::core::{Occupancy, Sample};
use chrono::{DateTime, Utc};

/// A sample that is due for delivery, tagged with its vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub vehicle_id: String,

    /// Reprojected emission time
    pub timestamp: DateTime<Utc>,

    pub lat: f64,
    pub lon: f64,
    pub occupancy: Occupancy,
}

impl QueueEntry {
    pub fn new(vehicle_id: &str, timestamp: DateTime<Utc>, sample: &Sample) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            timestamp,
            lat: sample.lat,
            lon: sample.lon,
            occupancy: sample.occupancy,
        }
    }

    /// Emission time as an RFC 3339 string
    pub fn iso_timestamp(&self) -> String {
        self.timestamp.to_rfc3339()
    }
}
