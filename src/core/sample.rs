use crate::error::{SimError, SimResult};

/// Passenger occupancy flag recorded with each position
///
/// Carried through the pipeline but not part of the outbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Vacant,
    Hired,
}

impl Occupancy {
    fn from_flag(flag: i64) -> Option<Self> {
        match flag {
            0 => Some(Occupancy::Vacant),
            1 => Some(Occupancy::Hired),
            _ => None,
        }
    }
}

/// One recorded position of a vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Latitude in decimal degrees
    pub lat: f64,

    /// Longitude in decimal degrees
    pub lon: f64,

    pub occupancy: Occupancy,

    /// Original Unix timestamp in seconds
    pub timestamp: i64,
}

impl Sample {
    /// Parse a `LAT LON OCC TS` line
    ///
    /// Fields are whitespace separated, e.g. `37.76127 -122.39841 0 1213088776`.
    /// Anything after the fourth field is ignored. `line_no` is only used for
    /// error reporting.
    pub fn parse(line: &str, line_no: usize) -> SimResult<Self> {
        let mut fields = line.split_whitespace();
        let (Some(lat), Some(lon), Some(occ), Some(ts)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(SimError::malformed(
                line_no,
                format!("expected 4 fields in {:?}", line.trim()),
            ));
        };

        let lat = lat
            .parse::<f64>()
            .map_err(|e| SimError::malformed(line_no, format!("latitude {lat:?}: {e}")))?;
        let lon = lon
            .parse::<f64>()
            .map_err(|e| SimError::malformed(line_no, format!("longitude {lon:?}: {e}")))?;

        let flag = occ
            .parse::<i64>()
            .map_err(|e| SimError::malformed(line_no, format!("occupancy {occ:?}: {e}")))?;
        let occupancy = Occupancy::from_flag(flag)
            .ok_or_else(|| SimError::malformed(line_no, format!("occupancy must be 0 or 1, got {flag}")))?;

        let timestamp = ts
            .parse::<i64>()
            .map_err(|e| SimError::malformed(line_no, format!("timestamp {ts:?}: {e}")))?;

        Ok(Self {
            lat,
            lon,
            occupancy,
            timestamp,
        })
    }
}
