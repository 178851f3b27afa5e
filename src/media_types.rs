use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// A validated geolocation reading. Only built once all six GPS sub-fields passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsFix {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl GpsFix {
    /// UTC timestamp as fixed-width ISO-8601 with seconds precision, e.g. `2024-05-05T16:19:59Z`.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub gps: Option<GpsFix>,
}

impl MediaInfo {
    pub fn date_component(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn time_component(&self) -> String {
        self.time.format("%H-%M-%S").to_string()
    }

    /// File stem used for relocation: `<date>_<time>`.
    pub fn base_name(&self) -> String {
        format!("{}_{}", self.date_component(), self.time_component())
    }
}

/// EXIF GPSAltitudeRef values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AltitudeRef {
    AboveSeaLevel,
    BelowSeaLevel,
}

impl AltitudeRef {
    pub fn from_exif(value: u8) -> Option<Self> {
        match value {
            0 => Some(AltitudeRef::AboveSeaLevel),
            1 => Some(AltitudeRef::BelowSeaLevel),
            _ => None,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            AltitudeRef::AboveSeaLevel => 1.0,
            AltitudeRef::BelowSeaLevel => -1.0,
        }
    }
}
