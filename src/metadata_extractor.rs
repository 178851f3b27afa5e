use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use exif::{In, Reader, Tag, Value};
use log::{debug, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::{ExtractionError, GpsDataError};
use crate::media_types::{AltitudeRef, GpsFix, MediaInfo};

/// Common contract of the still-image and video strategies.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<MediaInfo, ExtractionError>;
}

/// The EXIF fields this crate consumes, as decoded from the file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExifFields {
    pub datetime: Option<String>,
    pub gps: RawGpsFields,
}

/// GPS sub-fields exactly as stored; nothing here has been validated yet.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RawGpsFields {
    pub latitude: Option<Vec<f64>>,
    pub latitude_ref: Option<String>,
    pub longitude: Option<Vec<f64>>,
    pub longitude_ref: Option<String>,
    pub altitude: Option<f64>,
    pub altitude_ref: Option<u8>,
}

impl RawGpsFields {
    pub fn is_empty(&self) -> bool {
        self.latitude.is_none()
            && self.latitude_ref.is_none()
            && self.longitude.is_none()
            && self.longitude_ref.is_none()
            && self.altitude.is_none()
            && self.altitude_ref.is_none()
    }
}

pub struct StillImageExtractor {
    timezone: Tz,
}

impl StillImageExtractor {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Clean EXIF ASCII values by removing null bytes, whitespace and quotes
    fn clean_exif_string(value: &[u8]) -> String {
        String::from_utf8_lossy(value)
            .replace('\0', "")
            .trim()
            .trim_matches('"')
            .trim()
            .to_string()
    }

    fn ascii_value(value: &Value) -> Option<String> {
        if let Value::Ascii(ref v) = value {
            v.first()
                .map(|bytes| Self::clean_exif_string(bytes))
                .filter(|s| !s.is_empty())
        } else {
            None
        }
    }

    fn rational_values(value: &Value) -> Option<Vec<f64>> {
        match value {
            Value::Rational(ref v) => Some(v.iter().map(|r| r.to_f64()).collect()),
            _ => None,
        }
    }

    /// Decode the fields we need from a file's EXIF block.
    pub fn read_exif_fields(path: &Path) -> Result<ExifFields, ExtractionError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let exif = Reader::new()
            .continue_on_error(true)
            .read_from_container(&mut reader)
            .or_else(|e| {
                e.distill_partial_result(|errors| {
                    for error in errors {
                        debug!("Ignoring broken EXIF field in {}: {}", path.display(), error);
                    }
                })
            })
            .map_err(|e| match e {
                exif::Error::Io(io) => ExtractionError::Io(io),
                other => ExtractionError::NoExif {
                    path: path.to_path_buf(),
                    reason: other.to_string(),
                },
            })?;

        if let Some(version) = exif.get_field(Tag::ExifVersion, In::PRIMARY) {
            debug!(
                "Exif version for {}: {}",
                path.display(),
                version.display_value()
            );
        }

        let datetime = [Tag::DateTimeOriginal, Tag::DateTime]
            .iter()
            .filter_map(|tag| exif.get_field(*tag, In::PRIMARY))
            .find_map(|field| Self::ascii_value(&field.value));

        let exif_ref = &exif;
        let field = move |tag: Tag| exif_ref.get_field(tag, In::PRIMARY).map(|f| &f.value);

        let gps = RawGpsFields {
            latitude: field(Tag::GPSLatitude).and_then(Self::rational_values),
            latitude_ref: field(Tag::GPSLatitudeRef).and_then(Self::ascii_value),
            longitude: field(Tag::GPSLongitude).and_then(Self::rational_values),
            longitude_ref: field(Tag::GPSLongitudeRef).and_then(Self::ascii_value),
            altitude: field(Tag::GPSAltitude)
                .and_then(Self::rational_values)
                .and_then(|v| v.first().copied()),
            altitude_ref: field(Tag::GPSAltitudeRef).and_then(|value| match value {
                Value::Byte(ref v) => v.first().copied(),
                _ => None,
            }),
        };
        debug!("GPS for {}: {:?}", path.display(), gps);

        Ok(ExifFields { datetime, gps })
    }

    /// Turn decoded EXIF fields into a `MediaInfo`. GPS problems only drop the coordinate.
    pub fn media_info_from_fields(
        &self,
        path: &Path,
        fields: &ExifFields,
    ) -> Result<MediaInfo, ExtractionError> {
        let raw = fields
            .datetime
            .as_deref()
            .ok_or_else(|| ExtractionError::NoTimestamp(path.to_path_buf()))?;

        let local = parse_exif_datetime(raw).ok_or_else(|| ExtractionError::InvalidTimestamp {
            path: path.to_path_buf(),
            value: raw.to_string(),
        })?;
        let utc = local_to_utc(&local, &self.timezone);

        let gps = if fields.gps.is_empty() {
            debug!("No GPS data in {}", path.display());
            None
        } else {
            match build_gps_fix(&fields.gps, utc) {
                Ok(fix) => Some(fix),
                Err(e) => {
                    warn!("Cannot use {} GPS coordinates: {}", path.display(), e);
                    None
                }
            }
        };

        Ok(MediaInfo {
            date: local.date(),
            time: local.time(),
            gps,
        })
    }
}

impl MetadataExtractor for StillImageExtractor {
    fn extract(&self, path: &Path) -> Result<MediaInfo, ExtractionError> {
        debug!("Getting EXIF information for {}", path.display());
        let fields = Self::read_exif_fields(path)?;
        self.media_info_from_fields(path, &fields)
    }
}

/// Parse an EXIF timestamp such as `2024:05:05 18:19:59`.
pub fn parse_exif_datetime(datetime_str: &str) -> Option<NaiveDateTime> {
    let cleaned = datetime_str.replace('"', "");
    NaiveDateTime::parse_from_str(cleaned.trim(), "%Y:%m:%d %H:%M:%S").ok()
}

/// Interpret a wall-clock time in `timezone`.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a DST gap
/// use the standard offset in effect right before the gap.
pub fn local_to_utc(local: &NaiveDateTime, timezone: &Tz) -> DateTime<Utc> {
    match timezone.from_local_datetime(local) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            let offset = match timezone.from_local_datetime(&(*local - TimeDelta::hours(1))) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.offset().fix(),
                LocalResult::None => timezone.offset_from_utc_datetime(local).fix(),
            };
            let shifted = *local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
            Utc.from_utc_datetime(&shifted)
        }
    }
}

/// `deg + min/60 + sec/3600`; anything other than exactly three components is rejected.
pub fn dms_to_decimal(dms: &[f64]) -> Option<f64> {
    match dms {
        [degrees, minutes, seconds] => {
            let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
            decimal.is_finite().then_some(decimal)
        }
        _ => None,
    }
}

/// Validate the six GPS sub-fields together and build a fix from them.
pub fn build_gps_fix(
    raw: &RawGpsFields,
    timestamp: DateTime<Utc>,
) -> Result<GpsFix, GpsDataError> {
    let (Some(altitude), Some(altitude_ref)) = (raw.altitude, raw.altitude_ref) else {
        return Err(GpsDataError::MissingAltitude);
    };
    let (Some(latitude), Some(latitude_ref)) =
        (raw.latitude.as_deref(), raw.latitude_ref.as_deref())
    else {
        return Err(GpsDataError::MissingLatitude);
    };
    let (Some(longitude), Some(longitude_ref)) =
        (raw.longitude.as_deref(), raw.longitude_ref.as_deref())
    else {
        return Err(GpsDataError::MissingLongitude);
    };

    let altitude_ref = AltitudeRef::from_exif(altitude_ref).ok_or(GpsDataError::InvalidAltitude)?;
    if !altitude.is_finite() {
        return Err(GpsDataError::InvalidAltitude);
    }

    let latitude_sign = match latitude_ref {
        "N" => 1.0,
        "S" => -1.0,
        _ => return Err(GpsDataError::InvalidLatitude),
    };
    let latitude = dms_to_decimal(latitude)
        .filter(|v| (0.0..=90.0).contains(v))
        .ok_or(GpsDataError::InvalidLatitude)?;

    let longitude_sign = match longitude_ref {
        "E" => 1.0,
        "W" => -1.0,
        _ => return Err(GpsDataError::InvalidLongitude),
    };
    let longitude = dms_to_decimal(longitude)
        .filter(|v| (0.0..=180.0).contains(v))
        .ok_or(GpsDataError::InvalidLongitude)?;

    Ok(GpsFix {
        timestamp,
        latitude: latitude * latitude_sign,
        longitude: longitude * longitude_sign,
        altitude: altitude * altitude_ref.sign(),
    })
}
