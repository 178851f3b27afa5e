use log::info;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::errors::TrackLogError;
use crate::media_types::GpsFix;

const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/0";
const GPX_SCHEMA_LOCATION: &str =
    "http://www.topografix.com/GPX/1/0 http://www.topografix.com/GPX/1/0/gpx.xsd";

/// All GPS fixes of a run, ordered by ascending timestamp.
#[derive(Debug, Clone, Default)]
pub struct TrackLog {
    fixes: Vec<GpsFix>,
}

impl TrackLog {
    pub fn new(mut fixes: Vec<GpsFix>) -> Self {
        // Stable, so fixes sharing a timestamp keep their collection order.
        fixes.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Self { fixes }
    }

    pub fn fixes(&self) -> &[GpsFix] {
        &self.fixes
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    /// Serialize as a GPX 1.0 document with a single track segment.
    pub fn to_gpx(&self) -> Result<Vec<u8>, TrackLogError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut gpx = BytesStart::new("gpx");
        gpx.push_attribute(("version", "1.0"));
        gpx.push_attribute(("creator", env!("CARGO_PKG_NAME")));
        gpx.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
        gpx.push_attribute(("xmlns", GPX_NAMESPACE));
        gpx.push_attribute(("xsi:schemaLocation", GPX_SCHEMA_LOCATION));
        writer.write_event(Event::Start(gpx))?;
        writer.write_event(Event::Start(BytesStart::new("trk")))?;
        Self::write_text_element(&mut writer, "number", "1")?;
        writer.write_event(Event::Start(BytesStart::new("trkseg")))?;

        for fix in &self.fixes {
            let latitude = fix.latitude.to_string();
            let longitude = fix.longitude.to_string();
            let mut trkpt = BytesStart::new("trkpt");
            trkpt.push_attribute(("lat", latitude.as_str()));
            trkpt.push_attribute(("lon", longitude.as_str()));
            writer.write_event(Event::Start(trkpt))?;
            Self::write_text_element(&mut writer, "ele", &fix.altitude.to_string())?;
            Self::write_text_element(&mut writer, "time", &fix.timestamp_iso())?;
            writer.write_event(Event::End(BytesEnd::new("trkpt")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
        writer.write_event(Event::End(BytesEnd::new("trk")))?;
        writer.write_event(Event::End(BytesEnd::new("gpx")))?;

        let mut document = writer.into_inner();
        document.push(b'\n');
        Ok(document)
    }

    fn write_text_element(
        writer: &mut Writer<Vec<u8>>,
        name: &str,
        text: &str,
    ) -> Result<(), TrackLogError> {
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        writer.write_event(Event::Text(BytesText::new(text)))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Write the document to `path`, replacing any previous file atomically.
    pub fn write(&self, path: &Path) -> Result<(), TrackLogError> {
        if self.is_empty() {
            info!("No geotagged files, writing empty GPX trace to {}", path.display());
        } else {
            info!("Writing GPX trace with {} points to {}", self.len(), path.display());
        }
        let document = self.to_gpx()?;

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(directory)?;
        let mut temp = NamedTempFile::new_in(directory)?;
        temp.write_all(&document)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| TrackLogError::Io(e.error))?;

        Ok(())
    }
}

/// Sort `fixes` and write them as the run's track log.
pub fn write_track_log(fixes: Vec<GpsFix>, path: &Path) -> Result<TrackLog, TrackLogError> {
    let track_log = TrackLog::new(fixes);
    track_log.write(path)?;
    Ok(track_log)
}
