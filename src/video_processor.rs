use chrono::NaiveDateTime;
use chrono_tz::Tz;
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use crate::errors::{ExtractionError, ProbeError};
use crate::media_types::MediaInfo;
use crate::metadata_extractor::MetadataExtractor;

fn get_ffprobe_path() -> String {
    std::env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string())
}

/// Reads container-level metadata from a video file.
pub trait ContainerProber: Send + Sync {
    fn probe(&self, path: &Path) -> Result<serde_json::Value, ProbeError>;
}

pub struct FfprobeProber {
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new(get_ffprobe_path())
    }
}

impl ContainerProber for FfprobeProber {
    fn probe(&self, path: &Path) -> Result<serde_json::Value, ProbeError> {
        debug!(
            "Running {} on {}",
            self.ffprobe_path.display(),
            path.display()
        );
        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => ProbeError::ToolUnavailable {
                    tool: self.ffprobe_path.display().to_string(),
                    source: e,
                },
                _ => ProbeError::Failed {
                    path: path.to_path_buf(),
                    status: e.to_string(),
                },
            })?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                path: path.to_path_buf(),
                status: output.status.to_string(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| ProbeError::InvalidOutput {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Video strategy: the capture time is the container's UTC `creation_time`.
/// GPS is not read from video containers.
pub struct VideoExtractor {
    prober: Arc<dyn ContainerProber>,
    timezone: Tz,
}

impl VideoExtractor {
    pub fn new(prober: Arc<dyn ContainerProber>, timezone: Tz) -> Self {
        Self { prober, timezone }
    }

    /// Build `MediaInfo` from probe output, e.g. `format.tags.creation_time = "2024-05-12T05:38:26.000000Z"`.
    pub fn media_info_from_probe(
        &self,
        path: &Path,
        parsed: &serde_json::Value,
    ) -> Result<MediaInfo, ExtractionError> {
        let creation_time = parsed["format"]["tags"]["creation_time"]
            .as_str()
            .ok_or_else(|| ExtractionError::MissingCreationTime(path.to_path_buf()))?;

        let utc = NaiveDateTime::parse_from_str(creation_time, "%Y-%m-%dT%H:%M:%S%.fZ")
            .map_err(|_| ExtractionError::InvalidTimestamp {
                path: path.to_path_buf(),
                value: creation_time.to_string(),
            })?
            .and_utc();
        let local = utc.with_timezone(&self.timezone).naive_local();

        Ok(MediaInfo {
            date: local.date(),
            time: local.time(),
            gps: None,
        })
    }
}

impl MetadataExtractor for VideoExtractor {
    fn extract(&self, path: &Path) -> Result<MediaInfo, ExtractionError> {
        debug!("Getting ffprobe information for {}", path.display());
        let parsed = self.prober.probe(path)?;
        self.media_info_from_probe(path, &parsed)
    }
}
