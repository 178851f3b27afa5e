use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("{} has no EXIF information ({reason})", path.display())]
    NoExif { path: PathBuf, reason: String },
    #[error("{} has no datetime information", .0.display())]
    NoTimestamp(PathBuf),
    #[error("{} has an unparsable timestamp: {value}", path.display())]
    InvalidTimestamp { path: PathBuf, value: String },
    #[error("{} has no ffprobe creation time", .0.display())]
    MissingCreationTime(PathBuf),
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{tool} is not available: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ffprobe failed on {} with status {status}", path.display())]
    Failed { path: PathBuf, status: String },
    #[error("ffprobe output for {} is not valid JSON: {reason}", path.display())]
    InvalidOutput { path: PathBuf, reason: String },
}

/// Reasons a GPS group is rejected. Never fatal for the file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GpsDataError {
    #[error("Missing GPS altitude in EXIF data")]
    MissingAltitude,
    #[error("Missing GPS latitude in EXIF data")]
    MissingLatitude,
    #[error("Missing GPS longitude in EXIF data")]
    MissingLongitude,
    #[error("Invalid GPS altitude in EXIF data")]
    InvalidAltitude,
    #[error("Invalid GPS latitude in EXIF data")]
    InvalidLatitude,
    #[error("Invalid GPS longitude in EXIF data")]
    InvalidLongitude,
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizationError {
    #[error("{} already exists", .0.display())]
    TargetExists(PathBuf),
    #[error("{tool} is not available: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Converting {} failed: {reason}", path.display())]
    EncoderFailed { path: PathBuf, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RelocationError {
    #[error("{} still exists, not trying further suffixing", .0.display())]
    TargetExists(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum TrackLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Everything that can stop a single file from being processed.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
    #[error(transparent)]
    Relocation(#[from] RelocationError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// File-local; the file contributes nothing and the run goes on.
    Skip,
    /// Systemic; no further files are dispatched.
    Fatal,
    /// Not classified; treated as a skip but logged as an error.
    Unexpected,
}

impl ProcessError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ProcessError::Extraction(ExtractionError::Probe(ProbeError::ToolUnavailable {
                ..
            }))
            | ProcessError::Normalization(NormalizationError::ToolUnavailable { .. }) => {
                ErrorClass::Fatal
            }
            ProcessError::Extraction(ExtractionError::Io(_))
            | ProcessError::Normalization(NormalizationError::Io(_))
            | ProcessError::Relocation(RelocationError::Io(_))
            | ProcessError::Io(_) => ErrorClass::Unexpected,
            ProcessError::Extraction(_)
            | ProcessError::Normalization(_)
            | ProcessError::Relocation(_) => ErrorClass::Skip,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Aborting run after fatal error on {}: {source}", path.display())]
    Fatal {
        path: PathBuf,
        #[source]
        source: ProcessError,
    },
    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Failed to write track log: {0}")]
    TrackLog(#[from] TrackLogError),
}
