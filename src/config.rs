use chrono_tz::Tz;
use std::path::PathBuf;

/// Fixed name of the track log written into the output directory.
pub const TRACK_LOG_FILENAME: &str = "trace.gpx";

#[derive(Debug, Clone)]
pub struct Config {
    pub sources: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub dry_run: bool,
    /// Zone in which EXIF wall-clock times are interpreted and video times are shown.
    pub timezone: Tz,
}

impl Config {
    pub fn new(sources: Vec<PathBuf>) -> Self {
        Self {
            sources,
            output_dir: PathBuf::from("."),
            workers: num_cpus::get(),
            dry_run: false,
            timezone: Tz::UTC,
        }
    }

    pub fn track_log_path(&self) -> PathBuf {
        self.output_dir.join(TRACK_LOG_FILENAME)
    }
}

pub fn parse_timezone(value: &str) -> Result<Tz, String> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|_| format!("unknown time zone '{}'", value))
}
