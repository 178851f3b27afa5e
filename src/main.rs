use clap::{Parser, ValueEnum};
use log::{debug, error, info};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

use media_sorter::config::{self, Config};
use media_sorter::organizer::MediaOrganizer;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error | LogLevel::Critical => log::LevelFilter::Error,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "media-sorter", version)]
#[command(about = "Sort photos and videos into date folders and build a GPX trace of geotagged shots")]
struct Cli {
    /// Files or directories to process
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Directory receiving the date folders and trace.gpx
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Number of parallel workers (default: CPU count)
    #[arg(short, long)]
    jobs: Option<NonZeroUsize>,

    /// Log what would happen without touching any file
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Time zone the camera clocks were set to
    #[arg(long, env = "MEDIA_SORTER_TIMEZONE", default_value = "UTC", value_parser = config::parse_timezone)]
    timezone: chrono_tz::Tz,

    #[arg(long, env = "MEDIA_SORTER_LOG_LEVEL", value_enum, default_value = "warning")]
    log_level: LogLevel,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::new(self.sources);
        config.output_dir = self.output_dir;
        if let Some(jobs) = self.jobs {
            config.workers = jobs.get();
        }
        config.dry_run = self.dry_run;
        config.timezone = self.timezone;
        config
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(cli.log_level.to_filter())
        .init();
    debug!("Parsed arguments: {:?}", cli);

    let config = cli.into_config();
    info!(
        "Sorting {} sources into {} with {} workers (time zone {}{})",
        config.sources.len(),
        config.output_dir.display(),
        config.workers,
        config.timezone,
        if config.dry_run { ", dry run" } else { "" }
    );

    let start = Instant::now();
    let organizer = MediaOrganizer::new(&config);
    match organizer.run() {
        Ok(report) => {
            info!(
                "Processing completed in {:.2} seconds ({} files, {} geotagged)",
                start.elapsed().as_secs_f64(),
                report.scanned,
                report.geotagged
            );
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            Err(e.into())
        }
    }
}
