use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::errors::{ErrorClass, ProcessError};
use crate::file_types::{canonical_extension, MediaKind};
use crate::image_converter::{ImageEncoder, ImageNormalizer, MagickEncoder};
use crate::media_types::GpsFix;
use crate::metadata_extractor::{MetadataExtractor, StillImageExtractor};
use crate::relocator::Relocator;
use crate::video_processor::{ContainerProber, FfprobeProber, VideoExtractor};

/// What happened to one file.
#[derive(Debug)]
pub enum FileOutcome {
    /// Handled (relocated, removed or left alone), possibly yielding a GPS fix.
    Completed(Option<GpsFix>),
    /// The file was skipped; the run continues.
    Skipped(ProcessError),
    /// A systemic failure; nothing more should be dispatched.
    Fatal(ProcessError),
    /// Not started because the run was already aborting.
    Cancelled,
}

/// Per-file pipeline: classify, remove or normalize, extract metadata, relocate.
pub struct MediaProcessor {
    still_image: StillImageExtractor,
    video: VideoExtractor,
    normalizer: ImageNormalizer,
    relocator: Relocator,
    output_dir: PathBuf,
    dry_run: bool,
}

impl MediaProcessor {
    pub fn new(config: &Config) -> Self {
        Self::with_tools(
            config,
            Arc::new(FfprobeProber::default()),
            Arc::new(MagickEncoder::default()),
        )
    }

    pub fn with_tools(
        config: &Config,
        prober: Arc<dyn ContainerProber>,
        encoder: Arc<dyn ImageEncoder>,
    ) -> Self {
        Self {
            still_image: StillImageExtractor::new(config.timezone),
            video: VideoExtractor::new(prober, config.timezone),
            normalizer: ImageNormalizer::new(encoder, config.dry_run),
            relocator: Relocator::new(config.dry_run),
            output_dir: config.output_dir.clone(),
            dry_run: config.dry_run,
        }
    }

    /// Process one file, converting errors into an outcome so they never cross file boundaries.
    pub fn process_file(&self, path: &Path) -> FileOutcome {
        match self.process(path) {
            Ok(fix) => FileOutcome::Completed(fix),
            Err(e) => match e.class() {
                ErrorClass::Skip => {
                    warn!("Skipping file {}: {}", path.display(), e);
                    FileOutcome::Skipped(e)
                }
                ErrorClass::Unexpected => {
                    error!("Unexpected error, skipping file {} due to: {}", path.display(), e);
                    FileOutcome::Skipped(e)
                }
                ErrorClass::Fatal => {
                    error!("Fatal error while processing {}: {}", path.display(), e);
                    FileOutcome::Fatal(e)
                }
            },
        }
    }

    pub fn process(&self, path: &Path) -> Result<Option<GpsFix>, ProcessError> {
        let mut kind = MediaKind::from_path(path);
        debug!("Processing {} as {}", path.display(), kind);

        if kind == MediaKind::Removable {
            self.delete_file(path)?;
            return Ok(None);
        }

        // `target` is where the file lives after normalization; `source` is the file on disk
        // to read from, which differs from `target` only in dry-run mode.
        let mut source = path.to_path_buf();
        let mut target = path.to_path_buf();
        if kind == MediaKind::Normalizable {
            target = self.normalizer.normalize(path)?;
            if !self.dry_run {
                source = target.clone();
            }
            kind = MediaKind::from_path(&target);
        }

        match kind {
            MediaKind::StillImage => self.relocate_with(&self.still_image, &source, &target),
            MediaKind::Video => self.relocate_with(&self.video, &source, &target),
            MediaKind::Removable | MediaKind::Normalizable | MediaKind::Passthrough => {
                debug!("Leaving {} untouched", path.display());
                Ok(None)
            }
        }
    }

    fn relocate_with(
        &self,
        extractor: &dyn MetadataExtractor,
        source: &Path,
        target: &Path,
    ) -> Result<Option<GpsFix>, ProcessError> {
        let info = extractor.extract(source)?;
        let out_directory = self.output_dir.join(info.date_component());

        self.relocator.relocate(
            source,
            &out_directory,
            &info.base_name(),
            &canonical_extension(target),
        )?;

        Ok(info.gps)
    }

    fn delete_file(&self, path: &Path) -> Result<(), ProcessError> {
        if self.dry_run {
            info!("[dry-run] Would remove file {}", path.display());
            return Ok(());
        }
        debug!("Removing file {}", path.display());
        fs::remove_file(path)?;
        Ok(())
    }
}
