use log::{debug, info};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tempfile::NamedTempFile;

use crate::errors::NormalizationError;
use crate::file_types::{lowercase_extension, TARGET_IMAGE_EXTENSION, TARGET_IMAGE_FORMAT};

fn get_magick_path() -> String {
    std::env::var("MAGICK_PATH").unwrap_or_else(|_| "magick".to_string())
}

/// Re-encodes an image into `format`, writing the result to `dest`.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, src: &Path, format: &str, dest: &Path) -> Result<(), NormalizationError>;
}

/// ImageMagick command line encoder; embedded profiles (EXIF included) are carried over.
pub struct MagickEncoder {
    magick_path: PathBuf,
}

impl MagickEncoder {
    pub fn new(magick_path: impl Into<PathBuf>) -> Self {
        Self {
            magick_path: magick_path.into(),
        }
    }
}

impl Default for MagickEncoder {
    fn default() -> Self {
        Self::new(get_magick_path())
    }
}

impl ImageEncoder for MagickEncoder {
    fn encode(&self, src: &Path, format: &str, dest: &Path) -> Result<(), NormalizationError> {
        let target = format!("{}:{}", format, dest.display());
        debug!(
            "Running {} {} {}",
            self.magick_path.display(),
            src.display(),
            target
        );

        let output = Command::new(&self.magick_path)
            .arg(src)
            .arg(&target)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    NormalizationError::ToolUnavailable {
                        tool: self.magick_path.display().to_string(),
                        source: e,
                    }
                }
                _ => NormalizationError::Io(e),
            })?;

        if !output.status.success() {
            return Err(NormalizationError::EncoderFailed {
                path: src.to_path_buf(),
                reason: format!(
                    "{} exited with {}: {}",
                    self.magick_path.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(())
    }
}

/// Converts configured source encodings into JPEG next to the original file.
pub struct ImageNormalizer {
    encoder: Arc<dyn ImageEncoder>,
    dry_run: bool,
}

impl ImageNormalizer {
    pub fn new(encoder: Arc<dyn ImageEncoder>, dry_run: bool) -> Self {
        Self { encoder, dry_run }
    }

    /// Returns the path of the JPEG version of `path`.
    ///
    /// Files already in the target encoding are returned unchanged. The original is only
    /// deleted after the new file has been published; on any error it is left as it was.
    pub fn normalize(&self, path: &Path) -> Result<PathBuf, NormalizationError> {
        if lowercase_extension(path).as_deref() == Some(TARGET_IMAGE_EXTENSION) {
            return Ok(path.to_path_buf());
        }

        let new_path = path.with_extension(TARGET_IMAGE_EXTENSION);
        if new_path.exists() {
            return Err(NormalizationError::TargetExists(new_path));
        }

        if self.dry_run {
            info!(
                "[dry-run] Would convert image {} to {} into {}",
                path.display(),
                TARGET_IMAGE_FORMAT,
                new_path.display()
            );
            return Ok(new_path);
        }

        info!(
            "Converting image {} to {} into {}",
            path.display(),
            TARGET_IMAGE_FORMAT,
            new_path.display()
        );

        // Encode into a temporary sibling so a failed conversion leaves nothing behind.
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(directory)?;
        self.encoder.encode(path, TARGET_IMAGE_FORMAT, temp.path())?;

        temp.persist_noclobber(&new_path).map_err(|e| {
            if e.error.kind() == ErrorKind::AlreadyExists {
                NormalizationError::TargetExists(new_path.clone())
            } else {
                NormalizationError::Io(e.error)
            }
        })?;

        debug!("Removing file {}", path.display());
        fs::remove_file(path)?;

        Ok(new_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct CopyEncoder;

    impl ImageEncoder for CopyEncoder {
        fn encode(&self, src: &Path, _format: &str, dest: &Path) -> Result<(), NormalizationError> {
            fs::copy(src, dest)?;
            Ok(())
        }
    }

    struct FailingEncoder;

    impl ImageEncoder for FailingEncoder {
        fn encode(&self, src: &Path, _format: &str, _dest: &Path) -> Result<(), NormalizationError> {
            Err(NormalizationError::EncoderFailed {
                path: src.to_path_buf(),
                reason: "corrupt input".to_string(),
            })
        }
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_normalize_replaces_original() {
        let temp_dir = TempDir::new().unwrap();
        let heic = temp_dir.path().join("IMG_0001.HEIC");
        fs::write(&heic, b"heic content").unwrap();

        let normalizer = ImageNormalizer::new(Arc::new(CopyEncoder), false);
        let new_path = normalizer.normalize(&heic).unwrap();

        assert_eq!(new_path, temp_dir.path().join("IMG_0001.jpg"));
        assert!(!heic.exists());
        assert_eq!(fs::read(&new_path).unwrap(), b"heic content");
        assert_eq!(dir_entries(temp_dir.path()), vec!["IMG_0001.jpg"]);
    }

    #[test]
    fn test_normalize_is_identity_for_target_encoding() {
        let temp_dir = TempDir::new().unwrap();
        let jpg = temp_dir.path().join("photo.JPG");
        fs::write(&jpg, b"jpeg").unwrap();

        let normalizer = ImageNormalizer::new(Arc::new(FailingEncoder), false);
        assert_eq!(normalizer.normalize(&jpg).unwrap(), jpg);
        assert!(jpg.exists());
    }

    #[test]
    fn test_normalize_refuses_existing_target() {
        let temp_dir = TempDir::new().unwrap();
        let heic = temp_dir.path().join("a.heic");
        let existing = temp_dir.path().join("a.jpg");
        fs::write(&heic, b"heic").unwrap();
        fs::write(&existing, b"other").unwrap();

        let normalizer = ImageNormalizer::new(Arc::new(CopyEncoder), false);
        let result = normalizer.normalize(&heic);

        assert!(matches!(result, Err(NormalizationError::TargetExists(_))));
        assert!(heic.exists());
        assert_eq!(fs::read(&existing).unwrap(), b"other");
    }

    #[test]
    fn test_failed_encoding_leaves_original_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let heic = temp_dir.path().join("a.heic");
        fs::write(&heic, b"heic").unwrap();

        let normalizer = ImageNormalizer::new(Arc::new(FailingEncoder), false);
        let result = normalizer.normalize(&heic);

        assert!(matches!(
            result,
            Err(NormalizationError::EncoderFailed { .. })
        ));
        assert_eq!(dir_entries(temp_dir.path()), vec!["a.heic"]);
    }

    #[test]
    fn test_dry_run_does_not_touch_files() {
        let temp_dir = TempDir::new().unwrap();
        let heic = temp_dir.path().join("a.heic");
        fs::write(&heic, b"heic").unwrap();

        let normalizer = ImageNormalizer::new(Arc::new(CopyEncoder), true);
        let new_path = normalizer.normalize(&heic).unwrap();

        assert_eq!(new_path, temp_dir.path().join("a.jpg"));
        assert_eq!(dir_entries(temp_dir.path()), vec!["a.heic"]);
    }

    #[test]
    fn test_missing_magick_binary_is_tool_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let heic = temp_dir.path().join("a.heic");
        fs::write(&heic, b"heic").unwrap();

        let normalizer = ImageNormalizer::new(
            Arc::new(MagickEncoder::new("/nonexistent/bin/magick-missing")),
            false,
        );
        let result = normalizer.normalize(&heic);

        assert!(matches!(
            result,
            Err(NormalizationError::ToolUnavailable { .. })
        ));
        assert_eq!(dir_entries(temp_dir.path()), vec!["a.heic"]);
    }
}
