use std::path::Path;

/// Extensions deleted outright (sidecar files without image or video content).
pub const REMOVE_EXTENSIONS: &[&str] = &["aae"];

/// Extensions carrying EXIF that are already in the canonical JPEG encoding.
pub const EXIF_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

pub const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4"];

/// Image encodings re-encoded to JPEG before metadata extraction.
pub const NORMALIZE_EXTENSIONS: &[&str] = &["heic", "heif"];

pub const TARGET_IMAGE_FORMAT: &str = "jpeg";
pub const TARGET_IMAGE_EXTENSION: &str = "jpg";

/// How a file is handled, resolved once from its lowercased extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    StillImage,
    Video,
    Removable,
    Normalizable,
    Passthrough,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Self {
        lowercase_extension(path)
            .map(|ext| Self::from_extension(&ext))
            .unwrap_or(MediaKind::Passthrough)
    }

    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        let ext = ext.as_str();
        if REMOVE_EXTENSIONS.contains(&ext) {
            MediaKind::Removable
        } else if NORMALIZE_EXTENSIONS.contains(&ext) {
            MediaKind::Normalizable
        } else if EXIF_IMAGE_EXTENSIONS.contains(&ext) {
            MediaKind::StillImage
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            MediaKind::Video
        } else {
            MediaKind::Passthrough
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::StillImage => "still image",
            MediaKind::Video => "video",
            MediaKind::Removable => "removable",
            MediaKind::Normalizable => "normalizable image",
            MediaKind::Passthrough => "passthrough",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Extension (with leading dot) used for the relocated file name.
///
/// `.jpeg` is already JPEG, so it only gets the canonical spelling.
pub fn canonical_extension(path: &Path) -> String {
    match lowercase_extension(path) {
        Some(ext) if ext == "jpeg" => format!(".{}", TARGET_IMAGE_EXTENSION),
        Some(ext) => format!(".{}", ext),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(MediaKind::from_path(Path::new("a/b.jpg")), MediaKind::StillImage);
        assert_eq!(MediaKind::from_path(Path::new("b.JPEG")), MediaKind::StillImage);
        assert_eq!(MediaKind::from_path(Path::new("clip.MOV")), MediaKind::Video);
        assert_eq!(MediaKind::from_path(Path::new("clip.mp4")), MediaKind::Video);
        assert_eq!(MediaKind::from_path(Path::new("IMG_1.AAE")), MediaKind::Removable);
        assert_eq!(MediaKind::from_path(Path::new("IMG_1.HEIC")), MediaKind::Normalizable);
        assert_eq!(MediaKind::from_path(Path::new("notes.txt")), MediaKind::Passthrough);
        assert_eq!(MediaKind::from_path(Path::new("README")), MediaKind::Passthrough);
    }

    #[test]
    fn test_canonical_extension() {
        assert_eq!(canonical_extension(Path::new("x.JPG")), ".jpg");
        assert_eq!(canonical_extension(Path::new("x.jpeg")), ".jpg");
        assert_eq!(canonical_extension(Path::new("x.MOV")), ".mov");
        assert_eq!(canonical_extension(Path::new("x")), "");
    }

    #[test]
    fn test_media_kind_display() {
        assert_eq!(format!("{}", MediaKind::Video), "video");
        assert_eq!(format!("{}", MediaKind::Normalizable), "normalizable image");
    }
}
