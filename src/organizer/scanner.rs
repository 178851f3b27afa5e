use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Expands user-supplied files and directories into a flat list of files.
pub struct SourceScanner {
    sources: Vec<PathBuf>,
}

impl SourceScanner {
    pub fn new(sources: Vec<PathBuf>) -> Self {
        Self { sources }
    }

    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let mut seen = HashSet::new();

        for source in &self.sources {
            if !source.exists() {
                warn!("Source does not exist: {}", source.display());
                continue;
            }

            if source.is_dir() {
                info!("Scanning directory: {}", source.display());
            }

            // Symlinks are not followed, so the walk cannot loop.
            for entry in WalkDir::new(source).follow_links(false) {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        Self::push_unique(entry.path(), &mut seen, &mut files);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Error walking {}: {}", source.display(), e),
                }
            }
        }

        info!("Found {} files", files.len());
        files
    }

    fn push_unique(path: &Path, seen: &mut HashSet<PathBuf>, files: &mut Vec<PathBuf>) {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if seen.insert(key) {
            files.push(path.to_path_buf());
        } else {
            debug!("Skipping already listed file {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(b"content").unwrap();
    }

    fn sorted(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
        paths.sort();
        paths
    }

    #[test]
    fn test_scanner_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = SourceScanner::new(vec![temp_dir.path().to_path_buf()]);
        assert!(scanner.scan().is_empty());
    }

    #[test]
    fn test_scanner_walks_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_file(&root.join("a.jpg"));
        create_file(&root.join("trip/b.mov"));
        create_file(&root.join("trip/day2/c.AAE"));
        fs::create_dir_all(root.join("empty")).unwrap();

        let scanner = SourceScanner::new(vec![root.to_path_buf()]);

        assert_eq!(
            sorted(scanner.scan()),
            sorted(vec![
                root.join("a.jpg"),
                root.join("trip/b.mov"),
                root.join("trip/day2/c.AAE"),
            ])
        );
    }

    #[test]
    fn test_scanner_accepts_plain_files_and_skips_missing() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("single.jpg");
        create_file(&file);

        let scanner = SourceScanner::new(vec![
            temp_dir.path().join("does-not-exist"),
            file.clone(),
        ]);

        assert_eq!(scanner.scan(), vec![file]);
    }

    #[test]
    fn test_scanner_does_not_list_a_file_twice() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("sub/a.jpg");
        create_file(&file);

        let scanner = SourceScanner::new(vec![
            temp_dir.path().to_path_buf(),
            file.clone(),
            temp_dir.path().join("sub"),
        ]);

        assert_eq!(scanner.scan(), vec![file]);
    }
}
