use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::errors::RelocationError;

/// Number of candidate names tried per file: the bare name plus nine suffixed ones.
pub const MAX_CONFLICT_SUFFIXING: usize = 10;

pub const CONFLICT_MARKER: char = '_';

/// Destination paths handed out during this run, per destination directory.
type Claims = Arc<Mutex<HashSet<PathBuf>>>;

/// Moves files into date folders without ever overwriting an existing file.
///
/// Picking a free name and renaming onto it happen under a lock held per destination
/// directory, so concurrent workers never claim the same suffix.
pub struct Relocator {
    dry_run: bool,
    directories: Mutex<HashMap<PathBuf, Claims>>,
}

impl Relocator {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            directories: Mutex::new(HashMap::new()),
        }
    }

    /// Candidate destinations in the order they are tried.
    pub fn candidate_paths<'a>(
        dest_dir: &'a Path,
        base_name: &'a str,
        extension: &'a str,
    ) -> impl Iterator<Item = PathBuf> + 'a {
        (0..MAX_CONFLICT_SUFFIXING).map(move |suffix_len| {
            let suffix = CONFLICT_MARKER.to_string().repeat(suffix_len);
            dest_dir.join(format!("{}{}{}", base_name, suffix, extension))
        })
    }

    fn claims_for(&self, dest_dir: &Path) -> Claims {
        let mut directories = self
            .directories
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        directories
            .entry(dest_dir.to_path_buf())
            .or_default()
            .clone()
    }

    pub fn relocate(
        &self,
        src: &Path,
        dest_dir: &Path,
        base_name: &str,
        extension: &str,
    ) -> Result<PathBuf, RelocationError> {
        self.create_directory(dest_dir)?;

        let claims = self.claims_for(dest_dir);
        let mut claimed = claims.lock().unwrap_or_else(PoisonError::into_inner);

        let mut last_candidate = None;
        let mut free = None;
        for candidate in Self::candidate_paths(dest_dir, base_name, extension) {
            if !candidate.exists() && !claimed.contains(&candidate) {
                free = Some(candidate);
                break;
            }
            last_candidate = Some(candidate);
        }

        let Some(new_path) = free else {
            let exhausted = last_candidate.unwrap_or_else(|| dest_dir.join(base_name));
            return Err(RelocationError::TargetExists(exhausted));
        };

        if self.dry_run {
            info!(
                "[dry-run] Would rename {} into {}",
                src.display(),
                new_path.display()
            );
            // Nothing lands on disk, so the name has to be remembered here.
            claimed.insert(new_path.clone());
        } else {
            info!("Renaming {} into {}", src.display(), new_path.display());
            fs::rename(src, &new_path)?;
        }

        Ok(new_path)
    }

    fn create_directory(&self, path: &Path) -> Result<(), RelocationError> {
        if path.is_dir() {
            return Ok(());
        }
        if self.dry_run {
            info!("[dry-run] Would create {} folder", path.display());
            return Ok(());
        }

        debug!("Creating {} folder", path.display());
        fs::create_dir_all(path)?;
        info!("Created {} folder", path.display());
        Ok(())
    }
}
