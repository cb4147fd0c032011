//! Polling for a browser-triggered download.
//!
//! A file counts as landed once it has the wanted extension, is not a
//! partial (`.crdownload`), was not already present when the watcher was
//! created, and reports the same non-zero size on two consecutive polls.

use crate::{Error, Result};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const EXTENSION: &str = "zip";
const PARTIAL_SUFFIXES: [&str; 2] = ["crdownload", "part"];

/// Size and modification time of one archive in the download directory
type FileStamp = (u64, SystemTime);

#[derive(Debug, Clone)]
pub struct DownloadWatcher {
    dir: PathBuf,
    interval: Duration,
    max_retries: u32,
    baseline: HashMap<PathBuf, FileStamp>,
}

impl DownloadWatcher {
    /// Create the watcher before triggering the download: archives already
    /// in `dir` are remembered and only count again once they change.
    pub fn new(dir: impl Into<PathBuf>, interval: Duration, max_retries: u32) -> Self {
        let dir = dir.into();
        let baseline = match scan(&dir) {
            Ok(files) => files.into_iter().collect(),
            Err(e) => {
                warn!("could not list {}: {}", dir.display(), e);
                HashMap::new()
            }
        };
        if !baseline.is_empty() {
            debug!("ignoring {} existing archives in {}", baseline.len(), dir.display());
        }
        Self {
            dir,
            interval,
            max_retries,
            baseline,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The newest completed archive that was not in the baseline unchanged
    fn candidate(&self) -> Result<Option<(PathBuf, u64)>> {
        let best = scan(&self.dir)?
            .into_iter()
            .filter(|(path, stamp)| self.baseline.get(path) != Some(stamp))
            .max_by_key(|(_, (_, modified))| *modified);
        Ok(best.map(|(path, (len, _))| (path, len)))
    }

    /// Block until a download has landed and stopped growing.
    pub fn wait(&self) -> Result<PathBuf> {
        info!(
            "watching {} for .{} (every {:?}, {} polls)",
            self.dir.display(),
            EXTENSION,
            self.interval,
            self.max_retries
        );
        let mut last: Option<(PathBuf, u64)> = None;
        for attempt in 1..=self.max_retries {
            let current = self.candidate()?;
            match (&current, &last) {
                (Some((path, size)), Some((prev_path, prev_size)))
                    if path == prev_path && size == prev_size && *size > 0 =>
                {
                    info!("download complete: {} ({} bytes)", path.display(), size);
                    return Ok(path.clone());
                }
                (Some((path, size)), _) => debug!("poll {}: {} is {} bytes", attempt, path.display(), size),
                (None, _) => debug!("poll {}: nothing yet", attempt),
            }
            last = current;
            if attempt < self.max_retries {
                std::thread::sleep(self.interval);
            }
        }
        warn!("no completed download in {}", self.dir.display());
        Err(Error::DownloadTimeout {
            retries: self.max_retries,
            interval_ms: self.interval.as_millis() as u64,
        })
    }
}

/// Every finished archive in `dir`. A missing directory is empty.
fn scan(dir: &Path) -> Result<Vec<(PathBuf, FileStamp)>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if PARTIAL_SUFFIXES.contains(&ext) || !ext.eq_ignore_ascii_case(EXTENSION) {
            continue;
        }
        let meta = entry.metadata()?;
        if meta.is_file() {
            files.push((path, (meta.len(), meta.modified().unwrap_or(UNIX_EPOCH))));
        }
    }
    Ok(files)
}

/// Copy a landed download to its static location
pub fn deliver(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<PathBuf> {
    let (src, dest) = (src.as_ref(), dest.as_ref());
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let bytes = fs::copy(src, dest)?;
    info!("delivered {} -> {} ({} bytes)", src.display(), dest.display(), bytes);
    Ok(dest.to_path_buf())
}
