//! Saving archive responses as files.
//!
//! When a request is marked as a download, an archive response is handed to a
//! [`FileSaver`] instead of being returned to the caller.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use courier_core::logging::targets;
use directories::UserDirs;

use super::response::Blob;
use crate::error::Result;

/// Persists a downloaded blob.
pub trait FileSaver: Send + Sync {
    /// Save `blob` under `filename` and return where it ended up.
    fn save(&self, blob: &Blob, filename: &str) -> Result<PathBuf>;
}

/// Writes downloads into a directory.
///
/// Existing files are never overwritten. When the name is taken the file is
/// saved as `name (1).ext`, `name (2).ext` and so on.
#[derive(Clone, Debug)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    /// Save into `dir`. The directory is created on first save if missing.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Save into the user's download directory, or the current directory if
    /// the platform has none.
    pub fn user_downloads() -> Self {
        let dir = UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir)
    }

    /// The target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Default for DirectorySaver {
    fn default() -> Self {
        Self::user_downloads()
    }
}

impl FileSaver for DirectorySaver {
    fn save(&self, blob: &Blob, filename: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let (path, mut file) = create_unique(&self.dir, &sanitize_filename(filename))?;

        file.write_all(&blob.bytes)?;
        file.flush()?;

        tracing::info!(
            target: targets::DOWNLOAD,
            path = %path.display(),
            bytes = blob.len(),
            content_type = %blob.content_type,
            "download saved"
        );
        Ok(path)
    }
}

/// Upper bound on numbered candidates before giving up.
const MAX_NUMBERED_NAMES: u32 = 9_999;

/// Create a file named `filename` in `dir`, numbering the name if it is taken.
fn create_unique(dir: &Path, filename: &str) -> io::Result<(PathBuf, File)> {
    let name = Path::new(filename);
    let stem = name.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let extension = name.extension().map(|e| e.to_string_lossy());

    for n in 0..=MAX_NUMBERED_NAMES {
        let candidate = match (n, &extension) {
            (0, _) => filename.to_string(),
            (n, Some(ext)) => format!("{stem} ({n}).{ext}"),
            (n, None) => format!("{stem} ({n})"),
        };
        let path = dir.join(candidate);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                tracing::trace!(target: targets::DOWNLOAD, path = %path.display(), "name taken");
            }
            Err(err) => return Err(err),
        }
    }

    Err(io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free name for {filename} in {}", dir.display()),
    ))
}

/// Discards downloads. For headless use where nothing should touch the disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSaver;

impl FileSaver for NullSaver {
    fn save(&self, blob: &Blob, filename: &str) -> Result<PathBuf> {
        tracing::debug!(
            target: targets::DOWNLOAD,
            filename,
            bytes = blob.len(),
            "download discarded"
        );
        Ok(PathBuf::from(filename))
    }
}

/// Strip directory components and characters that are invalid in filenames.
///
/// Falls back to `download` if nothing usable is left.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "download".to_string()
    } else {
        cleaned.to_string()
    }
}
