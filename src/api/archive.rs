//! Unpacking uploaded skill archives.

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::errors::ClawscanError;

pub const MAX_ARCHIVE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_ENTRY_BYTES: u64 = 5 * 1024 * 1024;
pub const MAX_ENTRIES: usize = 2_000;

fn is_unsafe_name(name: &str) -> bool {
    name.starts_with('/')
        || name.starts_with('\\')
        || name.contains("..")
        || name.contains(':')
}

/// Extracts a zip archive into `dest`, rejecting absolute or parent-relative
/// entry names and oversized entries before anything is written.
pub fn extract_zip(bytes: &[u8], dest: &Path) -> Result<usize, ClawscanError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    if archive.len() > MAX_ENTRIES {
        return Err(ClawscanError::Archive(format!(
            "Archive has {} entries, limit is {}",
            archive.len(),
            MAX_ENTRIES
        )));
    }

    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if is_unsafe_name(entry.name()) || entry.enclosed_name().is_none() {
            return Err(ClawscanError::Archive("Archive contains unsafe paths".into()));
        }
        if entry.size() > MAX_ENTRY_BYTES {
            return Err(ClawscanError::Archive(format!("Archive entry too large: {}", entry.name())));
        }
    }

    fs::create_dir_all(dest)?;
    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            return Err(ClawscanError::Archive("Archive contains unsafe paths".into()));
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)?;
        // Declared sizes can lie; cap what is actually inflated.
        let copied = io::copy(&mut (&mut entry).take(MAX_ENTRY_BYTES + 1), &mut out)?;
        if copied > MAX_ENTRY_BYTES {
            return Err(ClawscanError::Archive(format!("Archive entry too large: {}", entry.name())));
        }
        written += 1;
    }
    Ok(written)
}

/// Archives usually wrap the skill in one top-level folder. Returns that
/// folder when it is the only thing in `dir`.
pub fn skill_root(dir: &Path) -> Result<PathBuf, ClawscanError> {
    let entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    match entries.as_slice() {
        [only] if only.file_type()?.is_dir() => Ok(only.path()),
        _ => Ok(dir.to_path_buf()),
    }
}
