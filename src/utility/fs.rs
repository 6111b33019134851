use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use crate::{error::NotesError, utility::text::decode_text};

pub fn read_text(path: &Path) -> Result<String, NotesError> {
    let bytes = fs::read(path).map_err(|e| NotesError::io(path, e))?;
    decode_text(&bytes).map_err(|e| NotesError::format(path, e))
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".orig");
    PathBuf::from(name)
}

/// Writes `contents` to `path`, first renaming an existing file to `<path>.orig`.
///
/// An existing `.orig` is never replaced, so it always holds the oldest
/// version; in that case the current file is simply overwritten.
/// Returns `true` when a backup was made.
pub fn backup_and_write(path: &Path, contents: &str) -> Result<bool, NotesError> {
    let backup = backup_path(path);

    let backed_up = if path.is_file() && !backup.exists() {
        fs::rename(path, &backup).map_err(|e| NotesError::io(path, e))?;
        true
    } else {
        false
    };

    write_text(path, contents)?;

    Ok(backed_up)
}

pub fn write_text(path: &Path, contents: &str) -> Result<(), NotesError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| NotesError::io(parent, e))?;
        }
    }
    fs::write(path, contents).map_err(|e| NotesError::io(path, e))
}

/// Files under `root` (or `root` itself) accepted by `accept`, hidden entries skipped,
/// in sorted order.
pub fn collect_files(root: &Path, accept: &dyn Fn(&Path) -> bool) -> Result<Vec<PathBuf>, NotesError> {
    let mut files = Vec::new();

    if root.is_file() {
        files.push(root.to_path_buf());
        return Ok(files);
    }

    let mut entries = fs::read_dir(root)
        .map_err(|e| NotesError::io(root, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| NotesError::io(root, e))?;
    entries.sort();

    for path in entries {
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.starts_with('.'));
        if hidden {
            continue;
        }

        if path.is_dir() {
            files.extend(collect_files(&path, accept)?);
        } else if accept(&path) {
            files.push(path);
        }
    }

    Ok(files)
}

pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| {
            extensions
                .iter()
                .any(|expected| e.eq_ignore_ascii_case(expected))
        })
}
