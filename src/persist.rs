//! Crash-safe writes for the JSON files the crate owns.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// `path` with `.{suffix}` appended to its file name.
pub(crate) fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

pub(crate) fn temporary_path(path: &Path) -> PathBuf {
    sibling_path(path, "tmp")
}

/// Replace `path` with `contents`.
///
/// The bytes are written and synced to a temporary sibling which is then
/// renamed over `path`, so readers see either the old file or the new one.
/// Missing parent directories are created. On failure the temporary file
/// is removed and `path` is left untouched.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = temporary_path(path);
    let write = || -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    };
    write().inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}
