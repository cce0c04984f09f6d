//! Capability-based filesystem helpers for feature workspaces.
//!
//! Workspaces are plain directories opened once through `cap-std`; every
//! later access is relative to that handle.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use std::io;

/// Open a UTF-8 file path using ambient authority.
///
/// # Errors
/// Returns the underlying I/O error when the file cannot be opened.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Open `path` as a directory handle, creating it and any missing parents.
///
/// # Errors
/// Returns an error when the directory cannot be created or opened, or when
/// `path` names an existing regular file.
pub fn open_workspace_dir(path: &Utf8Path) -> io::Result<fs_utf8::Dir> {
    fs_utf8::Dir::create_ambient_dir_all(path, ambient_authority())?;
    fs_utf8::Dir::open_ambient_dir(path, ambient_authority())
}

/// Read `name` from `dir`, returning `None` when it does not exist.
///
/// # Errors
/// Returns any I/O error other than "not found".
pub fn read_optional(dir: &fs_utf8::Dir, name: &str) -> io::Result<Option<String>> {
    match dir.read_to_string(name) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Replace `name` in `dir` with `contents`.
///
/// The bytes are written to a hidden sibling first and then renamed over the
/// target, so readers never observe a half-written file.
///
/// # Errors
/// Returns the I/O error from writing or renaming.
pub fn replace_file(dir: &fs_utf8::Dir, name: &str, contents: &[u8]) -> io::Result<()> {
    let staging = format!(".{name}.partial");
    dir.write(&staging, contents)?;
    dir.rename(&staging, dir, name)
}

/// Remove `name` from `dir`. Returns whether a file was removed.
///
/// # Errors
/// Returns any I/O error other than "not found".
pub fn remove_if_present(dir: &fs_utf8::Dir, name: &str) -> io::Result<bool> {
    match dir.remove_file(name) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}
