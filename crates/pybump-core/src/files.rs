//! Locating, reading and rewriting the files that carry the version.

use std::io::{self, ErrorKind, Write};

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::version::assignment::{AssignmentKind, VersionAssignment};

/// A file whose version assignment has been located but not yet rewritten.
#[derive(Debug, Clone)]
pub struct PlannedEdit {
    /// Path of the file.
    pub path: Utf8PathBuf,
    /// Content as read during planning.
    pub content: String,
    /// The assignment to rewrite.
    pub assignment: VersionAssignment,
}

impl PlannedEdit {
    /// Locate an assignment of `kind` in `content`.
    pub fn locate(path: Utf8PathBuf, content: String, kind: AssignmentKind) -> Option<Self> {
        let assignment = VersionAssignment::find(&content, kind)?;
        Some(Self {
            path,
            content,
            assignment,
        })
    }

    /// The content with the version replaced.
    pub fn rendered(&self, new: &semver::Version) -> String {
        self.assignment.apply(&self.content, new)
    }
}

/// Find the first `<subdir>/<file_name>` under `root` that holds a
/// `__version__` assignment.
///
/// Only immediate subdirectories are scanned, in sorted order. Hidden
/// directories are candidates like any other. Unreadable candidates are
/// passed over.
pub fn find_secondary(root: &Utf8Path, file_name: &str) -> Option<PlannedEdit> {
    let entries = match root.read_dir_utf8() {
        Ok(entries) => entries,
        Err(err) => {
            debug!(%root, error = %err, "cannot list project root, skipping secondary file");
            return None;
        }
    };

    let mut dirs: Vec<Utf8PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    dirs.into_iter()
        .map(|dir| dir.join(file_name))
        .filter(|candidate| candidate.is_file())
        .find_map(|candidate| {
            let content = match std::fs::read_to_string(&candidate) {
                Ok(content) => content,
                Err(err) => {
                    debug!(path = %candidate, error = %err, "skipping unreadable candidate");
                    return None;
                }
            };
            let edit = PlannedEdit::locate(candidate, content, AssignmentKind::Module);
            if edit.is_none() {
                debug!("candidate has no __version__ assignment");
            }
            edit
        })
}

/// Replace the file behind `path` with `content` via a temporary file in the
/// same directory.
///
/// Symlinks are followed, so the link stays in place and its target is
/// rewritten. A file marked read-only is refused. The original file's
/// permissions are carried over.
pub fn write_atomic(path: &Utf8Path, content: &str) -> io::Result<()> {
    let target = match path.canonicalize_utf8() {
        Ok(resolved) => resolved,
        Err(err) if err.kind() == ErrorKind::NotFound => path.to_path_buf(),
        Err(err) => return Err(err),
    };

    let existing = match std::fs::metadata(&target) {
        Ok(meta) => Some(meta),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => return Err(err),
    };
    if existing.as_ref().is_some_and(|meta| meta.permissions().readonly()) {
        return Err(io::Error::new(ErrorKind::PermissionDenied, "file is read-only"));
    }

    let dir = match target.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;

    if let Some(meta) = existing {
        tmp.as_file().set_permissions(meta.permissions())?;
    }

    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}
