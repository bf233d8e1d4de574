//! Version bump planning and execution.
//!
//! All orchestration logic lives here. The CLI is purely a display layer.
//!
//! # Two-phase workflow
//!
//! 1. **Plan** ([`plan_bump`]): locate the primary file, read its version,
//!    compute the next one and look for a secondary file to keep in sync.
//!    Nothing is written, so every validation failure leaves the project
//!    untouched.
//! 2. **Execute** ([`ReadyBump::execute`]): rewrite the primary file, then
//!    the secondary file if one was found.
//!
//! The two writes are not transactional: if the second one fails, the first
//! stays applied.

use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::FilesConfig;
use crate::files::{self, PlannedEdit};
use crate::version::assignment::AssignmentKind;
use crate::version::{self, BumpLevel};

/// Errors from bump operations.
#[derive(Error, Debug)]
pub enum BumpError {
    /// The primary metadata file does not exist.
    #[error("{0} not found")]
    PrimaryNotFound(Utf8PathBuf),

    /// The primary file has no `version = "X.Y.Z"` assignment.
    #[error("could not find version in {0}")]
    PatternNotFound(Utf8PathBuf),

    /// The located version could not be parsed or bumped.
    #[error(transparent)]
    Version(#[from] version::VersionError),

    /// Reading or writing a file failed.
    #[error("{action} {path}")]
    Io {
        /// What was being attempted ("failed to read", "failed to write").
        action: &'static str,
        /// File involved.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for bump operations.
pub type BumpResult<T> = Result<T, BumpError>;

/// A bump plan that is ready to execute.
#[derive(Debug, Clone)]
pub struct ReadyBump {
    /// The version found in the primary file.
    pub previous: Version,
    /// The computed next version.
    pub next: Version,
    /// The requested level.
    pub level: BumpLevel,
    /// The primary file edit.
    pub primary: PlannedEdit,
    /// The secondary file edit, if a candidate was found.
    pub secondary: Option<PlannedEdit>,
}

/// Result of a bump (or a preview of one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BumpOutcome {
    /// The previous version.
    pub previous: Version,
    /// The new version.
    pub new: Version,
    /// Files that were (or would be) modified, relative to the project root.
    pub modified_files: Vec<String>,
    /// Whether this outcome was produced without writing anything.
    pub dry_run: bool,
}

/// Plan a version bump without touching the filesystem.
///
/// # Errors
///
/// - [`BumpError::PrimaryNotFound`] if `settings.primary` is missing from `project_root`
/// - [`BumpError::PatternNotFound`] if it holds no version assignment
/// - [`BumpError::Version`] if the version cannot be bumped
/// - [`BumpError::Io`] if the primary file cannot be read
#[instrument(skip(settings), fields(%project_root, primary = %settings.primary))]
pub fn plan_bump(
    project_root: &Utf8Path,
    settings: &FilesConfig,
    level: BumpLevel,
) -> BumpResult<ReadyBump> {
    let primary_path = project_root.join(&settings.primary);
    if !primary_path.is_file() {
        return Err(BumpError::PrimaryNotFound(Utf8PathBuf::from(&settings.primary)));
    }

    let content = std::fs::read_to_string(&primary_path).map_err(|source| BumpError::Io {
        action: "failed to read",
        path: primary_path.clone(),
        source,
    })?;

    let primary = PlannedEdit::locate(primary_path, content, AssignmentKind::Project)
        .ok_or_else(|| BumpError::PatternNotFound(Utf8PathBuf::from(&settings.primary)))?;

    let previous = primary.assignment.version()?;
    let next = version::next_version(&previous, level)?;
    debug!(%previous, %next, %level, "computed next version");

    let secondary = files::find_secondary(project_root, &settings.secondary);
    match secondary {
        Some(ref edit) => debug!(path = %edit.path, "found secondary version file"),
        None => debug!("no secondary version file"),
    }

    Ok(ReadyBump {
        previous,
        next,
        level,
        primary,
        secondary,
    })
}

impl ReadyBump {
    /// Rewrite the primary file, then the secondary one if planned.
    #[instrument(skip(self), fields(previous = %self.previous, next = %self.next))]
    pub fn execute(&self, project_root: &Utf8Path) -> BumpResult<BumpOutcome> {
        for edit in self.edits() {
            let updated = edit.rendered(&self.next);
            files::write_atomic(&edit.path, &updated).map_err(|source| BumpError::Io {
                action: "failed to write",
                path: edit.path.clone(),
                source,
            })?;
            debug!(path = %edit.path, "updated version");
        }

        let outcome = self.outcome(project_root, false);
        info!(
            level = %self.level,
            previous = %outcome.previous,
            new = %outcome.new,
            files = outcome.modified_files.len(),
            "bump complete"
        );
        Ok(outcome)
    }

    /// The outcome [`execute`](Self::execute) would produce, without writing.
    pub fn preview(&self, project_root: &Utf8Path) -> BumpOutcome {
        self.outcome(project_root, true)
    }

    fn edits(&self) -> impl Iterator<Item = &PlannedEdit> {
        std::iter::once(&self.primary).chain(self.secondary.as_ref())
    }

    fn outcome(&self, project_root: &Utf8Path, dry_run: bool) -> BumpOutcome {
        let modified_files = self
            .edits()
            .map(|edit| {
                edit.path
                    .strip_prefix(project_root)
                    .unwrap_or(edit.path.as_path())
                    .to_string()
            })
            .collect();

        BumpOutcome {
            previous: self.previous.clone(),
            new: self.next.clone(),
            modified_files,
            dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8_tmp(tmp: &TempDir) -> &Utf8Path {
        Utf8Path::from_path(tmp.path()).expect("tempdir is UTF-8")
    }

    fn project(pyproject: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("pyproject.toml"), pyproject).unwrap();
        tmp
    }

    fn read(tmp: &TempDir, rel: &str) -> String {
        fs::read_to_string(tmp.path().join(rel)).unwrap()
    }

    #[test]
    fn plan_reads_current_and_next() {
        let tmp = project("[project]\nname = \"demo\"\nversion = \"1.2.3\"\n");
        let plan = plan_bump(utf8_tmp(&tmp), &FilesConfig::default(), BumpLevel::Patch).unwrap();

        assert_eq!(plan.previous, Version::new(1, 2, 3));
        assert_eq!(plan.next, Version::new(1, 2, 4));
        assert!(plan.secondary.is_none());
    }

    #[test]
    fn missing_primary_is_reported() {
        let tmp = TempDir::new().unwrap();
        let err = plan_bump(utf8_tmp(&tmp), &FilesConfig::default(), BumpLevel::Patch)
            .unwrap_err();

        assert!(matches!(err, BumpError::PrimaryNotFound(_)));
        assert_eq!(err.to_string(), "pyproject.toml not found");
    }

    #[test]
    fn missing_pattern_is_reported() {
        let tmp = project("[project]\nname = \"demo\"\n");
        let err = plan_bump(utf8_tmp(&tmp), &FilesConfig::default(), BumpLevel::Minor)
            .unwrap_err();

        assert!(matches!(err, BumpError::PatternNotFound(_)));
        assert_eq!(err.to_string(), "could not find version in pyproject.toml");
    }

    #[test]
    fn overflowing_version_is_invalid_format() {
        let tmp = project("version = \"1.2.99999999999999999999\"\n");
        let err = plan_bump(utf8_tmp(&tmp), &FilesConfig::default(), BumpLevel::Patch)
            .unwrap_err();

        assert!(matches!(
            err,
            BumpError::Version(version::VersionError::InvalidFormat(_))
        ));
        assert_eq!(read(&tmp, "pyproject.toml"), "version = \"1.2.99999999999999999999\"\n");
    }

    #[test]
    fn execute_rewrites_only_the_version() {
        let original = "[project]\nname = \"demo\"\nversion = \"1.2.3\"\n\n[tool.x]\nkey = 'v'\n";
        let tmp = project(original);
        let root = utf8_tmp(&tmp);

        let outcome = plan_bump(root, &FilesConfig::default(), BumpLevel::Patch)
            .unwrap()
            .execute(root)
            .unwrap();

        assert_eq!(outcome.new, Version::new(1, 2, 4));
        assert_eq!(outcome.modified_files, vec!["pyproject.toml".to_string()]);
        assert!(!outcome.dry_run);
        assert_eq!(
            read(&tmp, "pyproject.toml"),
            original.replace("1.2.3", "1.2.4")
        );
    }

    #[test]
    fn execute_updates_secondary_file() {
        let tmp = project("[project]\nversion = \"1.2.3\"\n");
        fs::create_dir(tmp.path().join("demo")).unwrap();
        fs::write(
            tmp.path().join("demo/__init__.py"),
            "\"\"\"Demo.\"\"\"\n__version__ = \"1.2.3\"\n",
        )
        .unwrap();
        let root = utf8_tmp(&tmp);

        let outcome = plan_bump(root, &FilesConfig::default(), BumpLevel::Patch)
            .unwrap()
            .execute(root)
            .unwrap();

        assert_eq!(outcome.modified_files.len(), 2);
        assert_eq!(read(&tmp, "pyproject.toml"), "[project]\nversion = \"1.2.4\"\n");
        assert_eq!(
            read(&tmp, "demo/__init__.py"),
            "\"\"\"Demo.\"\"\"\n__version__ = \"1.2.4\"\n"
        );
    }

    #[test]
    fn write_failure_is_fatal() {
        let tmp = project("version = \"1.2.3\"\n");
        let root = utf8_tmp(&tmp);
        let plan = plan_bump(root, &FilesConfig::default(), BumpLevel::Patch).unwrap();

        let path = tmp.path().join("pyproject.toml");
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms).unwrap();

        let err = plan.execute(root).unwrap_err();

        assert!(matches!(err, BumpError::Io { action: "failed to write", .. }));
        assert!(err.to_string().starts_with("failed to write "));
        assert_eq!(read(&tmp, "pyproject.toml"), "version = \"1.2.3\"\n");
    }

    #[test]
    fn secondary_takes_new_version_even_when_out_of_sync() {
        let tmp = project("version = \"2.0.0\"\n");
        fs::create_dir(tmp.path().join("pkg")).unwrap();
        fs::write(tmp.path().join("pkg/__init__.py"), "__version__ = '0.0.1'\n").unwrap();
        let root = utf8_tmp(&tmp);

        plan_bump(root, &FilesConfig::default(), BumpLevel::Major)
            .unwrap()
            .execute(root)
            .unwrap();

        assert_eq!(read(&tmp, "pkg/__init__.py"), "__version__ = '3.0.0'\n");
    }

    #[test]
    fn preview_writes_nothing() {
        let tmp = project("version = \"0.9.9\"\n");
        let root = utf8_tmp(&tmp);

        let outcome = plan_bump(root, &FilesConfig::default(), BumpLevel::Minor)
            .unwrap()
            .preview(root);

        assert!(outcome.dry_run);
        assert_eq!(outcome.new, Version::new(0, 10, 0));
        assert_eq!(read(&tmp, "pyproject.toml"), "version = \"0.9.9\"\n");
    }

    #[test]
    fn repeated_bumps_advance() {
        let tmp = project("version = \"1.0.0\"\n");
        let root = utf8_tmp(&tmp);

        for _ in 0..2 {
            plan_bump(root, &FilesConfig::default(), BumpLevel::Patch)
                .unwrap()
                .execute(root)
                .unwrap();
        }

        assert_eq!(read(&tmp, "pyproject.toml"), "version = \"1.0.2\"\n");
    }

    #[test]
    fn custom_primary_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("setup.cfg"), "[metadata]\nversion = 4.5.6\nversion = '4.5.6'\n").unwrap();
        let settings = FilesConfig {
            primary: "setup.cfg".into(),
            ..FilesConfig::default()
        };

        let plan = plan_bump(utf8_tmp(&tmp), &settings, BumpLevel::Minor).unwrap();
        assert_eq!(plan.next, Version::new(4, 6, 0));
    }

    #[test]
    fn outcome_serializes_versions_as_strings() {
        let tmp = project("version = \"1.2.3\"\n");
        let root = utf8_tmp(&tmp);
        let outcome = plan_bump(root, &FilesConfig::default(), BumpLevel::Major)
            .unwrap()
            .preview(root);

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["previous"], "1.2.3");
        assert_eq!(json["new"], "2.0.0");
        assert_eq!(json["modified_files"][0], "pyproject.toml");
        assert_eq!(json["dry_run"], true);
    }
}
