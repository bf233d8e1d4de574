//! Locating and rewriting `version = "X.Y.Z"` assignments in text.
//!
//! Matching is textual, not TOML- or Python-aware: the first assignment of
//! the right shape wins, and a rewrite touches only the numeric triple so
//! every other byte of the file survives.

use std::ops::Range;
use std::sync::LazyLock;

use regex_lite::Regex;
use semver::Version;

use super::{VersionResult, parse_version};

static PROJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(version\s*=\s*["'])(\d+\.\d+\.\d+)(["'])"#).expect("valid project version regex")
});

static MODULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(__version__\s*=\s*["'])(\d+\.\d+\.\d+)(["'])"#)
        .expect("valid module version regex")
});

/// Which assignment shape to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentKind {
    /// `version = "X.Y.Z"`, as found in project metadata files.
    Project,
    /// `__version__ = "X.Y.Z"`, as found in package initializer modules.
    Module,
}

impl AssignmentKind {
    fn regex(self) -> &'static Regex {
        match self {
            Self::Project => &PROJECT_RE,
            Self::Module => &MODULE_RE,
        }
    }
}

/// A located version assignment inside some file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionAssignment {
    /// Byte range of the `X.Y.Z` text within the content.
    pub range: Range<usize>,
    /// The `X.Y.Z` text as written.
    pub text: String,
}

impl VersionAssignment {
    /// Find the first assignment of `kind` in `content`.
    pub fn find(content: &str, kind: AssignmentKind) -> Option<Self> {
        let number = kind.regex().captures(content)?.get(2)?;

        Some(Self {
            range: number.range(),
            text: number.as_str().to_owned(),
        })
    }

    /// Parse the matched text.
    pub fn version(&self) -> VersionResult<Version> {
        parse_version(&self.text)
    }

    /// Return `content` with the matched triple replaced by `new`.
    ///
    /// `content` must be the text this assignment was found in.
    pub fn apply(&self, content: &str, new: &Version) -> String {
        let replacement = format!("{}.{}.{}", new.major, new.minor, new.patch);
        let mut out = String::with_capacity(content.len() + replacement.len());
        out.push_str(&content[..self.range.start]);
        out.push_str(&replacement);
        out.push_str(&content[self.range.end..]);
        out
    }
}
