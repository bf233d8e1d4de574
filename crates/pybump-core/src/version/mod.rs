//! Version parsing and bump arithmetic.
//!
//! Versions are plain `major.minor.patch` triples. Anything after the third
//! number (pre-release tags, build metadata) is tolerated when parsing and
//! dropped from the result.

pub mod assignment;

use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from version operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionError {
    /// The text does not start with three dot-separated non-negative integers.
    #[error("invalid version format: {0}")]
    InvalidFormat(String),

    /// The bump level is not one of `major`, `minor` or `patch`.
    #[error("invalid bump type: {0} (expected major, minor or patch)")]
    InvalidLevel(String),
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Semver bump level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    /// Major release (X.0.0).
    Major,
    /// Minor release (x.Y.0).
    Minor,
    /// Patch release (x.y.Z).
    Patch,
}

impl BumpLevel {
    /// All levels, in the order they are listed in usage text.
    pub const ALL: &[Self] = &[Self::Major, Self::Minor, Self::Patch];

    /// The literal accepted on the command line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
        }
    }
}

impl std::fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpLevel {
    type Err = VersionError;

    /// Matches the exact lowercase literals only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| VersionError::InvalidLevel(s.to_owned()))
    }
}

/// Compute the next version by applying a bump level.
///
/// Lower-order components reset to zero. Fails only if the bumped component
/// would overflow `u64`.
pub fn next_version(current: &Version, level: BumpLevel) -> VersionResult<Version> {
    let overflow = || VersionError::InvalidFormat(current.to_string());
    let next = match level {
        BumpLevel::Patch => Version::new(
            current.major,
            current.minor,
            current.patch.checked_add(1).ok_or_else(overflow)?,
        ),
        BumpLevel::Minor => Version::new(
            current.major,
            current.minor.checked_add(1).ok_or_else(overflow)?,
            0,
        ),
        BumpLevel::Major => Version::new(current.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
    };
    Ok(next)
}

/// Parse the leading `X.Y.Z` of a version string.
///
/// Trailing text after the patch number is ignored, so `"1.2.3rc1"` parses
/// as `1.2.3`. Leading zeros are accepted and normalised (`"01.2.3"` is
/// `1.2.3`).
pub fn parse_version(s: &str) -> VersionResult<Version> {
    let invalid = || VersionError::InvalidFormat(s.to_owned());

    let mut rest = s;
    let mut parts = [0u64; 3];
    for (i, part) in parts.iter_mut().enumerate() {
        if i > 0 {
            rest = rest.strip_prefix('.').ok_or_else(invalid)?;
        }
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(invalid());
        }
        *part = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];
    }

    Ok(Version::new(parts[0], parts[1], parts[2]))
}
