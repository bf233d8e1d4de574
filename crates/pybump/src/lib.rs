//! Library interface for the `pybump` CLI.
//!
//! This crate exposes the CLI's argument parser as a library, primarily for
//! documentation generation and testing. The actual entry point is in
//! `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`commands`] - Command implementations
//!
//! # Documentation Generation
//!
//! The [`command()`] function returns the clap `Command` for generating man pages
//! and shell completions via `xtask`.

pub mod commands;

use clap::{CommandFactory, Parser};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const AFTER_HELP: &str = "\
FILES:
    pyproject.toml          Must contain version = \"X.Y.Z\" (single or double quotes)
    */__init__.py           First one with __version__ = \"X.Y.Z\" is kept in sync

ENVIRONMENT VARIABLES:
    RUST_LOG                Log filter (e.g., debug, pybump=trace)
    PYBUMP_LOG_PATH         Explicit log file path
    PYBUMP_LOG_DIR          Log directory
";

/// Command-line interface definition for pybump.
#[derive(Parser, Debug)]
#[command(name = "pybump")]
#[command(about = "Bump the semantic version in pyproject.toml", long_about = None)]
#[command(version)]
#[command(after_long_help = AFTER_HELP)]
pub struct Cli {
    /// What to bump.
    #[command(flatten)]
    pub bump: commands::bump::BumpArgs,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long)]
    pub chdir: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// More log detail (repeatable; e.g. -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize diagnostics
    #[arg(long, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output the result as JSON (for scripting)
    #[arg(long)]
    pub json: bool,
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pybump_core::version::BumpLevel;

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn parses_level() {
        let cli = Cli::try_parse_from(["pybump", "minor"]).unwrap();
        assert_eq!(cli.bump.level, BumpLevel::Minor);
        assert!(!cli.bump.dry_run);
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(Cli::try_parse_from(["pybump", "release"]).is_err());
        assert!(Cli::try_parse_from(["pybump", "Patch"]).is_err());
    }

    #[test]
    fn requires_exactly_one_level() {
        assert!(Cli::try_parse_from(["pybump"]).is_err());
        assert!(Cli::try_parse_from(["pybump", "patch", "minor"]).is_err());
    }

    #[test]
    fn flags_combine_with_level() {
        let cli = Cli::try_parse_from(["pybump", "-n", "--json", "-vv", "-C", "/tmp", "major"])
            .unwrap();
        assert_eq!(cli.bump.level, BumpLevel::Major);
        assert!(cli.bump.dry_run);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.chdir.as_deref(), Some(std::path::Path::new("/tmp")));
    }
}
