//! Core library for pybump.
//!
//! This crate provides the version model and file handling used by the
//! `pybump` CLI and any downstream consumers.
//!
//! # Modules
//!
//! - [`bump`] - Bump planning and execution
//! - [`config`] - Configuration loading and management
//! - [`error`] - Configuration error types and result aliases
//! - [`files`] - Locating and rewriting version files
//! - [`version`] - Version parsing, bump arithmetic, assignment matching
//!
//! # Quick Start
//!
//! ```no_run
//! use camino::Utf8Path;
//! use pybump_core::{ConfigLoader, bump, version::BumpLevel};
//!
//! let root = Utf8Path::new(".");
//! let config = ConfigLoader::new().with_project_search(root).load()?;
//! let plan = bump::plan_bump(root, &config.files, BumpLevel::Patch)?;
//! let outcome = plan.execute(root)?;
//! println!("v{}", outcome.new);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![deny(unsafe_code)]

pub mod bump;

pub mod config;

pub mod error;

pub mod files;

pub mod version;

pub use config::{Config, ConfigLoader, FilesConfig, LogLevel};

pub use error::{ConfigError, ConfigResult};

// Re-export semver so downstream crates don't need a direct dependency.
pub use semver;
