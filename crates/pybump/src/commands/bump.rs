//! Bump command: thin CLI layer over `pybump_core::bump`.

use camino::Utf8Path;
use clap::Args;
use owo_colors::{OwoColorize, Stream};
use tracing::{debug, instrument};

use pybump_core::bump::{self, BumpOutcome};
use pybump_core::config::Config;
use pybump_core::version::BumpLevel;

/// Arguments for the bump itself.
#[derive(Args, Debug)]
pub struct BumpArgs {
    /// Which component to bump
    #[arg(value_enum, value_name = "LEVEL")]
    pub level: BumpLevel,

    /// Show the next version without changing any file
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Execute the bump and print the result.
///
/// Prints `v<version>` (or the outcome as JSON) on stdout and nothing else.
#[instrument(name = "cmd_bump", skip_all, fields(level = %args.level, dry_run = args.dry_run))]
pub fn cmd_bump(
    args: &BumpArgs,
    json: bool,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(json, "executing bump command");

    let ready = bump::plan_bump(cwd, &config.files, args.level)?;

    let outcome = if args.dry_run {
        ready.preview(cwd)
    } else {
        ready.execute(cwd)?
    };

    render(&outcome, json)?;

    if outcome.dry_run && !json {
        eprintln!(
            "{}",
            "dry run: no files changed".if_supports_color(Stream::Stderr, |t| t.yellow())
        );
    }

    Ok(())
}

fn render(outcome: &BumpOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("v{}", outcome.new);
    }
    Ok(())
}
