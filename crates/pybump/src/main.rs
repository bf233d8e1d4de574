//! pybump CLI
#![deny(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use owo_colors::{OwoColorize, Stream};
use pybump::{Cli, commands};
use pybump_core::config::ConfigLoader;
use tracing::debug;

mod observability;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also arrive here, on stdout.
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!(
                "{} {err:#}",
                "error:".if_supports_color(Stream::Stderr, |t| t.style(owo_colors::Style::new().red().bold()))
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    cli.color.apply();

    if let Some(ref dir) = cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = camino::Utf8PathBuf::try_from(cwd).map_err(|e| {
        anyhow::anyhow!(
            "current directory is not valid UTF-8: {}",
            e.into_path_buf().display()
        )
    })?;

    let mut loader = ConfigLoader::new().with_project_search(&cwd);
    if let Some(ref config_path) = cli.config {
        let config_path = camino::Utf8PathBuf::try_from(config_path.clone()).map_err(|e| {
            anyhow::anyhow!(
                "config path is not valid UTF-8: {}",
                e.into_path_buf().display()
            )
        })?;
        loader = loader.with_file(&config_path);
    }
    let config = loader.load().context("failed to load configuration")?;

    let env_filter = observability::env_filter(cli.quiet, cli.verbose, config.log_level.as_str());
    let _guard = observability::init_observability(
        config.log_dir.as_ref().map(|dir| dir.as_std_path()),
        env_filter,
    );

    debug!(
        level = %cli.bump.level,
        dry_run = cli.bump.dry_run,
        json = cli.json,
        verbose = cli.verbose,
        chdir = ?cli.chdir,
        "CLI initialized"
    );

    let result = commands::bump::cmd_bump(&cli.bump, cli.json, &config, &cwd);
    if let Err(ref err) = result {
        let message = format!("{err:#}");
        tracing::error!(error = %message, "fatal error");
    }
    result
}
