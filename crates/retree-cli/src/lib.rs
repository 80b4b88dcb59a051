//! Command-line runtime for retree.
//!
//! `retree [CONFIG FLAGS] (transform | dry) ROOT RULES [--script PATH]
//! [--output auto|human|json] [--diff]`
//!
//! Leading configuration flags are layered by `ortho_config` together with
//! `RETREE_*` environment variables; the remaining arguments are parsed by
//! clap. The rule file is read as JSON text and handed to the engine. Exit
//! status is 0 when the run completes (warnings included), 1 when it fails
//! and 2 for usage or configuration problems.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use retree::{Engine, Mode, RunReport, render_script};
use retree_config::Config;
use tracing::{error, info};

mod cli;
mod config;
mod errors;
mod output;
pub mod telemetry;

pub use cli::{OutputFormat, ResolvedOutputFormat};
use cli::{Cli, RunArgs};
use config::{ConfigLoader, OrthoConfigLoader, split_arguments};
use errors::AppError;
use output::write_report;

const CLI_TARGET: &str = "retree::cli";

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
    stdout_is_terminal: bool,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) const fn new(stdout: &'a mut W, stderr: &'a mut E, stdout_is_terminal: bool) -> Self {
        Self {
            stdout,
            stderr,
            stdout_is_terminal,
        }
    }
}

struct CliRunner<'a, 'io, W: Write, E: Write, L: ConfigLoader> {
    io: &'a mut IoStreams<'io, W, E>,
    loader: &'a L,
}

impl<W, E, L> CliRunner<'_, '_, W, E, L>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    fn run<I>(&mut self, raw: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = raw.into_iter().collect();
        let split = split_arguments(&args);

        match Cli::try_parse_from(split.command.iter().cloned()) {
            Ok(cli) => match self.execute(&cli, &split.config) {
                Ok(()) => ExitCode::SUCCESS,
                Err(failure) => self.fail(&failure),
            },
            Err(usage) if !usage.use_stderr() => self.show(&usage),
            Err(usage) => self.fail(&AppError::CliUsage(usage)),
        }
    }

    fn execute(&mut self, cli: &Cli, config_arguments: &[OsString]) -> Result<(), AppError> {
        let config = self.loader.load(config_arguments)?;
        telemetry::initialise(&config)?;

        let mode = cli.command.mode();
        let args = cli.command.args();
        let report = run_engine(args, mode, &config)?;
        if let Some(path) = &args.script {
            fs::write(path, render_script(&report.commands)).map_err(|source| {
                AppError::WriteScript {
                    path: path.clone(),
                    source,
                }
            })?;
            info!(target: CLI_TARGET, script = %path.display(), "wrote replay script");
        }

        let format = args.output.resolve(self.io.stdout_is_terminal);
        write_report(self.io.stdout, &report, format, args.diff)
    }

    /// Help and version requests go to stdout and succeed.
    fn show(&mut self, message: &clap::Error) -> ExitCode {
        match write!(self.io.stdout, "{message}") {
            Ok(()) => ExitCode::SUCCESS,
            Err(source) => self.fail(&AppError::EmitReport(source)),
        }
    }

    fn fail(&mut self, failure: &AppError) -> ExitCode {
        if let Err(write_error) = writeln!(self.io.stderr, "retree: {failure}") {
            error!(target: CLI_TARGET, error = %write_error, "failed to report error");
        }
        failure.exit_code()
    }
}

fn run_engine(args: &RunArgs, mode: Mode, config: &Config) -> Result<RunReport, AppError> {
    let rules = fs::read_to_string(&args.rules).map_err(|source| AppError::ReadRules {
        path: args.rules.clone(),
        source,
    })?;
    let mut engine = Engine::with_config(&args.root, rules, config)?;
    engine.run(mode).map_err(AppError::from)
}

/// Runs the CLI with the given arguments and streams.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E, stdout_is_terminal: bool) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr, stdout_is_terminal);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(args: I, io: &mut IoStreams<'_, W, E>, loader: &L) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner { io, loader }.run(args)
}

#[cfg(test)]
mod tests;
