//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use retree::Mode;

/// How a run's report is written to stdout.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// `human` on a terminal, `json` otherwise.
    #[default]
    Auto,
    /// A per-rule summary.
    Human,
    /// The full report as JSON.
    Json,
}

/// Output format after resolving `auto`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolvedOutputFormat {
    /// A per-rule summary.
    Human,
    /// The full report as JSON.
    Json,
}

impl OutputFormat {
    /// Resolves `auto` based on whether stdout is a terminal.
    #[must_use]
    pub const fn resolve(self, stdout_is_terminal: bool) -> ResolvedOutputFormat {
        match self {
            Self::Auto if stdout_is_terminal => ResolvedOutputFormat::Human,
            Self::Auto | Self::Json => ResolvedOutputFormat::Json,
            Self::Human => ResolvedOutputFormat::Human,
        }
    }
}

/// Applies declarative rules to a directory tree, transactionally.
#[derive(Parser, Debug)]
#[command(name = "retree", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CliCommand {
    /// Applies the rules and replaces the tree with the result.
    Transform(RunArgs),
    /// Applies the rules to a copy and reports what would change.
    Dry(RunArgs),
}

impl CliCommand {
    pub(crate) const fn mode(&self) -> Mode {
        match self {
            Self::Transform(_) => Mode::Transform,
            Self::Dry(_) => Mode::Dry,
        }
    }

    pub(crate) const fn args(&self) -> &RunArgs {
        match self {
            Self::Transform(args) | Self::Dry(args) => args,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    /// Directory tree to transform.
    #[arg(value_name = "ROOT")]
    pub(crate) root: PathBuf,
    /// JSON file holding the rule list.
    #[arg(value_name = "RULES")]
    pub(crate) rules: PathBuf,
    /// Writes a shell script that replays the run to this path.
    #[arg(long, value_name = "PATH")]
    pub(crate) script: Option<PathBuf>,
    /// Controls how the report is rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Auto)]
    pub(crate) output: OutputFormat,
    /// Includes the full-run diff in human output.
    #[arg(long)]
    pub(crate) diff: bool,
}
