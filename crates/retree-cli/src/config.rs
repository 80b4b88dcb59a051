//! Configuration loading for the CLI.
//!
//! Configuration flags lead the command line and are handed to
//! `ortho_config`; everything from the first other token onwards is parsed by
//! clap.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use retree_config::Config;

use crate::errors::AppError;

/// Flags owned by the configuration loader. Keep in sync with the fields of
/// [`Config`].
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &["--log-filter", "--log-format", "--scratch-dir"];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the leading configuration flags.
    ///
    /// Flags that appear after the subcommand are not configuration flags
    /// and reach clap instead.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Leading configuration arguments, prefixed with the program name, and the
/// remaining command arguments, also prefixed with the program name.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ArgumentSplit {
    pub(crate) config: Vec<OsString>,
    pub(crate) command: Vec<OsString>,
}

pub(crate) fn split_arguments(args: &[OsString]) -> ArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ArgumentSplit::default();
    };
    let mut config = vec![program.clone()];
    let mut remaining = rest.iter();
    let mut command_start = 0;

    while let Some(argument) = remaining.next() {
        match classify(argument) {
            FlagAction::Include { needs_value } => {
                config.push(argument.clone());
                command_start += 1;
                if needs_value && let Some(value) = remaining.next() {
                    config.push(value.clone());
                    command_start += 1;
                }
            }
            FlagAction::Stop => break,
        }
    }

    let mut command = vec![program.clone()];
    command.extend(rest.iter().skip(command_start).cloned());
    ArgumentSplit { config, command }
}
