//! The rule engine.
//!
//! An [`Engine`] owns one run over one root. [`Engine::run`] walks the state
//! machine
//!
//! ```text
//! Init -> Staged -> Applying -> FullDiff -> Committed | Discarded
//! ```
//!
//! and drops into [`EngineState::Failed`] on the first fatal error. Rules are
//! validated before anything is staged, applied strictly in order, and each
//! is dispatched through the [`ActionRegistry`]. Handlers interact with the
//! run through the recording methods on [`Engine`], so every warning, name
//! change, diff and command is attributed to the rule being applied.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use retree_config::Config;
use retree_stage::{REQUIRED_TOOLS, ShellCommand, Stager, ensure_tools, normalise};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::audit;
use crate::error::EngineError;
use crate::exclusion::{self, Exclusion};
use crate::registry::{ActionHandler, ActionRegistry};
use crate::report::{ExecutedCommand, Mode, NameChange, RuleResult, RunReport, Warning};
use crate::rule::{ExcludeEntry, Rule, RuleInput};

/// Tracing target for engine lifecycle and rule events.
const ENGINE_TARGET: &str = "retree::engine";

/// Position of an engine in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Built, not yet run.
    Init,
    /// Working copy created.
    Staged,
    /// Rules being applied.
    Applying,
    /// Capturing the full-run diff.
    FullDiff,
    /// Working copy promoted over the root.
    Committed,
    /// Staging directories deleted.
    Discarded,
    /// A fatal error stopped the run.
    Failed,
}

/// Applies an ordered rule list to a directory tree, transactionally.
#[derive(Debug)]
pub struct Engine {
    rules: Vec<Value>,
    registry: ActionRegistry,
    stager: Stager,
    required_tools: Vec<String>,
    state: EngineState,
    excludes: Vec<Exclusion>,
    report: RunReport,
}

impl Engine {
    /// Builds an engine with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Syntax`] or [`EngineError::Validation`] for a
    /// malformed rule list, and [`EngineError::Scratch`] when the root has no
    /// parent directory to stage in.
    pub fn new(root: impl AsRef<Path>, rules: impl Into<RuleInput>) -> Result<Self, EngineError> {
        Self::with_config(root, rules, &Config::default())
    }

    /// Builds an engine whose working copy lives in the configured scratch
    /// directory.
    ///
    /// # Errors
    ///
    /// As for [`Engine::new`], plus [`EngineError::Root`] when the root cannot
    /// be made absolute.
    pub fn with_config(
        root: impl AsRef<Path>,
        rules: impl Into<RuleInput>,
        config: &Config,
    ) -> Result<Self, EngineError> {
        let parsed = rules.into().into_rules()?;
        let root_path = absolute_root(root.as_ref())?;
        let scratch = config.scratch_dir_for(&root_path)?;
        Ok(Self::from_parts(Stager::new(root_path, scratch), parsed))
    }

    /// Builds an engine around an existing, idle stager.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Syntax`] or [`EngineError::Validation`] for a
    /// malformed rule list.
    pub fn with_stager(stager: Stager, rules: impl Into<RuleInput>) -> Result<Self, EngineError> {
        Ok(Self::from_parts(stager, rules.into().into_rules()?))
    }

    fn from_parts(stager: Stager, rules: Vec<Value>) -> Self {
        Self {
            rules,
            registry: ActionRegistry::new(),
            stager,
            required_tools: REQUIRED_TOOLS.iter().copied().map(str::to_owned).collect(),
            state: EngineState::Init,
            excludes: Vec::new(),
            report: RunReport::default(),
        }
    }

    /// Registers `handler` for `name`, returning any handler it replaced.
    pub fn set_action(&mut self, name: impl Into<String>, handler: ActionHandler) -> Option<ActionHandler> {
        self.registry.set(name, handler)
    }

    /// Looks up the handler for `name`.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<ActionHandler> {
        self.registry.get(name)
    }

    /// Replaces the tools checked on `PATH` before anything is staged.
    pub fn set_required_tools<I, S>(&mut self, tools: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_tools = tools.into_iter().map(Into::into).collect();
    }

    /// Tools checked on `PATH` before anything is staged.
    #[must_use]
    pub fn required_tools(&self) -> &[String] {
        &self.required_tools
    }

    /// The rules, as supplied.
    #[must_use]
    pub fn rules(&self) -> &[Value] {
        &self.rules
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// The staging area.
    #[must_use]
    pub const fn stager(&self) -> &Stager {
        &self.stager
    }

    /// The staging area, mutably.
    pub const fn stager_mut(&mut self) -> &mut Stager {
        &mut self.stager
    }

    /// Everything recorded so far. After a failed run this is the partial
    /// record up to the failure.
    #[must_use]
    pub const fn report(&self) -> &RunReport {
        &self.report
    }

    /// Global exclusions declared by earlier `exclude` rules.
    #[must_use]
    pub fn excludes(&self) -> &[Exclusion] {
        &self.excludes
    }

    /// Adds a global exclusion, resolved against the current working copy.
    /// Returns false when an identical exclusion was already present.
    pub fn add_exclude(&mut self, entry: ExcludeEntry) -> bool {
        let resolved = Exclusion::resolve(entry, &self.stager);
        exclusion::merge(&mut self.excludes, resolved)
    }

    /// Runs the engine to completion in `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyRun`] on a second call. Any other error
    /// is fatal: the engine moves to [`EngineState::Failed`] and staging
    /// directories may be left on disk. Missing tools, a missing root and, for
    /// [`Mode::Transform`], an occupied `<root>.bak` are reported before
    /// anything is staged.
    pub fn run(&mut self, mode: Mode) -> Result<RunReport, EngineError> {
        if self.state != EngineState::Init {
            return Err(EngineError::AlreadyRun);
        }
        self.report.mode = mode;
        match self.drive(mode) {
            Ok(()) => {
                info!(
                    target: ENGINE_TARGET,
                    %mode,
                    root = %self.stager.root().display(),
                    rules = self.report.results.len(),
                    warnings = self.report.warnings.len(),
                    commands = self.report.commands.len(),
                    "run complete"
                );
                Ok(self.report.clone())
            }
            Err(failure) => {
                self.transition(EngineState::Failed);
                error!(
                    target: ENGINE_TARGET,
                    %mode,
                    error = %failure,
                    working = ?self.stager.working(),
                    "run failed"
                );
                Err(failure)
            }
        }
    }

    fn drive(&mut self, mode: Mode) -> Result<(), EngineError> {
        self.validate()?;
        ensure_tools(self.required_tools.as_slice())?;
        if !self.stager.root().is_dir() {
            return Err(EngineError::validation(format!(
                "root {} is not a directory",
                self.stager.root().display()
            )));
        }
        if mode == Mode::Transform {
            self.stager.ensure_backup_free()?;
        }

        self.stager.create_working_copy()?;
        self.transition(EngineState::Staged);

        self.transition(EngineState::Applying);
        let rules = self.rules.clone();
        for rule in &rules {
            self.apply_rule(rule)?;
        }

        self.transition(EngineState::FullDiff);
        self.report.full_diff = audit::full_diff(&self.stager)?;

        match mode {
            Mode::Transform => {
                self.stager.commit()?;
                self.transition(EngineState::Committed);
            }
            Mode::Dry => {
                self.stager.discard()?;
                self.transition(EngineState::Discarded);
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), EngineError> {
        for value in &self.rules {
            let rule = Rule::from_value(value)?;
            if self.registry.get(&rule.action).is_none() {
                return Err(EngineError::HandlerNotFound { action: rule.action });
            }
        }
        Ok(())
    }

    fn transition(&mut self, next: EngineState) {
        debug!(target: ENGINE_TARGET, from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }

    /// Applies one rule to the working copy.
    ///
    /// A fresh [`RuleResult`] is opened for the rule before its handler runs.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotStaged`] before the working copy exists,
    /// [`EngineError::Validation`] for a malformed rule,
    /// [`EngineError::HandlerNotFound`] for an unregistered action, and any
    /// error the handler returns.
    pub fn apply_rule(&mut self, value: &Value) -> Result<(), EngineError> {
        if self.stager.working().is_none() {
            return Err(EngineError::NotStaged);
        }
        let rule = Rule::from_value(value)?;
        let handler = self
            .registry
            .get(&rule.action)
            .ok_or_else(|| EngineError::HandlerNotFound {
                action: rule.action.clone(),
            })?;

        let rule_index = self.report.results.len();
        debug!(target: ENGINE_TARGET, rule_index, action = %rule.action, "applying rule");
        self.report.results.push(RuleResult::new(value.clone()));
        handler(self, &rule)
    }

    fn rule_index(&self) -> usize {
        self.report.results.len().saturating_sub(1)
    }

    fn current_rule(&self) -> Value {
        self.report
            .results
            .last()
            .map_or(Value::Null, |result| result.rule.clone())
    }

    /// Records a warning against the rule being applied.
    pub fn warn(&mut self, subject: Value, message: &str) {
        let rule_index = self.rule_index();
        warn!(target: ENGINE_TARGET, rule_index, %subject, warning = message, "rule warning");
        let warning = Warning {
            rule_index,
            subject,
            message: message.to_owned(),
        };
        if let Some(result) = self.report.results.last_mut() {
            result.warnings.push(warning.clone());
        }
        self.report.warnings.push(warning);
    }

    /// Records a path created by the rule being applied.
    pub fn record_name_change(&mut self, from: PathBuf, to: PathBuf) {
        let change = NameChange { from, to };
        if let Some(result) = self.report.results.last_mut() {
            result.name_changes.push(change.clone());
        }
        self.report.name_changes.push(change);
    }

    /// Runs a file operation in the staging area and records its replay form.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Stage`] when the operation fails.
    pub fn execute(&mut self, command: &ShellCommand) -> Result<(), EngineError> {
        let replay = self.stager.execute(command)?;
        self.record_command(command.program(), replay);
        Ok(())
    }

    /// Records a replay command for the rule being applied without running
    /// anything.
    pub fn record_command(&mut self, program: &str, command: String) {
        let rule_index = self.rule_index();
        debug!(target: ENGINE_TARGET, rule_index, program, %command, "recorded command");
        self.report.commands.push(ExecutedCommand {
            rule_index,
            rule: self.current_rule(),
            program: program.to_owned(),
            command,
        });
    }

    /// Records per-file diffs for the rule being applied and appends them to
    /// the audit log.
    pub fn record_diffs(&mut self, diffs: BTreeMap<String, String>) {
        for (path, diff) in diffs {
            self.report.audit.record(path.clone(), diff.clone());
            if let Some(result) = self.report.results.last_mut() {
                result.diffs.insert(path, diff);
            }
        }
    }
}

fn absolute_root(root: &Path) -> Result<PathBuf, EngineError> {
    let absolute = std::path::absolute(root).map_err(|source| EngineError::Root {
        path: root.to_path_buf(),
        source: Arc::new(source),
    })?;
    // Derived sibling paths such as `<root>.bak` must land next to the root.
    Ok(normalise(&absolute))
}
