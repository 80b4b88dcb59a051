//! Action registry mapping rule actions to handlers.
//!
//! The [`ActionRegistry`] starts out with the built-in `copy`, `rename`,
//! `replace` and `exclude` handlers. Registering a name again replaces its
//! handler, so built-ins can be overridden as well as extended.

use std::collections::BTreeMap;

use crate::actions;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::rule::Rule;

/// Signature shared by every action handler.
///
/// Handlers receive the engine, whose staging area holds the working copy, and
/// the rule being applied. Conditions the run can survive are reported through
/// [`Engine::warn`]; returned errors abort the run.
pub type ActionHandler = fn(&mut Engine, &Rule) -> Result<(), EngineError>;

/// Mapping from action name to handler.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    handlers: BTreeMap<String, ActionHandler>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.set("copy", actions::copy);
        registry.set("rename", actions::rename);
        registry.set("replace", actions::replace);
        registry.set("exclude", actions::exclude);
        registry
    }
}

impl ActionRegistry {
    /// Creates a registry seeded with the built-in actions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with no actions.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Registers `handler` under `name`, returning the handler it replaced.
    pub fn set(&mut self, name: impl Into<String>, handler: ActionHandler) -> Option<ActionHandler> {
        self.handlers.insert(name.into(), handler)
    }

    /// Looks up the handler for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ActionHandler> {
        self.handlers.get(name).copied()
    }

    /// Registered action names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}
