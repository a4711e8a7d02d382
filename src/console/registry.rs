//! Command definitions and the shared registry.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use futures::FutureExt;
use futures::future::BoxFuture;

use super::argspec::ArgSpec;
use super::interpreter::{CommandOutput, Console};
use crate::error::Result;
use crate::log_debug;

/// Async command handler: receives the owning console and the validated arguments.
pub type CommandHandler =
    Arc<dyn Fn(Console, Vec<String>) -> BoxFuture<'static, Result<CommandOutput>> + Send + Sync>;

/// One interpreter verb: name, help texts, argument schema and handler.
#[derive(Clone)]
pub struct CommandDefinition {
    pub name: String,
    /// One-line description for `help`.
    pub summary: String,
    /// Long description for `help <name>`.
    pub detail: String,
    /// Usage string without the command name (e.g. "<MODEL> [ID]").
    pub usage: String,
    pub args: ArgSpec,
    handler: CommandHandler,
}

impl CommandDefinition {
    /// Build a definition; fails when `arg_spec` is malformed.
    pub fn new<F, Fut>(name: impl Into<String>, arg_spec: &str, handler: F) -> Result<Self>
    where
        F: Fn(Console, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CommandOutput>> + Send + 'static,
    {
        Ok(Self {
            name: name.into(),
            summary: String::new(),
            detail: String::new(),
            usage: String::new(),
            args: ArgSpec::parse(arg_spec)?,
            handler: Arc::new(move |console: Console, args: Vec<String>| {
                handler(console, args).boxed()
            }),
        })
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub(crate) fn invoke(
        &self,
        console: Console,
        args: Vec<String>,
    ) -> BoxFuture<'static, Result<CommandOutput>> {
        (self.handler)(console, args)
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("summary", &self.summary)
            .field("usage", &self.usage)
            .field("args", &self.args.to_string())
            .finish_non_exhaustive()
    }
}

/// Name → definition map shared by every clone of a console.
///
/// Readers get an `Arc` snapshot of a definition, so a concurrent `register`
/// never exposes a half-built entry.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: Arc<RwLock<BTreeMap<String, Arc<CommandDefinition>>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&self, def: CommandDefinition) {
        let mut commands = self.commands.write().unwrap_or_else(PoisonError::into_inner);
        if commands.contains_key(&def.name) {
            log_debug!("command '{}' re-registered; replacing definition", def.name);
        }
        commands.insert(def.name.clone(), Arc::new(def));
    }

    /// Remove a command; returns the removed definition.
    pub fn unregister(&self, name: &str) -> Option<Arc<CommandDefinition>> {
        self.commands
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Case-sensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<Arc<CommandDefinition>> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Case-insensitive existence check (alias names must not shadow commands).
    pub fn contains_ignore_case(&self, name: &str) -> bool {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .any(|k| k.eq_ignore_ascii_case(name))
    }

    /// All definitions, alphabetically by name.
    pub fn list_sorted(&self) -> Vec<Arc<CommandDefinition>> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// All names, alphabetically.
    pub fn names(&self) -> Vec<String> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
