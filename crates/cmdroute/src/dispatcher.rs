//! The dispatcher façade: registration, configuration and execution.
//!
//! Execution walks the command tree along the tokens until a flag or an
//! unknown token marks the start of the arguments, binds the arguments, and
//! invokes the handler. Every user-input failure becomes exactly one
//! diagnostic on the sink; nothing is returned as an error.

use std::any::Any;
use std::fmt::Display;

use cmdroute_types::config::DispatcherConfig;
use cmdroute_types::error::{DispatchError, Result};
use cmdroute_types::value::{ArgValue, TypeTag, Value};

use crate::binder::ArgumentBinder;
use crate::convert::ConversionRegistry;
use crate::diagnostics::{
    DiagnosticHooks, DiagnosticSink, Failure, FailureKind, WriterSink, invalid_args_message,
    unknown_command_message, usage,
};
use crate::handler::{Handler, IntoHandler, RawHandler};
use crate::tree::{CommandEntry, CommandTree, FlagAction, NodeId, is_flag_token};

/// How a call to [`Dispatcher::execute`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler ran.
    Executed,
    /// The path did not resolve to a handler; a diagnostic was emitted.
    UnknownCommand,
    /// The arguments did not bind; a diagnostic was emitted.
    InvalidArguments,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Executed
    }
}

/// Command registry and dispatch entry point.
///
/// Registration and execution are single-threaded. Register everything,
/// then execute; configuration calls may still be made between executions.
pub struct Dispatcher {
    tree: CommandTree,
    conversions: ConversionRegistry,
    config: DispatcherConfig,
    invalid_command: DiagnosticHooks,
    invalid_args: DiagnosticHooks,
    sink: Box<dyn DiagnosticSink>,
}

impl Dispatcher {
    /// A dispatcher with the default config, the built-in conversions, and
    /// diagnostics written to stderr.
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        let invalid_command = DiagnosticHooks {
            message: config.invalid_command_message.clone(),
            callback: None,
        };
        let invalid_args = DiagnosticHooks {
            message: config.invalid_args_message.clone(),
            callback: None,
        };
        Self {
            tree: CommandTree::new(),
            conversions: ConversionRegistry::with_builtins(),
            config,
            invalid_command,
            invalid_args,
            sink: Box::new(WriterSink::stderr()),
        }
    }

    /// Replace the diagnostic sink.
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.set_sink(sink);
        self
    }

    pub fn set_sink(&mut self, sink: impl DiagnosticSink + 'static) {
        self.sink = Box::new(sink);
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn conversions(&self) -> &ConversionRegistry {
        &self.conversions
    }

    // -- Registration --

    /// Register a typed function at `path`. Parameter types become the slot
    /// tags; a tag without a conversion only fails when it is bound.
    pub fn register<Args, F>(&mut self, path: &[&str], func: F) -> NodeId
    where
        F: IntoHandler<Args>,
    {
        self.register_handler(path, Box::new(func.into_handler()))
    }

    /// Register a closure over raw values with an explicit tag list.
    pub fn register_raw<F>(&mut self, path: &[&str], tags: Vec<TypeTag>, func: F) -> NodeId
    where
        F: Fn(&[Value]) + 'static,
    {
        self.register_handler(path, Box::new(RawHandler::new(tags, func)))
    }

    /// Register a boxed handler. Replaces any handler already at `path`,
    /// dropping its flags, defaults and names.
    pub fn register_handler(&mut self, path: &[&str], handler: Box<dyn Handler>) -> NodeId {
        let entry = CommandEntry::new(handler);
        let arity = entry.arity();
        for (idx, spec) in entry.specs.iter().enumerate() {
            if !self.conversions.contains(spec.tag) {
                log::debug!(
                    "No conversion for slot {idx} of '{}' ({}) yet",
                    path.join(" "),
                    spec.tag
                );
            }
        }
        let (id, previous) = self.tree.register(path, entry);
        if previous.is_some() {
            log::warn!("Replaced handler at '{}'", path.join(" "));
        } else {
            log::info!("Registered '{}' ({arity} argument(s))", path.join(" "));
        }
        id
    }

    /// Register (or replace) the conversion used for slots of type `T`.
    pub fn add_conversion<T, F, E>(&mut self, convert: F)
    where
        T: Any,
        F: Fn(&str) -> std::result::Result<T, E> + 'static,
        E: Display,
    {
        self.conversions.register::<T, F, E>(convert);
    }

    /// Make `alias` resolve to the node at `path`.
    pub fn add_alias(&mut self, path: &[&str], alias: &str) -> Result<()> {
        self.tree.add_alias(path, alias)
    }

    /// `flag` addresses slot `slot` and takes the following token as its
    /// literal. Leading dashes on `flag` are ignored.
    pub fn add_positional_flag(&mut self, path: &[&str], slot: usize, flag: &str) -> Result<()> {
        self.insert_flag(path, slot, flag, FlagAction::TakesValue)
    }

    /// `flag` alone supplies `value` for slot `slot`.
    pub fn add_value_flag(
        &mut self,
        path: &[&str],
        slot: usize,
        flag: &str,
        value: impl Into<ArgValue>,
    ) -> Result<()> {
        self.insert_flag(path, slot, flag, FlagAction::Supplies(value.into()))
    }

    /// Value used for slot `slot` when nothing on the command line binds it.
    pub fn add_default(&mut self, path: &[&str], slot: usize, value: impl Into<ArgValue>) -> Result<()> {
        self.entry_mut(path)?.spec_mut(slot)?.default = Some(value.into());
        Ok(())
    }

    /// Display name for slot `slot` in diagnostics and usage.
    pub fn set_arg_name(&mut self, path: &[&str], slot: usize, name: &str) -> Result<()> {
        self.entry_mut(path)?.spec_mut(slot)?.name = Some(name.to_string());
        Ok(())
    }

    fn insert_flag(&mut self, path: &[&str], slot: usize, flag: &str, action: FlagAction) -> Result<()> {
        let name = flag.trim_start_matches('-');
        if name.is_empty() {
            return Err(DispatchError::Config(format!("invalid flag '{flag}'")));
        }
        let entry = self.entry_mut(path)?;
        entry.spec_mut(slot)?.flags.insert(name.to_string(), action);
        // A flag addresses exactly one slot.
        for (idx, spec) in entry.specs.iter_mut().enumerate() {
            if idx != slot && spec.flags.remove(name).is_some() {
                log::debug!("Flag '{name}' moved from slot {idx} to slot {slot}");
            }
        }
        Ok(())
    }

    fn entry_mut(&mut self, path: &[&str]) -> Result<&mut CommandEntry> {
        let id = self.tree.traverse_full(path)?;
        self.tree
            .node_mut(id)
            .entry
            .as_mut()
            .ok_or_else(|| DispatchError::HandlerMissing(path.join(" ")))
    }

    // -- Diagnostic hooks --

    /// Unknown-command message for the node at `path`, or dispatcher-wide
    /// when `path` is `None`.
    pub fn set_invalid_command_message(&mut self, path: Option<&[&str]>, message: &str) -> Result<()> {
        self.hooks_mut(path, FailureKind::UnknownCommand)?.message = Some(message.to_string());
        Ok(())
    }

    /// Unknown-command callback; takes precedence over a message at the same
    /// scope.
    pub fn set_invalid_command_func<F>(&mut self, path: Option<&[&str]>, func: F) -> Result<()>
    where
        F: Fn(&Failure<'_>) -> String + 'static,
    {
        self.hooks_mut(path, FailureKind::UnknownCommand)?.callback = Some(Box::new(func));
        Ok(())
    }

    /// Invalid-arguments message for the node at `path`, or dispatcher-wide
    /// when `path` is `None`.
    pub fn set_invalid_args_message(&mut self, path: Option<&[&str]>, message: &str) -> Result<()> {
        self.hooks_mut(path, FailureKind::InvalidArguments)?.message = Some(message.to_string());
        Ok(())
    }

    /// Invalid-arguments callback; takes precedence over a message at the
    /// same scope.
    pub fn set_invalid_args_func<F>(&mut self, path: Option<&[&str]>, func: F) -> Result<()>
    where
        F: Fn(&Failure<'_>) -> String + 'static,
    {
        self.hooks_mut(path, FailureKind::InvalidArguments)?.callback = Some(Box::new(func));
        Ok(())
    }

    fn hooks_mut(&mut self, path: Option<&[&str]>, kind: FailureKind) -> Result<&mut DiagnosticHooks> {
        let Some(path) = path else {
            return Ok(match kind {
                FailureKind::UnknownCommand => &mut self.invalid_command,
                FailureKind::InvalidArguments => &mut self.invalid_args,
            });
        };
        let id = self.tree.traverse_full(path)?;
        let node = self.tree.node_mut(id);
        Ok(match kind {
            FailureKind::UnknownCommand => &mut node.invalid_command,
            FailureKind::InvalidArguments => &mut node.invalid_args,
        })
    }

    // -- Introspection --

    /// Every registered command, depth-first. Aliases are joined with `|`.
    pub fn commands(&self) -> Vec<String> {
        self.tree
            .handler_nodes()
            .into_iter()
            .map(|id| self.display_path(id))
            .collect()
    }

    fn display_path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut cur = id;
        while let Some(parent) = self.tree.node(cur).parent() {
            segments.push(self.tree.node(cur).aliases().join("|"));
            cur = parent;
        }
        segments.reverse();
        segments.join(" ")
    }

    /// Usage line for the command at `path`.
    pub fn usage(&self, path: &[&str]) -> Result<String> {
        let id = self.tree.traverse_full(path)?;
        if !self.tree.node(id).has_handler() {
            return Err(DispatchError::HandlerMissing(path.join(" ")));
        }
        Ok(usage(&self.tree, id))
    }

    // -- Execution --

    /// Resolve the command named by the leading tokens and run it with the
    /// rest. The caller strips the program name first.
    pub fn execute<S: AsRef<str>>(&mut self, tokens: &[S]) -> Outcome {
        let tokens: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();
        let (node, boundary) = self.tree.traverse_partial(&tokens);
        log::debug!(
            "Resolved '{}' with {} argument token(s)",
            self.tree.path_of(node).join(" "),
            tokens.len() - boundary
        );

        if !self.tree.node(node).has_handler() {
            let unresolved = tokens
                .get(boundary)
                .map(String::as_str)
                .filter(|t| !is_flag_token(t));
            self.report_unknown(&tokens, node, unresolved);
            return Outcome::UnknownCommand;
        }
        self.run(&tokens, node, boundary)
    }

    /// Two-list form: `path` must resolve exactly; `args` are all arguments.
    pub fn execute_path<S: AsRef<str>>(&mut self, path: &[&str], args: &[S]) -> Outcome {
        let tokens: Vec<String> = path
            .iter()
            .map(|t| t.to_string())
            .chain(args.iter().map(|t| t.as_ref().to_string()))
            .collect();

        let mut node = NodeId::ROOT;
        for (idx, token) in path.iter().enumerate() {
            match self.tree.find_child(node, token) {
                Some(next) => node = next,
                None => {
                    self.report_unknown(&tokens, node, Some(&tokens[idx]));
                    return Outcome::UnknownCommand;
                },
            }
        }
        if !self.tree.node(node).has_handler() {
            self.report_unknown(&tokens, node, None);
            return Outcome::UnknownCommand;
        }
        self.run(&tokens, node, path.len())
    }

    fn run(&mut self, tokens: &[String], node: NodeId, boundary: usize) -> Outcome {
        let result = match self.tree.node(node).entry() {
            Some(entry) => ArgumentBinder::new(&entry.specs, &self.conversions)
                .bind(&tokens[boundary..])
                .and_then(|values| entry.handler.invoke(values)),
            None => Err(DispatchError::HandlerMissing(self.tree.path_of(node).join(" "))),
        };

        match result {
            Ok(()) => Outcome::Executed,
            Err(error) => {
                self.report(FailureKind::InvalidArguments, tokens, node, None, &error);
                Outcome::InvalidArguments
            },
        }
    }

    fn report_unknown(&mut self, tokens: &[String], node: NodeId, unresolved: Option<&str>) {
        let mut path = self.tree.path_of(node);
        let error = match unresolved {
            Some(token) => {
                path.push(token.to_string());
                DispatchError::PathNotFound(path.join(" "))
            },
            None => DispatchError::HandlerMissing(path.join(" ")),
        };
        self.report(FailureKind::UnknownCommand, tokens, node, unresolved, &error);
    }

    /// Emit exactly one diagnostic: node callback, node message,
    /// dispatcher-wide hook, then the built-in text.
    fn report(
        &mut self,
        kind: FailureKind,
        tokens: &[String],
        node: NodeId,
        unresolved: Option<&str>,
        error: &DispatchError,
    ) {
        let failure = Failure {
            kind,
            tokens,
            path: self.tree.path_of(node),
            unresolved,
            error,
        };
        let target = self.tree.node(node);
        let (node_hooks, global_hooks) = match kind {
            FailureKind::UnknownCommand => (&target.invalid_command, &self.invalid_command),
            FailureKind::InvalidArguments => (&target.invalid_args, &self.invalid_args),
        };
        let hooks = if node_hooks.is_set() { node_hooks } else { global_hooks };
        let text = hooks
            .render(&failure)
            .unwrap_or_else(|| match kind {
                FailureKind::UnknownCommand => {
                    unknown_command_message(&self.tree, node, unresolved, &self.config)
                },
                FailureKind::InvalidArguments => invalid_args_message(&self.tree, node, error),
            });
        log::debug!("{kind:?}: {error}");
        self.sink.emit(&text);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
