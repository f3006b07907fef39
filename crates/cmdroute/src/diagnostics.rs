//! Diagnostic sinks, per-node hooks and the built-in failure messages.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::rc::Rc;

use cmdroute_types::config::DispatcherConfig;
use cmdroute_types::error::{DispatchError, SlotStatus};

use crate::suggest::find_close;
use crate::tree::{CommandTree, NodeId};

/// Receives diagnostic text. Where it ends up is up to the embedder.
pub trait DiagnosticSink {
    fn emit(&mut self, text: &str);
}

/// Writes each diagnostic as a line to an [`io::Write`].
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.writer, "{text}") {
            log::warn!("Failed to write diagnostic: {e}");
        }
    }
}

/// Collects diagnostics in memory. Clones share the same buffer, so a
/// handle kept by the caller sees what the dispatcher emitted.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every diagnostic emitted so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.lines.borrow().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&mut self, text: &str) {
        self.lines.borrow_mut().push(text.to_string());
    }
}

/// Which kind of failure a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The path did not resolve to a handler.
    UnknownCommand,
    /// A handler was found but its arguments did not bind.
    InvalidArguments,
}

/// What a diagnostic callback gets to look at.
#[derive(Debug)]
pub struct Failure<'a> {
    pub kind: FailureKind,
    /// Every token passed to `execute`.
    pub tokens: &'a [String],
    /// Primary names of the deepest node that was reached.
    pub path: Vec<String>,
    /// The token where resolution stopped, for unknown commands.
    pub unresolved: Option<&'a str>,
    pub error: &'a DispatchError,
}

/// A diagnostic callback.
pub type DiagnosticFn = Box<dyn Fn(&Failure<'_>) -> String>;

/// Custom diagnostic for one failure kind. A callback wins over a message.
#[derive(Default)]
pub struct DiagnosticHooks {
    pub(crate) message: Option<String>,
    pub(crate) callback: Option<DiagnosticFn>,
}

impl DiagnosticHooks {
    pub fn is_set(&self) -> bool {
        self.message.is_some() || self.callback.is_some()
    }

    /// The custom text for `failure`, if any hook is set.
    pub fn render(&self, failure: &Failure<'_>) -> Option<String> {
        if let Some(callback) = &self.callback {
            return Some(callback(failure));
        }
        self.message.clone()
    }
}

/// Built-in unknown-command text, with "did you mean" suggestions.
pub fn unknown_command_message(
    tree: &CommandTree,
    node: NodeId,
    unresolved: Option<&str>,
    config: &DispatcherConfig,
) -> String {
    let path = tree.path_of(node).join(" ");
    let mut msg = match (unresolved, path.is_empty()) {
        (Some(token), _) => format!("command not found: '{token}'"),
        (None, true) => "command not found".to_string(),
        (None, false) => format!("command not found: '{path}' needs a subcommand"),
    };

    let candidates = tree.child_tokens(node);
    let close = unresolved
        .map(|token| find_close(&candidates, token, config.suggestion_threshold))
        .unwrap_or_default();

    match close.as_slice() {
        [only] => {
            let _ = write!(msg, "\nthe most similar command is: {only}");
        },
        [_, _, ..] => {
            let _ = write!(msg, "\nsimilar commands: {}", close.join(", "));
        },
        [] if config.list_available_commands && !candidates.is_empty() => {
            let _ = write!(msg, "\navailable commands: {}", candidates.join(", "));
        },
        [] => {},
    }
    msg
}

/// Built-in invalid-arguments text: what went wrong, per slot, plus usage.
pub fn invalid_args_message(tree: &CommandTree, node: NodeId, error: &DispatchError) -> String {
    let path = tree.path_of(node).join(" ");
    let mut msg = if path.is_empty() {
        "invalid arguments".to_string()
    } else {
        format!("invalid arguments for '{path}'")
    };

    let Some(entry) = tree.node(node).entry() else {
        return msg;
    };

    match error {
        DispatchError::Arguments(args) => {
            for (idx, (status, spec)) in args.slots.iter().zip(&entry.specs).enumerate() {
                match status {
                    SlotStatus::Converted => {},
                    SlotStatus::Missing => {
                        let _ = write!(msg, "\n  argument {} ({}): missing", idx + 1, spec.describe());
                    },
                    SlotStatus::Failed(e) => {
                        let _ = write!(msg, "\n  argument {} ({}): {e}", idx + 1, spec.describe());
                    },
                }
            }
            if args.is_arity_mismatch() {
                let _ = write!(
                    msg,
                    "\n  expected {} argument(s), got {}",
                    args.arity,
                    args.arity + args.excess
                );
            }
        },
        other => {
            let _ = write!(msg, ": {other}");
        },
    }

    let _ = write!(msg, "\nusage: {}", usage(tree, node));
    msg
}

/// One-line usage for the command at `node`: its path then one
/// `<name: type>` per slot.
pub fn usage(tree: &CommandTree, node: NodeId) -> String {
    let mut line = tree.path_of(node).join(" ");
    if let Some(entry) = tree.node(node).entry() {
        for spec in &entry.specs {
            if !line.is_empty() {
                line.push(' ');
            }
            if spec.default.is_some() {
                let _ = write!(line, "[{}]", spec.describe());
            } else {
                let _ = write!(line, "<{}>", spec.describe());
            }
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use cmdroute_types::error::{ArgumentError, ConversionError};

    use super::*;
    use crate::handler::IntoHandler;
    use crate::tree::CommandEntry;

    fn entry<Args, F: IntoHandler<Args>>(f: F) -> CommandEntry {
        CommandEntry::new(Box::new(f.into_handler()))
    }

    fn sample_tree() -> CommandTree {
        let mut tree = CommandTree::new();
        tree.register(&["bar", "baz"], entry(|_x: i32| {}));
        tree.register(&["bar", "boz"], entry(|| {}));
        tree.register(&["add"], entry(|_a: i32, _b: f64| {}));
        tree
    }

    #[test]
    fn memory_sink_shares_buffer() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();
        handle.emit("one");
        handle.emit("two");
        assert_eq!(sink.lines(), vec!["one", "two"]);
        assert_eq!(sink.last().as_deref(), Some("two"));
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn writer_sink_writes_lines() {
        let mut sink = WriterSink::new(Vec::new());
        sink.emit("hello");
        sink.emit("world");
        assert_eq!(sink.into_inner(), b"hello\nworld\n");
    }

    #[test]
    fn hooks_prefer_callback_over_message() {
        let err = DispatchError::HandlerMissing(String::new());
        let failure = Failure {
            kind: FailureKind::UnknownCommand,
            tokens: &[],
            path: Vec::new(),
            unresolved: None,
            error: &err,
        };
        let mut hooks = DiagnosticHooks::default();
        assert!(!hooks.is_set());
        assert_eq!(hooks.render(&failure), None);
        hooks.message = Some("custom".into());
        assert_eq!(hooks.render(&failure).as_deref(), Some("custom"));
        hooks.callback = Some(Box::new(|f: &Failure<'_>| format!("callback {:?}", f.kind)));
        assert_eq!(
            hooks.render(&failure).as_deref(),
            Some("callback UnknownCommand")
        );
    }

    #[test]
    fn single_close_match_is_most_similar() {
        let tree = sample_tree();
        let bar = tree.traverse_full(&["bar"]).unwrap();
        let msg = unknown_command_message(&tree, bar, Some("bax"), &DispatcherConfig {
            suggestion_threshold: 1,
            ..Default::default()
        });
        assert_eq!(
            msg,
            "command not found: 'bax'\nthe most similar command is: baz"
        );
    }

    #[test]
    fn several_close_matches_are_listed() {
        let tree = sample_tree();
        let bar = tree.traverse_full(&["bar"]).unwrap();
        let msg = unknown_command_message(&tree, bar, Some("bax"), &DispatcherConfig::default());
        assert_eq!(msg, "command not found: 'bax'\nsimilar commands: baz, boz");
    }

    #[test]
    fn no_close_match_lists_children() {
        let tree = sample_tree();
        let msg = unknown_command_message(
            &tree,
            NodeId::ROOT,
            Some("foo"),
            &DispatcherConfig::default(),
        );
        assert_eq!(msg, "command not found: 'foo'\navailable commands: bar, add");
    }

    #[test]
    fn listing_can_be_disabled() {
        let tree = sample_tree();
        let config = DispatcherConfig {
            list_available_commands: false,
            ..Default::default()
        };
        let msg = unknown_command_message(&tree, NodeId::ROOT, Some("foo"), &config);
        assert_eq!(msg, "command not found: 'foo'");
    }

    #[test]
    fn intermediate_node_needs_subcommand() {
        let tree = sample_tree();
        let bar = tree.traverse_full(&["bar"]).unwrap();
        let msg = unknown_command_message(&tree, bar, None, &DispatcherConfig::default());
        assert_eq!(
            msg,
            "command not found: 'bar' needs a subcommand\navailable commands: baz, boz"
        );
    }

    #[test]
    fn invalid_args_lists_failed_slots() {
        let tree = sample_tree();
        let add = tree.traverse_full(&["add"]).unwrap();
        let err = DispatchError::Arguments(ArgumentError {
            arity: 2,
            excess: 0,
            slots: vec![
                SlotStatus::Failed(ConversionError::rejected("i32", "abc", "invalid digit")),
                SlotStatus::Missing,
            ],
        });
        let msg = invalid_args_message(&tree, add, &err);
        assert_eq!(
            msg,
            "invalid arguments for 'add'\n  argument 1 (i32): cannot convert 'abc' to i32: invalid digit\n  argument 2 (f64): missing\nusage: add <i32> <f64>"
        );
    }

    #[test]
    fn invalid_args_keeps_slot_failures_on_arity_mismatch() {
        let tree = sample_tree();
        let add = tree.traverse_full(&["add"]).unwrap();
        let err = DispatchError::Arguments(ArgumentError {
            arity: 2,
            excess: 1,
            slots: vec![
                SlotStatus::Failed(ConversionError::rejected("i32", "abc", "invalid digit")),
                SlotStatus::Converted,
            ],
        });
        assert_eq!(
            invalid_args_message(&tree, add, &err),
            "invalid arguments for 'add'\n  argument 1 (i32): cannot convert 'abc' to i32: invalid digit\n  expected 2 argument(s), got 3\nusage: add <i32> <f64>"
        );
    }

    #[test]
    fn invalid_args_for_flag_error() {
        let tree = sample_tree();
        let baz = tree.traverse_full(&["bar", "baz"]).unwrap();
        let err = DispatchError::UnknownFlag("-q".into());
        assert_eq!(
            invalid_args_message(&tree, baz, &err),
            "invalid arguments for 'bar baz': unknown flag: -q\nusage: bar baz <i32>"
        );
    }

    #[test]
    fn usage_marks_defaults_optional() {
        let mut tree = sample_tree();
        let add = tree.traverse_full(&["add"]).unwrap();
        if let Some(entry) = tree.node_mut(add).entry.as_mut() {
            entry.specs[0].name = Some("count".into());
            entry.specs[1].default = Some("1.0".into());
        }
        assert_eq!(usage(&tree, add), "add <count: i32> [f64]");
    }
}
