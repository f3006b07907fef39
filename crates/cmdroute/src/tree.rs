//! Command tree stored as an arena of nodes addressed by index.
//!
//! Each node is identified among its siblings by an alias set. The first
//! alias is the node's primary name; later aliases resolve to the same node.
//! Children keep insertion order, which only affects listing order.

use std::collections::HashMap;

use cmdroute_types::error::{DispatchError, Result};
use cmdroute_types::value::{ArgValue, TypeTag};

use crate::diagnostics::DiagnosticHooks;
use crate::handler::Handler;

/// Index of a node in the [`CommandTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node, which has no name and always exists.
    pub const ROOT: NodeId = NodeId(0);
}

/// Whether a token addresses a slot by flag rather than naming a command.
pub fn is_flag_token(token: &str) -> bool {
    token.starts_with('-')
}

/// What a flag does when it appears on the command line.
#[derive(Debug, Clone)]
pub enum FlagAction {
    /// The next token is the slot's literal.
    TakesValue,
    /// The flag alone supplies the slot's value.
    Supplies(ArgValue),
}

/// Metadata for one handler parameter.
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    pub tag: TypeTag,
    /// Display name used in diagnostics.
    pub name: Option<String>,
    /// Flag text (without dashes) to action.
    pub flags: HashMap<String, FlagAction>,
    pub default: Option<ArgValue>,
}

impl ArgumentSpec {
    pub fn new(tag: TypeTag) -> Self {
        Self {
            tag,
            name: None,
            flags: HashMap::new(),
            default: None,
        }
    }

    /// `name: type` when named, otherwise just the type.
    pub fn describe(&self) -> String {
        match &self.name {
            Some(name) => format!("{name}: {}", self.tag),
            None => self.tag.to_string(),
        }
    }
}

/// A handler attached to a node, with per-slot metadata.
pub struct CommandEntry {
    pub handler: Box<dyn Handler>,
    pub specs: Vec<ArgumentSpec>,
}

impl CommandEntry {
    pub fn new(handler: Box<dyn Handler>) -> Self {
        let specs = handler.arg_tags().into_iter().map(ArgumentSpec::new).collect();
        Self { handler, specs }
    }

    pub fn arity(&self) -> usize {
        self.specs.len()
    }

    /// Mutable access to one slot's metadata.
    pub fn spec_mut(&mut self, index: usize) -> Result<&mut ArgumentSpec> {
        let arity = self.arity();
        self.specs
            .get_mut(index)
            .ok_or(DispatchError::IndexOutOfRange { index, arity })
    }
}

/// A single node in the command tree.
pub struct CommandNode {
    aliases: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub(crate) entry: Option<CommandEntry>,
    pub(crate) invalid_command: DiagnosticHooks,
    pub(crate) invalid_args: DiagnosticHooks,
}

impl CommandNode {
    fn new(parent: Option<NodeId>, aliases: Vec<String>) -> Self {
        Self {
            aliases,
            parent,
            children: Vec::new(),
            entry: None,
            invalid_command: DiagnosticHooks::default(),
            invalid_args: DiagnosticHooks::default(),
        }
    }

    /// Every token that names this node. Empty for the root.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The first alias. Empty for the root.
    pub fn name(&self) -> &str {
        self.aliases.first().map(String::as_str).unwrap_or("")
    }

    pub fn matches(&self, token: &str) -> bool {
        self.aliases.iter().any(|a| a == token)
    }

    /// `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn entry(&self) -> Option<&CommandEntry> {
        self.entry.as_ref()
    }

    pub fn has_handler(&self) -> bool {
        self.entry.is_some()
    }
}

/// Arena-backed command tree. Dropping the tree drops every node at once.
pub struct CommandTree {
    nodes: Vec<CommandNode>,
}

impl CommandTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![CommandNode::new(None, Vec::new())],
        }
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut CommandNode {
        &mut self.nodes[id.0]
    }

    /// Total number of nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The child of `id` whose alias set contains `token`.
    pub fn find_child(&self, id: NodeId, token: &str) -> Option<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .find(|&child| self.node(child).matches(token))
    }

    /// Walk `path` from the root, creating missing nodes.
    pub fn drill(&mut self, path: &[&str]) -> NodeId {
        let mut cur = NodeId::ROOT;
        for token in path {
            cur = match self.find_child(cur, token) {
                Some(next) => next,
                None => {
                    let next = NodeId(self.nodes.len());
                    self.nodes
                        .push(CommandNode::new(Some(cur), vec![(*token).to_string()]));
                    self.node_mut(cur).children.push(next);
                    log::debug!("Created command node '{token}'");
                    next
                },
            };
        }
        cur
    }

    /// Attach `entry` at `path`, replacing any handler already there.
    ///
    /// Returns the node and the replaced entry, if any.
    pub fn register(&mut self, path: &[&str], entry: CommandEntry) -> (NodeId, Option<CommandEntry>) {
        let id = self.drill(path);
        let previous = self.node_mut(id).entry.replace(entry);
        (id, previous)
    }

    /// Strict traversal: every segment must match.
    pub fn traverse_full(&self, path: &[&str]) -> Result<NodeId> {
        let mut cur = NodeId::ROOT;
        for token in path {
            cur = self
                .find_child(cur, token)
                .ok_or_else(|| DispatchError::PathNotFound(path.join(" ")))?;
        }
        Ok(cur)
    }

    /// Walk while tokens name children and are not flags.
    ///
    /// Returns the last matched node and the index of the first unconsumed
    /// token, which is where arguments begin.
    pub fn traverse_partial<S: AsRef<str>>(&self, tokens: &[S]) -> (NodeId, usize) {
        let mut cur = NodeId::ROOT;
        for (idx, token) in tokens.iter().enumerate() {
            let token = token.as_ref();
            if is_flag_token(token) {
                return (cur, idx);
            }
            match self.find_child(cur, token) {
                Some(next) => cur = next,
                None => return (cur, idx),
            }
        }
        (cur, tokens.len())
    }

    /// Add `alias` to the node at `path`.
    ///
    /// An alias must be a non-empty word that does not look like a flag;
    /// resolution could never reach anything else.
    pub fn add_alias(&mut self, path: &[&str], alias: &str) -> Result<()> {
        if alias.is_empty() || is_flag_token(alias) {
            return Err(DispatchError::Config(format!("invalid alias '{alias}'")));
        }
        let id = self.traverse_full(path)?;
        let parent = self
            .node(id)
            .parent
            .ok_or_else(|| DispatchError::Config("the root command cannot be aliased".into()))?;
        if self.node(id).matches(alias) {
            return Ok(());
        }
        if self.find_child(parent, alias).is_some() {
            return Err(DispatchError::Config(format!(
                "alias '{alias}' already names a sibling command"
            )));
        }
        self.node_mut(id).aliases.push(alias.to_string());
        log::debug!("Added alias '{alias}' for '{}'", path.join(" "));
        Ok(())
    }

    /// Primary names from the root to `id`.
    pub fn path_of(&self, id: NodeId) -> Vec<String> {
        let mut path = Vec::new();
        let mut cur = Some(id);
        while let Some(node_id) = cur {
            let node = self.node(node_id);
            if node.parent.is_some() {
                path.push(node.name().to_string());
            }
            cur = node.parent;
        }
        path.reverse();
        path
    }

    /// Every token that names a child of `id`, aliases included, in
    /// insertion order.
    pub fn child_tokens(&self, id: NodeId) -> Vec<&str> {
        self.node(id)
            .children
            .iter()
            .flat_map(|&child| self.node(child).aliases.iter().map(String::as_str))
            .collect()
    }

    /// Nodes carrying a handler, depth-first in insertion order.
    pub fn handler_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            if self.node(id).has_handler() {
                out.push(id);
            }
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }
}

impl Default for CommandTree {
    fn default() -> Self {
        Self::new()
    }
}
