//! Command dispatch engine.
//!
//! Commands are typed functions registered at a path of words in a command
//! tree. Execution walks the tree along the input tokens, binds the remaining
//! tokens to the handler's parameters (positionally, by flag, or from
//! defaults), converts each literal to the parameter's type, and invokes the
//! handler. Unknown commands and bad arguments produce one diagnostic with
//! edit-distance suggestions instead of an error.

pub mod binder;
pub mod convert;
pub mod diagnostics;
mod dispatcher;
pub mod handler;
pub mod suggest;
pub mod tree;

/// Binds argument tokens to handler slots.
pub use binder::ArgumentBinder;
/// Per-type string-to-value conversions.
pub use convert::ConversionRegistry;
/// Where diagnostic text goes.
pub use diagnostics::DiagnosticSink;
/// Context handed to diagnostic callbacks.
pub use diagnostics::{Failure, FailureKind};
/// Built-in sinks: an in-memory buffer and any `io::Write`.
pub use diagnostics::{MemorySink, WriterSink};
/// Registry, configuration and execution entry point.
pub use dispatcher::Dispatcher;
/// How an execution ended.
pub use dispatcher::Outcome;
/// Invocable command handlers.
pub use handler::{Handler, IntoHandler, RawHandler};
/// Node handles in the command tree.
pub use tree::NodeId;

pub use cmdroute_types::config::DispatcherConfig;
pub use cmdroute_types::error::{DispatchError, Result};
pub use cmdroute_types::value::{ArgValue, TypeTag, Value};
