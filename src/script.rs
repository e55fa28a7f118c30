//! The post-parse scripting collaborator.
//!
//! Scripts are registered from within the document (see
//! [`PI_SCRIPT`](crate::loader::PI_SCRIPT)) and run in registration order
//! against the finished graph, after reference resolution. The engine
//! itself is opaque to the loader: any embedded scripting facility can be
//! injected by implementing [`ScriptEngine`].

use thiserror::Error;

use crate::model::ModelGraph;

/// How a script run failed.
///
/// The distinction matters to the loader: a [`ScriptError::Syntax`]
/// problem is reported as a parse warning and halts further script
/// execution for the document, while a [`ScriptError::Runtime`] failure is
/// swallowed because the parse itself already succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("{0}")]
    Syntax(String),
    #[error("{0}")]
    Runtime(String),
}

/// An injected scripting facility.
pub trait ScriptEngine {
    /// Parse and execute one script against the finished graph.
    fn run(&mut self, source: &str, graph: &ModelGraph) -> Result<(), ScriptError>;
}
