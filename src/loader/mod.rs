//! Document loading: the event-driven mapping engine.
//!
//! This module provides the core infrastructure for turning a stream of
//! structural events into a typed object graph validated against a
//! [`SchemaProvider`].
//!
//! ## Key Components
//!
//! - [`DocumentLoader`] - the per-parse session object and event pump
//! - `mapper` (internal) - the element dispatch state machine
//! - `matcher` (internal) - exact and fuzzy name matching
//! - `resolver` (internal) - deferred reference resolution + id cache
//! - [`ParseWarning`] / [`UnresolvedReference`] - diagnostics
//! - [`ObjectTrace`] - bidirectional object/source-line association
//!
//! ## Session Model
//!
//! A loader owns every per-parse mutable structure: the growing graph, the
//! containment context stack, the identifier cache, the class and subtype
//! lookup caches, the trace maps, the pending reference list and the
//! warning list. All of them are reset at the start of every load, so
//! re-parsing a document (the interactive-editor case) never leaks state
//! between runs. Concurrent loads need one loader each; the only shared
//! structure is the read-mostly package registry.
//!
//! ## Tolerant by Design
//!
//! Elements and attributes that cannot be mapped produce warnings and
//! best-effort partial results, never errors. Only a malformed event
//! stream itself aborts the load. This favors an editor-friendly "always
//! show something" parse over strict validation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    error::FlexmodError,
    event::ParseEvent,
    model::ModelGraph,
    schema::{ClassId, SchemaProvider},
    script::{ScriptEngine, ScriptError},
};

pub mod diagnostic;
pub mod trace;

mod attributes;
mod mapper;
mod matcher;
mod resolver;

pub use diagnostic::{ParseWarning, UnresolvedReference};
pub use trace::ObjectTrace;

use mapper::StackEntry;
use resolver::IdCache;

/// Option key: enable fuzzy matching of attribute-less element names
/// against containment reference names.
pub const OPTION_FUZZY_CONTAINMENT_MATCHING: &str = "fuzzyContainmentMatching";
/// Option key: let unmapped elements' mappable children join the document
/// root set.
pub const OPTION_ORPHANS_AS_TOP_LEVEL: &str = "orphansAsTopLevel";
/// Option key: minimum similarity score (strictly exceeded) for a fuzzy
/// match to be accepted.
pub const OPTION_FUZZY_MATCHING_THRESHOLD: &str = "fuzzyMatchingThreshold";

/// Processing-instruction key that activates an additional schema
/// namespace from the package registry.
pub const PI_NSURI: &str = "nsuri";
/// Processing-instruction key that registers a post-parse script.
pub const PI_SCRIPT: &str = "script";

/// Behavioral switches of a load session.
///
/// Settable at construction and overridable from within the document via
/// processing instructions. These flags are the single source of
/// behavioral truth; no behavior is keyed off anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderOptions {
    pub fuzzy_containment_matching: bool,
    pub orphans_as_top_level: bool,
    pub fuzzy_matching_threshold: u32,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            fuzzy_containment_matching: true,
            orphans_as_top_level: false,
            fuzzy_matching_threshold: 2,
        }
    }
}

/// Everything a completed load hands back to the caller.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoadResult {
    /// The populated object graph, roots in document order.
    pub graph: ModelGraph,
    /// Non-fatal problems, in the order they were found.
    pub warnings: Vec<ParseWarning>,
    /// Object/line trace of this parse.
    pub trace: ObjectTrace,
    /// References still unresolved after the resolution pass. Each one is
    /// also covered by exactly one warning; the structured records are
    /// kept for tooling.
    pub unresolved: Vec<UnresolvedReference>,
}

/// The parse session: consumes structural events, produces a [`LoadResult`].
///
/// One loader maps one document at a time; it may be reused for subsequent
/// loads (all per-parse state is reset on entry). The schema provider is
/// owned by the loader so that namespace activation can extend it
/// mid-parse.
pub struct DocumentLoader<S: SchemaProvider> {
    schema: S,
    defaults: LoaderOptions,
    script_engine: Option<Box<dyn ScriptEngine>>,

    // Per-parse state, reset by `reset()` at the start of every load.
    pub(crate) options: LoaderOptions,
    pub(crate) graph: ModelGraph,
    pub(crate) stack: Vec<StackEntry>,
    pub(crate) warnings: Vec<ParseWarning>,
    pub(crate) unresolved: Vec<UnresolvedReference>,
    pub(crate) scripts: Vec<String>,
    pub(crate) id_cache: IdCache,
    pub(crate) trace: ObjectTrace,
    pub(crate) class_by_name: HashMap<String, ClassId>,
    pub(crate) subtypes_cache: HashMap<ClassId, Vec<ClassId>>,
    pub(crate) current_line: u32,
}

impl<S: SchemaProvider> DocumentLoader<S> {
    pub fn new(schema: S) -> Self {
        Self::with_options(schema, LoaderOptions::default())
    }

    pub fn with_options(schema: S, options: LoaderOptions) -> Self {
        DocumentLoader {
            schema,
            defaults: options,
            script_engine: None,
            options,
            graph: ModelGraph::default(),
            stack: Vec::new(),
            warnings: Vec::new(),
            unresolved: Vec::new(),
            scripts: Vec::new(),
            id_cache: IdCache::default(),
            trace: ObjectTrace::default(),
            class_by_name: HashMap::new(),
            subtypes_cache: HashMap::new(),
            current_line: 0,
        }
    }

    /// Install the post-parse script collaborator.
    pub fn script_engine(mut self, engine: Box<dyn ScriptEngine>) -> Self {
        self.script_engine = Some(engine);
        self
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// Load a document from a fallible event source. A source error is
    /// fatal and aborts the load.
    pub fn load<I>(&mut self, events: I) -> Result<LoadResult, FlexmodError>
    where
        I: IntoIterator<Item = Result<ParseEvent, FlexmodError>>,
    {
        self.reset();
        let mut ended = false;
        for event in events {
            let event = event?;
            self.current_line = event.line();
            if ended {
                return Err(FlexmodError::StreamAt(
                    event.line(),
                    "event after end of document".to_string(),
                ));
            }
            match event {
                ParseEvent::StartElement {
                    name, attributes, ..
                } => self.start_element(&name, &attributes)?,
                ParseEvent::EndElement { name, .. } => self.end_element(&name)?,
                ParseEvent::ProcessingInstruction { key, value, .. } => {
                    self.processing_instruction(&key, &value)
                }
                ParseEvent::EndDocument { .. } => {
                    self.end_document()?;
                    ended = true;
                }
            }
        }
        if !ended {
            return Err(FlexmodError::Stream(
                "event stream ended without document end".to_string(),
            ));
        }
        Ok(self.take_result())
    }

    /// Load a document from an infallible event sequence.
    pub fn load_events<I>(&mut self, events: I) -> Result<LoadResult, FlexmodError>
    where
        I: IntoIterator<Item = ParseEvent>,
    {
        self.load(events.into_iter().map(Ok))
    }

    /// Reset-at-start-of-load contract: every per-parse structure is
    /// cleared and the options return to their configured defaults.
    fn reset(&mut self) {
        self.options = self.defaults;
        self.graph = ModelGraph::default();
        self.stack.clear();
        self.warnings.clear();
        self.unresolved.clear();
        self.scripts.clear();
        self.id_cache = IdCache::default();
        self.trace.clear();
        self.class_by_name.clear();
        self.subtypes_cache.clear();
        self.current_line = 0;
    }

    fn take_result(&mut self) -> LoadResult {
        LoadResult {
            graph: std::mem::take(&mut self.graph),
            warnings: std::mem::take(&mut self.warnings),
            trace: std::mem::take(&mut self.trace),
            unresolved: std::mem::take(&mut self.unresolved),
        }
    }

    fn processing_instruction(&mut self, key: &str, value: &str) {
        if key.eq_ignore_ascii_case(PI_NSURI) {
            if self.schema.activate_namespace(value) {
                // New classes may now shadow earlier fuzzy decisions; the
                // lookup tables are caches, safe to rebuild.
                self.class_by_name.clear();
                self.subtypes_cache.clear();
            } else {
                self.add_warning(format!("Failed to locate a package for nsURI {value}"));
            }
        } else if key.eq_ignore_ascii_case(PI_SCRIPT) {
            self.scripts.push(value.to_string());
        } else {
            self.process_option(key, value);
        }
    }

    /// Apply one configuration option. Unknown keys and unparsable values
    /// warn and leave the prior setting in place.
    fn process_option(&mut self, key: &str, value: &str) {
        let result: Result<(), String> = if key.eq_ignore_ascii_case(OPTION_FUZZY_CONTAINMENT_MATCHING)
        {
            value
                .parse::<bool>()
                .map(|flag| self.options.fuzzy_containment_matching = flag)
                .map_err(|err| err.to_string())
        } else if key.eq_ignore_ascii_case(OPTION_ORPHANS_AS_TOP_LEVEL) {
            value
                .parse::<bool>()
                .map(|flag| self.options.orphans_as_top_level = flag)
                .map_err(|err| err.to_string())
        } else if key.eq_ignore_ascii_case(OPTION_FUZZY_MATCHING_THRESHOLD) {
            value
                .parse::<u32>()
                .map(|threshold| self.options.fuzzy_matching_threshold = threshold)
                .map_err(|err| err.to_string())
        } else {
            Err("unknown option".to_string())
        };
        if let Err(message) = result {
            self.add_warning(format!("Could not process option {key}: {message}"));
        }
    }

    fn end_document(&mut self) -> Result<(), FlexmodError> {
        if !self.stack.is_empty() {
            return Err(FlexmodError::StreamAt(
                self.current_line,
                format!("end of document with {} unclosed element(s)", self.stack.len()),
            ));
        }
        self.resolve_references();
        self.run_scripts();
        Ok(())
    }

    fn run_scripts(&mut self) {
        let scripts = std::mem::take(&mut self.scripts);
        if scripts.is_empty() {
            return;
        }
        let Some(engine) = self.script_engine.as_mut() else {
            tracing::warn!(
                "{} script(s) registered but no script engine is installed",
                scripts.len()
            );
            return;
        };
        for script in scripts {
            match engine.run(&script, &self.graph) {
                Ok(()) => {}
                Err(ScriptError::Syntax(problem)) => {
                    // A script that does not even parse is a document
                    // problem; report it and run nothing further.
                    self.warnings
                        .push(ParseWarning::new(problem, self.current_line));
                    return;
                }
                Err(ScriptError::Runtime(err)) => {
                    // The parse itself already succeeded.
                    tracing::debug!("Ignoring script runtime failure: {err}");
                }
            }
        }
    }

    pub(crate) fn add_warning(&mut self, message: String) {
        tracing::debug!("parse warning at line {}: {}", self.current_line, message);
        self.warnings
            .push(ParseWarning::new(message, self.current_line));
    }

    /// Resolve an element name to a concrete class across the active
    /// namespaces. Successful lookups are memoized for the session.
    pub(crate) fn class_for_name(&mut self, name: &str) -> Option<ClassId> {
        if let Some(class) = self.class_by_name.get(name) {
            return Some(*class);
        }
        let candidates = self.named_candidates(self.schema.concrete_classes());
        let class = matcher::resolve_name(name, &candidates, self.options.fuzzy_matching_threshold);
        if let Some(class) = class {
            self.class_by_name.insert(name.to_string(), class);
        }
        class
    }

    /// Concrete classes conforming to `class`: its strict concrete
    /// subtypes in registration order, then `class` itself when concrete.
    /// Memoized for the session.
    pub(crate) fn subtypes_of(&mut self, class: ClassId) -> Vec<ClassId> {
        if let Some(subtypes) = self.subtypes_cache.get(&class) {
            return subtypes.clone();
        }
        let concrete = self.schema.concrete_classes();
        let mut subtypes: Vec<ClassId> = concrete
            .iter()
            .copied()
            .filter(|candidate| {
                *candidate != class && self.schema.supertypes(*candidate).contains(&class)
            })
            .collect();
        if concrete.contains(&class) {
            subtypes.push(class);
        }
        self.subtypes_cache.insert(class, subtypes.clone());
        subtypes
    }

    /// Whether an instance of `class` conforms to `target`.
    pub(crate) fn conforms(&mut self, class: ClassId, target: ClassId) -> bool {
        self.subtypes_of(target).contains(&class)
    }

    pub(crate) fn named_candidates(&self, classes: Vec<ClassId>) -> Vec<(String, ClassId)> {
        classes
            .into_iter()
            .map(|class| (self.schema.class_name(class), class))
            .collect()
    }
}
