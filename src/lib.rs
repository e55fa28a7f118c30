//! # flexmod-core
//!
//! A schema-flexible model loading engine: parses a terse, forgiving
//! notation into a typed object graph validated against a reflective class
//! schema.
//!
//! ## Overview
//!
//! flexmod-core consumes a stream of structural events (element open/close,
//! processing instructions) and maps it onto instances of an externally
//! supplied metamodel. Its distinguishing feature is that document names do
//! not have to match schema names exactly:
//!
//! - **Fuzzy name matching**: element and attribute names are resolved
//!   against class and feature names with exact-first, fuzzy-fallback
//!   matching (longest-common-substring scoring with a configurable
//!   threshold)
//! - **Containment inference**: child elements are placed into the right
//!   containment reference by name or by type, first declared match wins
//! - **Deferred references**: reference-valued attributes resolve after the
//!   whole document is seen, so forward references and the `*` wildcard
//!   ("all instances of the target type") just work
//! - **Error tolerance**: unmappable elements and attributes produce
//!   warnings and partial results, never hard failures
//! - **Source traceability**: every object is traced to the line it was
//!   last touched at, in both directions, for editor integration
//!
//! ## Quick Start
//!
//! ```rust
//! use flexmod_core::{
//!     event::{Attribute, ParseEvent},
//!     loader::DocumentLoader,
//!     schema::{AttrType, ClassDef, FeatureDef, PackageSet, SchemaPackage},
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), flexmod_core::FlexmodError> {
//! let package = SchemaPackage::new(
//!     "http://example.org/library",
//!     vec![
//!         ClassDef::new("Library")
//!             .feature(FeatureDef::id_attribute("name", AttrType::Str))
//!             .feature(FeatureDef::containment("books", "Book").many()),
//!         ClassDef::new("Book").feature(FeatureDef::attribute("title", AttrType::Str)),
//!     ],
//! )?;
//!
//! let mut loader = DocumentLoader::new(PackageSet::with_package(Arc::new(package)));
//! let result = loader.load_events(vec![
//!     ParseEvent::StartElement {
//!         name: "library".to_string(),
//!         attributes: vec![Attribute::new("name", "main")],
//!         line: 1,
//!     },
//!     // "booke" still maps to Book: fuzzy matching tolerates the typo.
//!     ParseEvent::StartElement {
//!         name: "booke".to_string(),
//!         attributes: vec![Attribute::new("title", "Dune")],
//!         line: 2,
//!     },
//!     ParseEvent::EndElement { name: "booke".to_string(), line: 2 },
//!     ParseEvent::EndElement { name: "library".to_string(), line: 3 },
//!     ParseEvent::EndDocument { line: 3 },
//! ])?;
//!
//! assert_eq!(result.graph.roots().len(), 1);
//! assert!(result.warnings.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **[`schema`]**: the reflective schema contract ([`schema::SchemaProvider`]),
//!   the in-memory package implementation and the global package registry
//! - **[`loader`]**: the parse session ([`loader::DocumentLoader`]), element
//!   dispatch state machine, name matcher, reference resolver, diagnostics
//!   and trace maps
//! - **[`model`]**: the produced object graph ([`model::ModelGraph`])
//! - **[`event`]**: the structural event vocabulary; any streaming
//!   element/attribute parser can act as the event source
//! - **[`script`]**: the injected post-parse scripting collaborator
//!
//! The engine is strictly single-threaded and synchronous per parse;
//! re-parsing re-runs the pipeline from a cleared state. See
//! [`loader::DocumentLoader`] for the session model.

pub mod error;
pub mod event;
pub mod loader;
pub mod model;
pub mod schema;
pub mod script;
#[cfg(test)]
mod tests;

pub use error::*;
