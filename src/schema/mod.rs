//! The reflective schema contract consumed by the loading engine.
//!
//! The engine never depends on a concrete metamodel representation. It sees
//! classes and structural features only through the opaque [`ClassId`] and
//! [`FeatureId`] handles of a [`SchemaProvider`], and asks the provider for
//! names, inheritance, feature metadata, instances and typed value
//! conversion. [`package`] supplies the in-memory implementation used by
//! tests and by hosts without their own metamodel infrastructure, and
//! [`registry`] holds the process-wide package registry consulted when a
//! document activates additional namespaces.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    error::FlexmodError,
    model::{ModelObject, Scalar},
};

pub mod package;
pub mod registry;

pub use package::{AttrType, ClassDef, FeatureDef, FeatureDefKind, SchemaPackage};
pub use registry::{PackageRegistry, PackageSet, PACKAGES};

/// Opaque handle to a class of a [`SchemaProvider`].
///
/// Handles are only meaningful to the provider that issued them and stay
/// valid for the lifetime of that provider, including across mid-parse
/// namespace activation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ClassId(pub u32);

/// Opaque handle to a structural feature of a [`SchemaProvider`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FeatureId(pub u32);

/// What kind of structural feature a [`FeatureId`] refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// A scalar attribute carrying converted values.
    Attribute {
        value_type: AttrType,
        /// Identifier-significant: single-valued assignments are indexed
        /// for later reference-resolution lookup.
        identifier: bool,
    },
    /// A reference to other objects.
    Reference {
        target: ClassId,
        /// Containment references own their targets and are populated via
        /// element nesting, never via attributes.
        containment: bool,
    },
}

/// Metadata of a structural feature, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub name: String,
    pub kind: FeatureKind,
    pub many: bool,
    pub changeable: bool,
}

impl FeatureInfo {
    /// Whether attribute text may be assigned to this feature: changeable,
    /// and either a scalar attribute or a non-containment reference.
    pub fn attribute_settable(&self) -> bool {
        self.changeable
            && match &self.kind {
                FeatureKind::Attribute { .. } => true,
                FeatureKind::Reference { containment, .. } => !containment,
            }
    }

    pub fn is_containment(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Reference {
                containment: true,
                ..
            }
        )
    }
}

/// A typed string-to-value conversion failure.
///
/// Surfaced to the document author as a
/// [`ParseWarning`](crate::loader::ParseWarning) naming the offending
/// attribute; never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ConvertError {
    #[error("Cannot convert '{value}' to {expected}")]
    Malformed { value: String, expected: String },
    #[error("Unknown literal '{value}' for enumeration {enumeration}")]
    UnknownLiteral { value: String, enumeration: String },
}

/// The reflective metamodel capability consumed by the engine.
///
/// Implementations must tolerate concurrent reads of whatever backing
/// registry they share; a single provider instance is otherwise used by one
/// load session at a time. Handle arguments must come from this provider;
/// implementations are free to panic on foreign handles.
pub trait SchemaProvider {
    /// Every concrete (instantiable) class across the active namespaces,
    /// in registration order.
    fn concrete_classes(&self) -> Vec<ClassId>;

    fn class_name(&self, class: ClassId) -> String;

    /// Transitive supertypes of `class`, root-most first.
    fn supertypes(&self, class: ClassId) -> Vec<ClassId>;

    /// Declared and inherited structural features of `class`, inherited
    /// features first, each group in declaration order.
    fn features(&self, class: ClassId) -> Vec<FeatureId>;

    fn feature_info(&self, feature: FeatureId) -> FeatureInfo;

    /// Create a fresh instance record. Fails for abstract classes.
    fn instantiate(&self, class: ClassId) -> Result<ModelObject, FlexmodError>;

    /// Convert raw attribute text to the typed value of `attribute`.
    fn convert(&self, attribute: FeatureId, raw: &str) -> Result<Scalar, ConvertError>;

    /// Make the package registered under `nsuri` visible to subsequent
    /// lookups. Returns false when no such package is known; previously
    /// issued handles stay valid either way.
    fn activate_namespace(&mut self, nsuri: &str) -> bool;
}
