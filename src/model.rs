//! The in-memory object graph produced by a load.
//!
//! Objects live in an arena owned by [`ModelGraph`] and are addressed by
//! [`ObjectId`]. Containment children are owned through their parent's
//! feature slots; non-containment references point at arena ids without
//! ownership. The whole graph is dropped as one unit; there is no
//! per-object deletion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::{ClassId, FeatureId};

/// Index of an object in a [`ModelGraph`] arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ObjectId(pub u32);

/// A converted scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Str(v) => write!(f, "{v}"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// The value held in one feature slot of a [`ModelObject`].
///
/// Containment children ([`Value::Child`]/[`Value::Children`]) are kept
/// distinct from non-owning references ([`Value::Ref`]/[`Value::Refs`]) so
/// document-order traversal never needs to consult the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Scalar(Scalar),
    Scalars(Vec<Scalar>),
    Child(ObjectId),
    Children(Vec<ObjectId>),
    Ref(ObjectId),
    Refs(Vec<ObjectId>),
}

/// One parsed object: its class plus the feature slots assigned so far.
///
/// Created once per mapped element and mutated incrementally as attributes
/// are processed and deferred references resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelObject {
    pub class: ClassId,
    pub slots: BTreeMap<FeatureId, Value>,
}

impl ModelObject {
    pub fn new(class: ClassId) -> Self {
        ModelObject {
            class,
            slots: BTreeMap::new(),
        }
    }

    pub fn get(&self, feature: FeatureId) -> Option<&Value> {
        self.slots.get(&feature)
    }

    /// Scalar slot accessor for single-valued attributes.
    pub fn scalar(&self, feature: FeatureId) -> Option<&Scalar> {
        match self.slots.get(&feature) {
            Some(Value::Scalar(scalar)) => Some(scalar),
            _ => None,
        }
    }

    pub fn set_scalar(&mut self, feature: FeatureId, value: Scalar) {
        self.slots.insert(feature, Value::Scalar(value));
    }

    pub fn push_scalar(&mut self, feature: FeatureId, value: Scalar) {
        match self.slots.entry(feature).or_insert_with(|| Value::Scalars(vec![])) {
            Value::Scalars(values) => values.push(value),
            slot => *slot = Value::Scalars(vec![value]),
        }
    }

    pub fn set_child(&mut self, feature: FeatureId, child: ObjectId) {
        self.slots.insert(feature, Value::Child(child));
    }

    pub fn push_child(&mut self, feature: FeatureId, child: ObjectId) {
        match self.slots.entry(feature).or_insert_with(|| Value::Children(vec![])) {
            Value::Children(children) => children.push(child),
            slot => *slot = Value::Children(vec![child]),
        }
    }

    pub fn set_ref(&mut self, feature: FeatureId, target: ObjectId) {
        self.slots.insert(feature, Value::Ref(target));
    }

    pub fn push_ref(&mut self, feature: FeatureId, target: ObjectId) {
        match self.slots.entry(feature).or_insert_with(|| Value::Refs(vec![])) {
            Value::Refs(targets) => targets.push(target),
            slot => *slot = Value::Refs(vec![target]),
        }
    }

    /// Containment children of this object, in slot order.
    pub fn children(&self) -> Vec<ObjectId> {
        let mut out = Vec::new();
        for value in self.slots.values() {
            match value {
                Value::Child(child) => out.push(*child),
                Value::Children(children) => out.extend(children.iter().copied()),
                _ => {}
            }
        }
        out
    }
}

/// The finished (or in-progress) object graph: an arena of objects plus
/// the document root content list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelGraph {
    objects: Vec<ModelObject>,
    roots: Vec<ObjectId>,
}

impl ModelGraph {
    /// Move `object` into the arena, returning its id.
    pub fn insert(&mut self, object: ModelObject) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    pub fn add_root(&mut self, id: ObjectId) {
        self.roots.push(id);
    }

    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Borrow an object.
    ///
    /// Panics when `id` did not come from this graph.
    pub fn object(&self, id: ObjectId) -> &ModelObject {
        &self.objects[id.0 as usize]
    }

    pub fn object_mut(&mut self, id: ObjectId) -> &mut ModelObject {
        &mut self.objects[id.0 as usize]
    }

    pub fn class_of(&self, id: ObjectId) -> ClassId {
        self.object(id).class
    }

    /// Every object reachable from the roots through containment, in
    /// document traversal order (roots in order, depth-first through each
    /// object's children).
    pub fn all_contents(&self) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut pending: Vec<ObjectId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            out.push(id);
            let children = self.object(id).children();
            pending.extend(children.into_iter().rev());
        }
        out
    }
}
