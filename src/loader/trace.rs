//! Bidirectional object/source-line association.
//!
//! Both maps are rebuilt from scratch on every load. The forward map
//! records where an object was last touched (creation, attribute
//! assignment, or close tag); the reverse map keeps the most recently
//! touched object per line, which is what an editor wants when the cursor
//! sits on that line.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ObjectId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTrace {
    object_to_line: BTreeMap<ObjectId, u32>,
    line_to_object: BTreeMap<u32, ObjectId>,
}

impl ObjectTrace {
    /// Record that `object` was touched at `line`. Overwrites both
    /// directions: last touch wins.
    pub fn record(&mut self, object: ObjectId, line: u32) {
        self.object_to_line.insert(object, line);
        self.line_to_object.insert(line, object);
    }

    /// The line `object` was last touched at.
    pub fn line_of(&self, object: ObjectId) -> Option<u32> {
        self.object_to_line.get(&object).copied()
    }

    /// The most recently touched object on `line`.
    pub fn object_at(&self, line: u32) -> Option<ObjectId> {
        self.line_to_object.get(&line).copied()
    }

    pub fn clear(&mut self) {
        self.object_to_line.clear();
        self.line_to_object.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.object_to_line.is_empty()
    }
}
