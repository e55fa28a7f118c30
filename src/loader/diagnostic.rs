//! Diagnostic records produced during a load.
//!
//! Warnings are append-only and surfaced to the caller after the parse
//! completes; unresolved references additionally remain inspectable as
//! structured records for tooling that wants more than the warning text.

use serde::{Deserialize, Serialize};

use crate::{model::ObjectId, schema::FeatureId};

/// A non-fatal problem found while loading, with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub message: String,
    pub line: u32,
}

impl ParseWarning {
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        ParseWarning {
            message: message.into(),
            line,
        }
    }
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (line {})", self.message, self.line)
    }
}

/// A reference-valued attribute whose target was not known when the
/// attribute was processed.
///
/// Queued during attribute assignment, resolved in the end-of-document
/// pass. Entries still present after that pass produced exactly one
/// warning each and are handed to the caller for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    /// The object owning the reference feature.
    pub object: ObjectId,
    /// The reference feature the value belongs to.
    pub reference: FeatureId,
    /// The attribute name as written in the document (possibly a fuzzy
    /// variant of the declared feature name).
    pub attribute_name: String,
    /// The raw textual target: an identifier, or `*` for "every instance
    /// of the target type".
    pub value: String,
    /// 1-based line of the element that carried the attribute.
    pub line: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display_includes_line() {
        let warning = ParseWarning::new("Could not map element chapter to a model object", 7);
        assert_eq!(
            warning.to_string(),
            "Could not map element chapter to a model object (line 7)"
        );
    }
}
