use serde::{Deserialize, Serialize};

/// A raw attribute as it appeared on an element open tag.
///
/// The name is a local name: event sources are expected to strip namespace
/// prefixes from attribute names before emitting the event. Element names
/// keep their prefix and are stripped by the mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Structural events consumed by the [`DocumentLoader`](crate::loader::DocumentLoader).
///
/// The engine deliberately does not include a tokenizer: any streaming
/// element/attribute parser (XML, or a tersified dialect of it) can act as
/// the event source by mapping its callbacks onto these variants. Every
/// event carries the 1-based source line reported by the source's locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseEvent {
    /// An element open tag, with its attributes in source order.
    StartElement {
        name: String,
        attributes: Vec<Attribute>,
        line: u32,
    },
    /// The matching close tag of the most recently opened element.
    EndElement { name: String, line: u32 },
    /// A `<?key value?>` style processing instruction.
    ProcessingInstruction {
        key: String,
        value: String,
        line: u32,
    },
    /// End of the document. Triggers reference resolution and script
    /// execution; no further events may follow.
    EndDocument { line: u32 },
}

impl ParseEvent {
    /// The 1-based source line this event was reported at.
    pub fn line(&self) -> u32 {
        match self {
            ParseEvent::StartElement { line, .. }
            | ParseEvent::EndElement { line, .. }
            | ParseEvent::ProcessingInstruction { line, .. }
            | ParseEvent::EndDocument { line } => *line,
        }
    }
}
