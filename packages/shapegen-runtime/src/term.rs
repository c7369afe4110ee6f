//! RDF Terms
//!
//! Named nodes, blank nodes, literals and the identifier sum type shared by
//! every generated codec. Blank nodes carry their label without the `_:`
//! prefix; the prefix only appears in textual (document) form.

use std::fmt;

use crate::vocab::{rdf, xsd};

/// Prefix marking a local (blank) identifier in textual form
pub const BLANK_NODE_PREFIX: &str = "_:";

// =============================================================================
// Named Node
// =============================================================================

/// A global identifier (IRI)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamedNode(String);

impl NamedNode {
    pub fn new(iri: impl Into<String>) -> Self {
        Self(iri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

// =============================================================================
// Blank Node
// =============================================================================

/// A local identifier with no meaning outside its dataset
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlankNode(String);

impl BlankNode {
    /// Create from a label; a leading `_:` is stripped
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        match label.strip_prefix(BLANK_NODE_PREFIX) {
            Some(stripped) => Self(stripped.to_string()),
            None => Self(label),
        }
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", BLANK_NODE_PREFIX, self.0)
    }
}

// =============================================================================
// Identifier
// =============================================================================

/// Either kind of node identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Identifier {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
}

impl Identifier {
    /// Parse the textual form: `_:label` is local, anything else is an IRI
    pub fn parse(text: &str) -> Self {
        if text.starts_with(BLANK_NODE_PREFIX) {
            Self::BlankNode(BlankNode::new(text))
        } else {
            Self::NamedNode(NamedNode::new(text))
        }
    }

    /// Textual form used in documents
    pub fn to_text(&self) -> String {
        match self {
            Self::NamedNode(node) => node.as_str().to_string(),
            Self::BlankNode(node) => node.to_string(),
        }
    }

    pub fn as_named_node(&self) -> Option<&NamedNode> {
        match self {
            Self::NamedNode(node) => Some(node),
            Self::BlankNode(_) => None,
        }
    }

    pub fn as_blank_node(&self) -> Option<&BlankNode> {
        match self {
            Self::BlankNode(node) => Some(node),
            Self::NamedNode(_) => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(node) => node.fmt(f),
            Self::BlankNode(node) => node.fmt(f),
        }
    }
}

impl From<NamedNode> for Identifier {
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<BlankNode> for Identifier {
    fn from(node: BlankNode) -> Self {
        Self::BlankNode(node)
    }
}

// =============================================================================
// Literal
// =============================================================================

/// A literal value with datatype and optional language tag
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    value: String,
    datatype: NamedNode,
    language: Option<String>,
}

impl Literal {
    /// A plain `xsd:string` literal
    pub fn new_simple(value: impl Into<String>) -> Self {
        Self::new_typed(value, NamedNode::new(xsd::STRING))
    }

    pub fn new_typed(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self {
            value: value.into(),
            datatype,
            language: None,
        }
    }

    /// A language-tagged string; the tag is normalized to lowercase
    pub fn new_language_tagged(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: NamedNode::new(rdf::LANG_STRING),
            language: Some(language.into().to_ascii_lowercase()),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn datatype(&self) -> &NamedNode {
        &self.datatype
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.value.replace('\\', "\\\\").replace('"', "\\\""))?;
        match &self.language {
            Some(language) => write!(f, "@{}", language),
            None if self.datatype.as_str() == xsd::STRING => Ok(()),
            None => write!(f, "^^{}", self.datatype),
        }
    }
}

// =============================================================================
// Term
// =============================================================================

/// Kind of a term, hashed ahead of its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    NamedNode,
    BlankNode,
    Literal,
}

impl TermKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NamedNode => "NamedNode",
            Self::BlankNode => "BlankNode",
            Self::Literal => "Literal",
        }
    }
}

/// Any value that can appear in the object position of a statement
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
}

impl Term {
    pub fn kind(&self) -> TermKind {
        match self {
            Self::NamedNode(_) => TermKind::NamedNode,
            Self::BlankNode(_) => TermKind::BlankNode,
            Self::Literal(_) => TermKind::Literal,
        }
    }

    /// The term as a node identifier, if it is one
    pub fn as_identifier(&self) -> Option<Identifier> {
        match self {
            Self::NamedNode(node) => Some(Identifier::NamedNode(node.clone())),
            Self::BlankNode(node) => Some(Identifier::BlankNode(node.clone())),
            Self::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::NamedNode(node) if node.as_str() == rdf::NIL)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(node) => node.fmt(f),
            Self::BlankNode(node) => node.fmt(f),
            Self::Literal(literal) => literal.fmt(f),
        }
    }
}

impl From<NamedNode> for Term {
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Self::BlankNode(node)
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<Identifier> for Term {
    fn from(identifier: Identifier) -> Self {
        match identifier {
            Identifier::NamedNode(node) => Self::NamedNode(node),
            Identifier::BlankNode(node) => Self::BlankNode(node),
        }
    }
}
