//! Resource Readers and Writers
//!
//! `Resource` reads the statements about one subject; `MutableResource`
//! writes them. Generated graph decoders read each property through the
//! `Values` pipeline:
//!
//! ```text
//! values(predicate) -> filter_language -> unique -> require_in / require_has_value
//!                   -> default_value -> required | optional | set | list
//! ```

use std::collections::HashSet;

use tracing::trace;

use crate::dataset::{Dataset, Quad};
use crate::error::DecodeError;
use crate::identifier::mint_blank;
use crate::term::{Identifier, NamedNode, Term};
use crate::value::{FromTerm, ToTerm};
use crate::vocab::rdf;

// =============================================================================
// Options
// =============================================================================

/// Options threaded through generated graph decoders
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FromRdfOptions {
    /// Skip type-tag validation at this level
    pub ignore_rdf_type: bool,
    /// Fail when a single-valued property has more than one statement
    pub unique_values: bool,
}

impl FromRdfOptions {
    /// Options for a parent's decoder called by a derived type
    pub fn delegated(self) -> Self {
        Self {
            ignore_rdf_type: true,
            ..self
        }
    }

    /// Options for the decoder of a nested object value
    pub fn nested(self) -> Self {
        Self {
            ignore_rdf_type: true,
            ..self
        }
    }

    /// Options for a union member's decoder; members validate their tags
    pub fn discriminating(self) -> Self {
        Self {
            ignore_rdf_type: false,
            ..self
        }
    }
}

/// Options threaded through generated graph encoders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToRdfOptions {
    /// Skip writing type tags at this level
    pub ignore_rdf_type: bool,
    /// Named graph to write into
    pub graph: Option<Identifier>,
}

impl ToRdfOptions {
    pub fn in_graph(graph: Identifier) -> Self {
        Self {
            ignore_rdf_type: false,
            graph: Some(graph),
        }
    }

    /// Options for the encoder of a nested object value
    pub fn nested(&self) -> Self {
        Self {
            ignore_rdf_type: false,
            graph: self.graph.clone(),
        }
    }
}

// =============================================================================
// Resource
// =============================================================================

/// Read-only view of one subject in a dataset
#[derive(Debug, Clone)]
pub struct Resource<'a> {
    dataset: &'a Dataset,
    identifier: Identifier,
}

impl<'a> Resource<'a> {
    pub fn new(dataset: &'a Dataset, identifier: Identifier) -> Self {
        Self { dataset, identifier }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// The identifier converted to a narrower identifier type
    pub fn identifier_as<I: FromTerm>(&self) -> Result<I, DecodeError> {
        I::from_term(&Term::from(self.identifier.clone())).ok_or_else(|| DecodeError::MistypedValue {
            subject: self.identifier.clone(),
            predicate: "@id".to_string(),
            expected: I::EXPECTED.to_string(),
            actual: self.identifier.to_string(),
        })
    }

    /// Fail unless the identifier is one of `allowed`
    pub fn require_identifier_in(&self, allowed: &[&str]) -> Result<(), DecodeError> {
        match &self.identifier {
            Identifier::NamedNode(node) if allowed.contains(&node.as_str()) => Ok(()),
            other => Err(DecodeError::MistypedValue {
                subject: self.identifier.clone(),
                predicate: "@id".to_string(),
                expected: format!("one of {}", allowed.join(", ")),
                actual: other.to_string(),
            }),
        }
    }

    pub fn has_rdf_type(&self, rdf_type: &str) -> bool {
        self.dataset
            .objects(&self.identifier, rdf::TYPE)
            .any(|t| matches!(t, Term::NamedNode(node) if node.as_str() == rdf_type))
    }

    /// Fail unless the subject carries the type tag
    pub fn require_rdf_type(&self, rdf_type: &str) -> Result<(), DecodeError> {
        if self.has_rdf_type(rdf_type) {
            return Ok(());
        }
        let actual: Vec<String> = self
            .dataset
            .objects(&self.identifier, rdf::TYPE)
            .map(|t| t.to_string())
            .collect();
        Err(DecodeError::MistypedValue {
            subject: self.identifier.clone(),
            predicate: rdf::TYPE.to_string(),
            expected: format!("<{}>", rdf_type),
            actual: if actual.is_empty() {
                "no type".to_string()
            } else {
                actual.join(", ")
            },
        })
    }

    /// All objects of `predicate` on this subject
    pub fn values(&self, predicate: &str) -> Values<'a> {
        Values {
            dataset: self.dataset,
            subject: self.identifier.clone(),
            predicate: predicate.to_string(),
            terms: self.dataset.objects(&self.identifier, predicate).cloned().collect(),
        }
    }
}

// =============================================================================
// Values
// =============================================================================

/// The objects of one predicate, on their way to a decoded property value
#[derive(Debug, Clone)]
pub struct Values<'a> {
    dataset: &'a Dataset,
    subject: Identifier,
    predicate: String,
    terms: Vec<Term>,
}

impl<'a> Values<'a> {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn mistyped(&self, expected: impl Into<String>, actual: &Term) -> DecodeError {
        DecodeError::MistypedValue {
            subject: self.subject.clone(),
            predicate: self.predicate.clone(),
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }

    fn value(&self, term: Term) -> TermValue<'a> {
        TermValue {
            dataset: self.dataset,
            subject: self.subject.clone(),
            predicate: self.predicate.clone(),
            term,
        }
    }

    /// Drop literals whose language tag is not in `languages`.
    /// Non-literal terms pass through untouched.
    pub fn filter_language(mut self, languages: &[&str]) -> Self {
        self.terms.retain(|term| match term.as_literal() {
            Some(literal) => literal
                .language()
                .map(|tag| languages.iter().any(|l| l.eq_ignore_ascii_case(tag)))
                .unwrap_or(false),
            None => true,
        });
        self
    }

    /// Fail on more than one value when `enforce` is set
    pub fn unique(self, enforce: bool) -> Result<Self, DecodeError> {
        if enforce && self.terms.len() > 1 {
            return Err(DecodeError::MistypedValue {
                subject: self.subject.clone(),
                predicate: self.predicate.clone(),
                expected: "a single value".to_string(),
                actual: format!("{} values", self.terms.len()),
            });
        }
        Ok(self)
    }

    /// Fail if any value is outside `allowed`
    pub fn require_in(self, allowed: &[Term]) -> Result<Self, DecodeError> {
        if let Some(term) = self.terms.iter().find(|t| !allowed.contains(t)) {
            let expected = format!(
                "one of {}",
                allowed.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
            );
            return Err(self.mistyped(expected, term));
        }
        Ok(self)
    }

    /// Fail unless `value` is among the values
    pub fn require_has_value(self, value: &Term) -> Result<Self, DecodeError> {
        if self.terms.contains(value) {
            return Ok(self);
        }
        let actual = self
            .terms
            .first()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "no value".to_string());
        Err(DecodeError::MistypedValue {
            subject: self.subject.clone(),
            predicate: self.predicate.clone(),
            expected: value.to_string(),
            actual,
        })
    }

    /// Substitute `default` when there is no value
    pub fn default_value(mut self, default: Term) -> Self {
        if self.terms.is_empty() {
            self.terms.push(default);
        }
        self
    }

    /// Exactly one value is expected; the first in dataset order is taken
    pub fn required<T>(
        self,
        decode: impl FnOnce(TermValue<'a>) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        let expected = "a value".to_string();
        let subject = self.subject.clone();
        let predicate = self.predicate.clone();
        match self.terms.first().cloned() {
            Some(term) => decode(self.value(term)),
            None => Err(DecodeError::MissingValue {
                subject,
                predicate,
                expected,
            }),
        }
    }

    pub fn optional<T>(
        self,
        decode: impl FnOnce(TermValue<'a>) -> Result<T, DecodeError>,
    ) -> Result<Option<T>, DecodeError> {
        match self.terms.first().cloned() {
            Some(term) => decode(self.value(term)).map(Some),
            None => Ok(None),
        }
    }

    /// Every value, unordered
    pub fn set<T>(
        self,
        allow_empty: bool,
        mut decode: impl FnMut(TermValue<'a>) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        if self.terms.is_empty() && !allow_empty {
            return Err(self.empty_sequence());
        }
        self.terms
            .iter()
            .map(|term| decode(self.value(term.clone())))
            .collect()
    }

    /// Walk the `rdf:first`/`rdf:rest` chain from the single list head.
    /// Links may carry an `rdf:type rdf:List` tag; it is neither required nor checked.
    pub fn list<T>(
        self,
        allow_empty: bool,
        mut decode: impl FnMut(TermValue<'a>) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        let Some(head) = self.terms.first().cloned() else {
            return if allow_empty {
                Ok(Vec::new())
            } else {
                Err(self.empty_sequence())
            };
        };

        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut link = head;
        while !link.is_nil() {
            let Some(identifier) = link.as_identifier() else {
                return Err(self.mistyped("list link", &link));
            };
            if !visited.insert(identifier.clone()) {
                return Err(self.mistyped("acyclic list", &link));
            }
            let link_resource = Resource::new(self.dataset, identifier);
            let first = link_resource.values(rdf::FIRST).required(Ok)?;
            items.push(decode(self.value(first.term))?);
            link = link_resource.values(rdf::REST).required(|v| Ok(v.term))?;
        }
        trace!(predicate = %self.predicate, len = items.len(), "decoded list");

        if items.is_empty() && !allow_empty {
            return Err(self.empty_sequence());
        }
        Ok(items)
    }

    fn empty_sequence(&self) -> DecodeError {
        DecodeError::EmptySequence {
            subject: self.subject.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

/// A single object term with enough context to report errors
#[derive(Debug, Clone)]
pub struct TermValue<'a> {
    dataset: &'a Dataset,
    subject: Identifier,
    predicate: String,
    term: Term,
}

impl<'a> TermValue<'a> {
    pub fn term(&self) -> &Term {
        &self.term
    }

    /// Convert to a scalar value
    pub fn to<T: FromTerm>(&self) -> Result<T, DecodeError> {
        T::from_term(&self.term).ok_or_else(|| DecodeError::MistypedValue {
            subject: self.subject.clone(),
            predicate: self.predicate.clone(),
            expected: T::EXPECTED.to_string(),
            actual: self.term.to_string(),
        })
    }

    /// View the value as a nested resource
    pub fn resource(&self) -> Result<Resource<'a>, DecodeError> {
        match self.term.as_identifier() {
            Some(identifier) => Ok(Resource::new(self.dataset, identifier)),
            None => Err(DecodeError::MistypedValue {
                subject: self.subject.clone(),
                predicate: self.predicate.clone(),
                expected: "IRI or blank node".to_string(),
                actual: self.term.to_string(),
            }),
        }
    }
}

// =============================================================================
// Mutable Resource
// =============================================================================

/// Writer for the statements about one subject
#[derive(Debug)]
pub struct MutableResource<'a> {
    dataset: &'a mut Dataset,
    identifier: Identifier,
    graph: Option<Identifier>,
}

impl<'a> MutableResource<'a> {
    pub fn new(dataset: &'a mut Dataset, identifier: Identifier, graph: Option<Identifier>) -> Self {
        Self {
            dataset,
            identifier,
            graph,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// The underlying dataset, for encoding nested values
    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut *self.dataset
    }

    /// Options for encoding a nested value into the same graph
    pub fn nested_options(&self) -> ToRdfOptions {
        ToRdfOptions {
            ignore_rdf_type: false,
            graph: self.graph.clone(),
        }
    }

    pub fn add<T: ToTerm + ?Sized>(&mut self, predicate: &str, value: &T) {
        let quad = Quad::new(
            self.identifier.clone(),
            NamedNode::new(predicate),
            value.to_term(),
            self.graph.clone(),
        );
        self.dataset.insert(quad);
    }

    /// Add unless the value equals the declared default
    pub fn add_unless_default<T: ToTerm + PartialEq + ?Sized>(&mut self, predicate: &str, value: &T, default: &T) {
        if value != default {
            self.add(predicate, value);
        }
    }

    pub fn add_rdf_type(&mut self, rdf_type: &str) {
        self.add(rdf::TYPE, &NamedNode::new(rdf_type));
    }

    /// Encode `items` as an RDF list. Each link is a fresh blank node tagged
    /// `rdf:List`; an empty list is `rdf:nil`.
    pub fn add_list<T>(
        &mut self,
        predicate: &str,
        items: &[T],
        mut encode: impl FnMut(&T, &mut Dataset) -> Term,
    ) {
        if items.is_empty() {
            self.add(predicate, &NamedNode::new(rdf::NIL));
            return;
        }

        let links: Vec<Identifier> = items.iter().map(|_| Identifier::from(mint_blank())).collect();
        self.add(predicate, &links[0]);
        for (index, item) in items.iter().enumerate() {
            let object = encode(item, &mut *self.dataset);
            let rest = match links.get(index + 1) {
                Some(next) => Term::from(next.clone()),
                None => Term::from(NamedNode::new(rdf::NIL)),
            };
            let link = &links[index];
            let graph = self.graph.clone();
            self.dataset.insert(Quad::new(
                link.clone(),
                NamedNode::new(rdf::TYPE),
                Term::from(NamedNode::new(rdf::LIST)),
                graph.clone(),
            ));
            self.dataset
                .insert(Quad::new(link.clone(), NamedNode::new(rdf::FIRST), object, graph.clone()));
            self.dataset
                .insert(Quad::new(link.clone(), NamedNode::new(rdf::REST), rest, graph));
        }
    }
}
