//! Quad Dataset
//!
//! An ordered, duplicate-free set of quads. Ordering makes iteration (and so
//! decoding of single-valued properties with several candidates) deterministic.

use std::collections::BTreeSet;
use std::fmt;

use crate::term::{Identifier, NamedNode, Term};
use crate::vocab::rdf;

/// A statement, optionally scoped to a named graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quad {
    pub subject: Identifier,
    pub predicate: NamedNode,
    pub object: Term,
    pub graph: Option<Identifier>,
}

impl Quad {
    pub fn new(subject: Identifier, predicate: NamedNode, object: Term, graph: Option<Identifier>) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph,
        }
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(graph) = &self.graph {
            write!(f, " {}", graph)?;
        }
        write!(f, " .")
    }
}

/// In-memory quad store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    quads: BTreeSet<Quad>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a quad; returns false if it was already present
    pub fn insert(&mut self, quad: Quad) -> bool {
        self.quads.insert(quad)
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    pub fn contains(&self, quad: &Quad) -> bool {
        self.quads.contains(quad)
    }

    /// Objects of statements matching subject and predicate, in any graph
    pub fn objects<'a>(
        &'a self,
        subject: &'a Identifier,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.quads
            .iter()
            .filter(move |q| &q.subject == subject && q.predicate.as_str() == predicate)
            .map(|q| &q.object)
    }

    /// Subjects asserted to have the given type tag
    pub fn subjects_with_type(&self, rdf_type: &str) -> Vec<Identifier> {
        let mut subjects: Vec<Identifier> = self
            .quads
            .iter()
            .filter(|q| {
                q.predicate.as_str() == rdf::TYPE
                    && matches!(&q.object, Term::NamedNode(node) if node.as_str() == rdf_type)
            })
            .map(|q| q.subject.clone())
            .collect();
        subjects.dedup();
        subjects
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for quad in &self.quads {
            writeln!(f, "{}", quad)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Quad;
    type IntoIter = std::collections::btree_set::Iter<'a, Quad>;

    fn into_iter(self) -> Self::IntoIter {
        self.quads.iter()
    }
}

impl FromIterator<Quad> for Dataset {
    fn from_iter<T: IntoIterator<Item = Quad>>(iter: T) -> Self {
        Self {
            quads: iter.into_iter().collect(),
        }
    }
}
