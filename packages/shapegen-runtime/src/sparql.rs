//! Query Templates
//!
//! A small SPARQL algebra for the CONSTRUCT templates and WHERE patterns
//! that generated code assembles, plus text rendering.
//!
//! Variable names are `{prefix}_{suffix}`; nesting extends the prefix with
//! the property name so repeated nesting never collides.

use std::fmt::{self, Write as _};

use crate::term::{Literal, NamedNode, Term};
use crate::vocab::rdf;

// =============================================================================
// Terms and Triples
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SparqlTerm {
    Variable(String),
    NamedNode(NamedNode),
    Literal(Literal),
}

impl SparqlTerm {
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            _ => None,
        }
    }
}

impl From<Term> for SparqlTerm {
    fn from(term: Term) -> Self {
        match term {
            Term::NamedNode(node) => Self::NamedNode(node),
            Term::Literal(literal) => Self::Literal(literal),
            // Blank nodes in patterns behave as variables
            Term::BlankNode(node) => Self::Variable(format!("_bnode_{}", node.label())),
        }
    }
}

impl fmt::Display for SparqlTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(name) => write!(f, "?{}", name),
            Self::NamedNode(node) => node.fmt(f),
            Self::Literal(literal) => literal.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    Iri(NamedNode),
    /// `iri*` property path
    ZeroOrMore(NamedNode),
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(node) => node.fmt(f),
            Self::ZeroOrMore(node) => write!(f, "{}*", node),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: SparqlTerm,
    pub predicate: Predicate,
    pub object: SparqlTerm,
}

impl Triple {
    pub fn new(subject: SparqlTerm, predicate: &str, object: SparqlTerm) -> Self {
        Self {
            subject,
            predicate: Predicate::Iri(NamedNode::new(predicate)),
            object,
        }
    }

    pub fn path(subject: SparqlTerm, predicate: Predicate, object: SparqlTerm) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

// =============================================================================
// Patterns
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `LANG(?v) IN (...)`
    LangIn { variable: String, languages: Vec<String> },
    /// `?v IN (...)`
    In { variable: String, values: Vec<SparqlTerm> },
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LangIn { variable, languages } => {
                let tags: Vec<String> = languages.iter().map(|l| format!("\"{}\"", l)).collect();
                write!(f, "LANG(?{}) IN ({})", variable, tags.join(", "))
            }
            Self::In { variable, values } => {
                let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "?{} IN ({})", variable, values.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Bgp(Vec<Triple>),
    Optional(Vec<Pattern>),
    /// One group per alternative
    Union(Vec<Vec<Pattern>>),
    Filter(Expression),
}

fn write_patterns(out: &mut String, patterns: &[Pattern], indent: usize) -> fmt::Result {
    let pad = "  ".repeat(indent);
    for pattern in patterns {
        match pattern {
            Pattern::Bgp(triples) => {
                for triple in triples {
                    writeln!(out, "{}{}", pad, triple)?;
                }
            }
            Pattern::Optional(inner) => {
                writeln!(out, "{}OPTIONAL {{", pad)?;
                write_patterns(out, inner, indent + 1)?;
                writeln!(out, "{}}}", pad)?;
            }
            Pattern::Union(groups) => {
                for (index, group) in groups.iter().enumerate() {
                    if index > 0 {
                        writeln!(out, "{}UNION", pad)?;
                    }
                    writeln!(out, "{}{{", pad)?;
                    write_patterns(out, group, indent + 1)?;
                    writeln!(out, "{}}}", pad)?;
                }
            }
            Pattern::Filter(expression) => {
                writeln!(out, "{}FILTER({})", pad, expression)?;
            }
        }
    }
    Ok(())
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_patterns(&mut out, std::slice::from_ref(self), 0)?;
        f.write_str(&out)
    }
}

/// Render a CONSTRUCT query
pub fn construct_query(template: &[Triple], patterns: &[Pattern]) -> String {
    let mut out = String::from("CONSTRUCT {\n");
    for triple in template {
        out.push_str(&format!("  {}\n", triple));
    }
    out.push_str("}\nWHERE {\n");
    // Writing into a String cannot fail
    let _ = write_patterns(&mut out, patterns, 1);
    out.push_str("}\n");
    out
}

// =============================================================================
// Options
// =============================================================================

/// Where a generated fragment is positioned and how it names its variables
#[derive(Debug, Clone, PartialEq)]
pub struct SparqlOptions {
    pub subject: SparqlTerm,
    pub variable_prefix: String,
    /// Leave out the type-tag pattern at this level
    pub ignore_rdf_type: bool,
}

impl SparqlOptions {
    /// Fragment rooted at `?{name}`
    pub fn new(name: &str) -> Self {
        Self {
            subject: SparqlTerm::variable(name),
            variable_prefix: name.to_string(),
            ignore_rdf_type: false,
        }
    }

    /// Fragment rooted at a fixed subject, e.g. a known IRI
    pub fn for_subject(subject: SparqlTerm, variable_prefix: &str) -> Self {
        Self {
            subject,
            variable_prefix: variable_prefix.to_string(),
            ignore_rdf_type: false,
        }
    }

    pub fn variable(&self, suffix: &str) -> SparqlTerm {
        SparqlTerm::variable(self.variable_name(suffix))
    }

    pub fn variable_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.variable_prefix, suffix)
    }

    /// Options for a parent's fragment
    pub fn delegated(&self) -> Self {
        Self {
            ignore_rdf_type: true,
            ..self.clone()
        }
    }

    /// Options for the fragment of a nested object held by `property`
    pub fn nested(&self, property: &str) -> Self {
        Self {
            subject: self.variable(property),
            variable_prefix: self.variable_name(property),
            ignore_rdf_type: true,
        }
    }

    /// Options for one member group of a union
    pub fn member(&self, member: &str) -> Self {
        Self {
            subject: self.subject.clone(),
            variable_prefix: self.variable_name(member),
            ignore_rdf_type: false,
        }
    }
}

// =============================================================================
// List Skeleton
// =============================================================================

/// Fixed pattern matching an RDF list of any length, including empty.
/// Five variables per list:
///
/// ```text
/// ?s <p> ?head .
/// OPTIONAL {
///   ?head rdf:first ?item0 .
///   OPTIONAL {
///     ?head rdf:rest* ?link . ?link rdf:first ?itemN . ?link rdf:rest ?restN .
///   }
/// }
/// ```
///
/// The path admits zero hops, so `?link` also binds the head and every
/// cell of the list yields its `rdf:first` and `rdf:rest` statements.
#[derive(Debug, Clone)]
pub struct ListSkeleton {
    subject: SparqlTerm,
    prefix: String,
    pub head: SparqlTerm,
    pub first_item: SparqlTerm,
    pub link: SparqlTerm,
    pub tail_item: SparqlTerm,
    pub tail_rest: SparqlTerm,
}

impl ListSkeleton {
    pub fn new(options: &SparqlOptions, property: &str) -> Self {
        let prefix = options.variable_name(property);
        let var = |suffix: &str| SparqlTerm::variable(format!("{}_{}", prefix, suffix));
        Self {
            subject: options.subject.clone(),
            head: var("head"),
            first_item: var("item0"),
            link: var("link"),
            tail_item: var("itemN"),
            tail_rest: var("restN"),
            prefix,
        }
    }

    /// Options for nested patterns about the first item
    pub fn first_item_options(&self) -> SparqlOptions {
        SparqlOptions {
            subject: self.first_item.clone(),
            variable_prefix: format!("{}_item0", self.prefix),
            ignore_rdf_type: true,
        }
    }

    /// Options for nested patterns about the tail items
    pub fn tail_item_options(&self) -> SparqlOptions {
        SparqlOptions {
            subject: self.tail_item.clone(),
            variable_prefix: format!("{}_itemN", self.prefix),
            ignore_rdf_type: true,
        }
    }

    /// Every variable the skeleton binds, head first
    pub fn variables(&self) -> [&SparqlTerm; 5] {
        [&self.head, &self.first_item, &self.link, &self.tail_item, &self.tail_rest]
    }

    /// The whole skeleton inside one OPTIONAL block
    pub fn where_pattern(
        &self,
        predicate: &str,
        first_item_patterns: Vec<Pattern>,
        tail_item_patterns: Vec<Pattern>,
    ) -> Pattern {
        let mut tail = vec![Pattern::Bgp(vec![
            Triple::path(
                self.head.clone(),
                Predicate::ZeroOrMore(NamedNode::new(rdf::REST)),
                self.link.clone(),
            ),
            Triple::new(self.link.clone(), rdf::FIRST, self.tail_item.clone()),
            Triple::new(self.link.clone(), rdf::REST, self.tail_rest.clone()),
        ])];
        tail.extend(tail_item_patterns);

        let mut first = vec![Pattern::Bgp(vec![Triple::new(
            self.head.clone(),
            rdf::FIRST,
            self.first_item.clone(),
        )])];
        first.extend(first_item_patterns);
        first.push(Pattern::Optional(tail));

        Pattern::Optional(vec![
            Pattern::Bgp(vec![Triple::new(self.subject.clone(), predicate, self.head.clone())]),
            Pattern::Optional(first),
        ])
    }

    pub fn construct_triples(&self, predicate: &str) -> Vec<Triple> {
        vec![
            Triple::new(self.subject.clone(), predicate, self.head.clone()),
            Triple::new(self.head.clone(), rdf::FIRST, self.first_item.clone()),
            Triple::new(self.link.clone(), rdf::FIRST, self.tail_item.clone()),
            Triple::new(self.link.clone(), rdf::REST, self.tail_rest.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_options_prefix_variables() {
        let options = SparqlOptions::new("person");
        let nested = options.nested("address");
        assert_eq!(nested.subject, SparqlTerm::variable("person_address"));
        assert_eq!(nested.variable("street"), SparqlTerm::variable("person_address_street"));
        assert!(nested.ignore_rdf_type);

        let twice = nested.nested("address");
        assert_eq!(twice.subject, SparqlTerm::variable("person_address_address"));
    }

    #[test]
    fn test_member_options_keep_subject() {
        let options = SparqlOptions::new("shape");
        let member = options.member("Circle");
        assert_eq!(member.subject, options.subject);
        assert_eq!(member.variable_prefix, "shape_Circle");
        assert!(!member.ignore_rdf_type);
    }

    #[test]
    fn test_construct_query_rendering() {
        let options = SparqlOptions::new("s");
        let triple = Triple::new(options.subject.clone(), "http://example.com/p", options.variable("p"));
        let query = construct_query(
            &[triple.clone()],
            &[Pattern::Optional(vec![Pattern::Bgp(vec![triple])])],
        );
        assert!(query.starts_with("CONSTRUCT {\n  ?s <http://example.com/p> ?s_p .\n}"));
        assert!(query.contains("OPTIONAL {\n    ?s <http://example.com/p> ?s_p .\n  }"));
    }

    #[test]
    fn test_list_skeleton_shape() {
        let skeleton = ListSkeleton::new(&SparqlOptions::new("s"), "items");
        let pattern = skeleton.where_pattern("http://example.com/items", Vec::new(), Vec::new());
        let text = pattern.to_string();
        assert!(text.contains(&format!("?s_items_head <{}>* ?s_items_link .", rdf::REST)));
        assert!(!text.contains("rest0"));
        assert_eq!(skeleton.construct_triples("http://example.com/items").len(), 4);

        let names: Vec<String> = skeleton.variables().iter().map(|v| v.to_string()).collect();
        assert_eq!(
            names,
            vec!["?s_items_head", "?s_items_item0", "?s_items_link", "?s_items_itemN", "?s_items_restN"]
        );
    }
}
