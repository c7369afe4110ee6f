//! Term Conversions
//!
//! Scalar property values convert to and from terms through these traits.
//! `ToTerm` is implemented for unsized `str` so that accessors returning
//! `&str` can be written without allocation.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::term::{BlankNode, Identifier, Literal, NamedNode, Term};
use crate::vocab::{rdf, xsd};

/// Encode a value as a term
pub trait ToTerm {
    fn to_term(&self) -> Term;
}

/// Decode a value from a term
pub trait FromTerm: Sized {
    /// Human-readable description used in mistyped-value errors
    const EXPECTED: &'static str;

    fn from_term(term: &Term) -> Option<Self>;
}

impl<T: ToTerm + ?Sized> ToTerm for &T {
    fn to_term(&self) -> Term {
        (**self).to_term()
    }
}

fn typed(value: impl Into<String>, datatype: &str) -> Term {
    Term::Literal(Literal::new_typed(value, NamedNode::new(datatype)))
}

fn literal_with_datatype<'a>(term: &'a Term, datatypes: &[&str]) -> Option<&'a str> {
    let literal = term.as_literal()?;
    if datatypes.contains(&literal.datatype().as_str()) {
        Some(literal.value())
    } else {
        None
    }
}

// =============================================================================
// Strings
// =============================================================================

impl ToTerm for str {
    fn to_term(&self) -> Term {
        Term::Literal(Literal::new_simple(self))
    }
}

impl ToTerm for String {
    fn to_term(&self) -> Term {
        self.as_str().to_term()
    }
}

impl FromTerm for String {
    const EXPECTED: &'static str = "string literal";

    fn from_term(term: &Term) -> Option<Self> {
        literal_with_datatype(term, &[xsd::STRING, rdf::LANG_STRING]).map(str::to_string)
    }
}

// =============================================================================
// Booleans and Numbers
// =============================================================================

impl ToTerm for bool {
    fn to_term(&self) -> Term {
        typed(self.to_string(), xsd::BOOLEAN)
    }
}

impl FromTerm for bool {
    const EXPECTED: &'static str = "xsd:boolean literal";

    fn from_term(term: &Term) -> Option<Self> {
        match literal_with_datatype(term, &[xsd::BOOLEAN])? {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ToTerm for i64 {
    fn to_term(&self) -> Term {
        typed(self.to_string(), xsd::INTEGER)
    }
}

impl FromTerm for i64 {
    const EXPECTED: &'static str = "xsd:integer literal";

    fn from_term(term: &Term) -> Option<Self> {
        let integer_types = [
            xsd::INTEGER,
            "http://www.w3.org/2001/XMLSchema#int",
            "http://www.w3.org/2001/XMLSchema#long",
        ];
        literal_with_datatype(term, &integer_types)?.trim().parse().ok()
    }
}

impl ToTerm for f64 {
    fn to_term(&self) -> Term {
        typed(self.to_string(), xsd::DOUBLE)
    }
}

impl FromTerm for f64 {
    const EXPECTED: &'static str = "xsd:double literal";

    fn from_term(term: &Term) -> Option<Self> {
        let numeric_types = [
            xsd::DOUBLE,
            xsd::INTEGER,
            "http://www.w3.org/2001/XMLSchema#decimal",
            "http://www.w3.org/2001/XMLSchema#float",
        ];
        literal_with_datatype(term, &numeric_types)?.trim().parse().ok()
    }
}

// =============================================================================
// Dates
// =============================================================================

impl ToTerm for NaiveDate {
    fn to_term(&self) -> Term {
        typed(self.format("%Y-%m-%d").to_string(), xsd::DATE)
    }
}

impl FromTerm for NaiveDate {
    const EXPECTED: &'static str = "xsd:date literal";

    fn from_term(term: &Term) -> Option<Self> {
        NaiveDate::parse_from_str(literal_with_datatype(term, &[xsd::DATE])?, "%Y-%m-%d").ok()
    }
}

impl ToTerm for DateTime<Utc> {
    fn to_term(&self) -> Term {
        typed(self.to_rfc3339_opts(SecondsFormat::AutoSi, true), xsd::DATE_TIME)
    }
}

impl FromTerm for DateTime<Utc> {
    const EXPECTED: &'static str = "xsd:dateTime literal";

    fn from_term(term: &Term) -> Option<Self> {
        DateTime::parse_from_rfc3339(literal_with_datatype(term, &[xsd::DATE_TIME])?)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// =============================================================================
// Terms
// =============================================================================

impl ToTerm for NamedNode {
    fn to_term(&self) -> Term {
        Term::NamedNode(self.clone())
    }
}

impl FromTerm for NamedNode {
    const EXPECTED: &'static str = "IRI";

    fn from_term(term: &Term) -> Option<Self> {
        match term {
            Term::NamedNode(node) => Some(node.clone()),
            _ => None,
        }
    }
}

impl ToTerm for BlankNode {
    fn to_term(&self) -> Term {
        Term::BlankNode(self.clone())
    }
}

impl FromTerm for BlankNode {
    const EXPECTED: &'static str = "blank node";

    fn from_term(term: &Term) -> Option<Self> {
        match term {
            Term::BlankNode(node) => Some(node.clone()),
            _ => None,
        }
    }
}

impl ToTerm for Identifier {
    fn to_term(&self) -> Term {
        Term::from(self.clone())
    }
}

impl FromTerm for Identifier {
    const EXPECTED: &'static str = "IRI or blank node";

    fn from_term(term: &Term) -> Option<Self> {
        term.as_identifier()
    }
}

impl ToTerm for Literal {
    fn to_term(&self) -> Term {
        Term::Literal(self.clone())
    }
}

impl FromTerm for Literal {
    const EXPECTED: &'static str = "literal";

    fn from_term(term: &Term) -> Option<Self> {
        term.as_literal().cloned()
    }
}

impl ToTerm for Term {
    fn to_term(&self) -> Term {
        self.clone()
    }
}

impl FromTerm for Term {
    const EXPECTED: &'static str = "term";

    fn from_term(term: &Term) -> Option<Self> {
        Some(term.clone())
    }
}
