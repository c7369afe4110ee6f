//! Structural Hashing
//!
//! Generated `hash` routines feed a digest field by field in declaration
//! order. Absent optional values contribute nothing and nothing is
//! length-prefixed. Terms hash their kind first, then datatype, language
//! and lexical form.
//!
//! Sequences compare as multisets, so their elements are fed in digest
//! order rather than storage order: values that compare equal always hash
//! equal.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::term::{BlankNode, Identifier, Literal, NamedNode, Term, TermKind};

/// Byte sink for structural hashes. Every `sha2` digest is one.
pub trait ShapeHasher {
    fn update_bytes(&mut self, bytes: &[u8]);

    fn update_str(&mut self, text: &str) {
        self.update_bytes(text.as_bytes());
    }
}

impl<D: Digest> ShapeHasher for D {
    fn update_bytes(&mut self, bytes: &[u8]) {
        Digest::update(self, bytes);
    }
}

/// A value that can feed a structural hash
pub trait HashValue {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H);
}

impl<T: HashValue + ?Sized> HashValue for &T {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {
        (**self).hash_value(hasher)
    }
}

impl HashValue for str {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {
        hasher.update_str(self);
    }
}

impl HashValue for String {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {
        hasher.update_str(self);
    }
}

impl HashValue for bool {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {
        hasher.update_str(if *self { "true" } else { "false" });
    }
}

impl HashValue for i64 {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {
        hasher.update_str(&self.to_string());
    }
}

impl HashValue for f64 {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {
        hasher.update_str(&self.to_string());
    }
}

impl HashValue for NaiveDate {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {
        hasher.update_str(&self.format("%Y-%m-%d").to_string());
    }
}

impl HashValue for DateTime<Utc> {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {
        hasher.update_str(&self.to_rfc3339_opts(SecondsFormat::AutoSi, true));
    }
}

/// Feed every element of a sequence. Each element is hashed on its own
/// digest; the element digests are sorted and fed in that order.
pub fn hash_sequence<T, H: ShapeHasher + ?Sized>(
    items: &[T],
    hasher: &mut H,
    mut hash_item: impl FnMut(&T, &mut Sha256),
) {
    let mut digests: Vec<Vec<u8>> = items
        .iter()
        .map(|item| {
            let mut element = Sha256::new();
            hash_item(item, &mut element);
            element.finalize().to_vec()
        })
        .collect();
    digests.sort();
    for digest in &digests {
        hasher.update_bytes(digest);
    }
}

fn hash_kind<H: ShapeHasher + ?Sized>(kind: TermKind, hasher: &mut H) {
    hasher.update_str(kind.as_str());
}

impl HashValue for NamedNode {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {
        hash_kind(TermKind::NamedNode, hasher);
        hasher.update_str(self.as_str());
    }
}

impl HashValue for BlankNode {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {
        hash_kind(TermKind::BlankNode, hasher);
        hasher.update_str(self.label());
    }
}

impl HashValue for Identifier {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {
        match self {
            Self::NamedNode(node) => node.hash_value(hasher),
            Self::BlankNode(node) => node.hash_value(hasher),
        }
    }
}

impl HashValue for Literal {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {
        hash_kind(TermKind::Literal, hasher);
        hasher.update_str(self.datatype().as_str());
        if let Some(language) = self.language() {
            hasher.update_str(language);
        }
        hasher.update_str(self.value());
    }
}

impl HashValue for Term {
    fn hash_value<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {
        match self {
            Self::NamedNode(node) => node.hash_value(hasher),
            Self::BlankNode(node) => node.hash_value(hasher),
            Self::Literal(literal) => literal.hash_value(hasher),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::Sha256;

    fn digest(value: &impl HashValue) -> String {
        let mut hasher = Sha256::new();
        value.hash_value(&mut hasher);
        format!("{:x}", hasher.finalize())
    }

    #[test]
    fn test_hash_stable() {
        assert_eq!(digest(&"x"), digest(&"x".to_string()));
        assert_ne!(digest(&"x"), digest(&"y"));
    }

    #[test]
    fn test_term_kind_distinguishes() {
        let named = Term::NamedNode(NamedNode::new("a"));
        let blank = Term::BlankNode(BlankNode::new("a"));
        assert_ne!(digest(&named), digest(&blank));
    }

    #[test]
    fn test_sequence_order_independent() {
        let hash = |items: &[&str]| {
            let mut hasher = Sha256::new();
            hash_sequence(items, &mut hasher, |item, digest| item.hash_value(digest));
            format!("{:x}", hasher.finalize())
        };
        assert_eq!(hash(&["a", "b", "b"]), hash(&["b", "a", "b"]));
        assert_ne!(hash(&["a", "b"]), hash(&["a", "b", "b"]));
        assert_ne!(hash(&["ab"]), hash(&["a", "b"]));
    }

    #[test]
    fn test_literal_datatype_distinguishes() {
        let simple = Literal::new_simple("1");
        let integer = Literal::new_typed("1", NamedNode::new(crate::vocab::xsd::INTEGER));
        assert_ne!(digest(&simple), digest(&integer));
    }
}
