//! Identifier Minting
//!
//! Instances that are not given an identifier mint one on first access and
//! keep it. Minting strategies:
//! - blank: process-local label, no stability across runs
//! - random: UUID v4 under `{namespace}{type}/`
//! - content hash: SHA-256 over namespace, type name and the instance's
//!   structural hash, so equal content yields equal identifiers

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use sha2::{Digest, Sha256};

use crate::term::{BlankNode, NamedNode};

// =============================================================================
// Lazy Identifier
// =============================================================================

/// Once-computed identifier cell
#[derive(Clone)]
pub struct LazyIdentifier<I> {
    cell: OnceLock<I>,
}

impl<I> LazyIdentifier<I> {
    /// An identifier that will be minted on first access
    pub fn new() -> Self {
        Self { cell: OnceLock::new() }
    }

    /// An identifier supplied up front
    pub fn resolved(identifier: I) -> Self {
        Self {
            cell: OnceLock::from(identifier),
        }
    }

    pub fn from_option(identifier: Option<I>) -> Self {
        match identifier {
            Some(identifier) => Self::resolved(identifier),
            None => Self::new(),
        }
    }

    /// The identifier, if it has been supplied or minted already
    pub fn get(&self) -> Option<&I> {
        self.cell.get()
    }

    /// The identifier, minting it with `mint` if this is the first access
    pub fn get_or_mint(&self, mint: impl FnOnce() -> I) -> &I {
        self.cell.get_or_init(mint)
    }
}

impl<I> Default for LazyIdentifier<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: fmt::Debug> fmt::Debug for LazyIdentifier<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(identifier) => write!(f, "{:?}", identifier),
            None => write!(f, "<unminted>"),
        }
    }
}

// =============================================================================
// Minting
// =============================================================================

static BLANK_COUNTER: AtomicU64 = AtomicU64::new(0);
static BLANK_PREFIX: OnceLock<String> = OnceLock::new();

/// Mint a process-local blank node
pub fn mint_blank() -> BlankNode {
    let prefix = BLANK_PREFIX.get_or_init(|| {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        simple.chars().take(8).collect()
    });
    let n = BLANK_COUNTER.fetch_add(1, Ordering::Relaxed);
    BlankNode::new(format!("b{}x{}", prefix, n))
}

/// Mint a random IRI scoped under the namespace and type name
pub fn mint_random(namespace: &str, type_name: &str) -> NamedNode {
    NamedNode::new(format!("{}{}/{}", namespace, type_name, uuid::Uuid::new_v4()))
}

/// Mint a deterministic IRI from the structural hash fed by `hash_fields`
pub fn mint_content_hash(
    namespace: &str,
    type_name: &str,
    hash_fields: impl FnOnce(&mut Sha256),
) -> NamedNode {
    let mut structural = Sha256::new();
    hash_fields(&mut structural);
    let structural = structural.finalize();

    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(type_name.as_bytes());
    hasher.update(format!("{:x}", structural).as_bytes());
    NamedNode::new(format!("{}{}/{:x}", namespace, type_name, hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_identifier_mints_once() {
        let lazy = LazyIdentifier::new();
        assert!(lazy.get().is_none());
        let first = lazy.get_or_mint(mint_blank).clone();
        let second = lazy.get_or_mint(mint_blank).clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolved_identifier_is_not_reminted() {
        let node = NamedNode::new("http://example.com/a");
        let lazy = LazyIdentifier::resolved(node.clone());
        assert_eq!(lazy.get_or_mint(|| NamedNode::new("http://example.com/b")), &node);
    }

    #[test]
    fn test_blank_nodes_are_unique() {
        assert_ne!(mint_blank(), mint_blank());
    }

    #[test]
    fn test_random_mint_scoped() {
        let a = mint_random("urn:example:", "Person");
        let b = mint_random("urn:example:", "Person");
        assert!(a.as_str().starts_with("urn:example:Person/"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_content_hash_deterministic() {
        let a = mint_content_hash("urn:example:", "Person", |h| h.update(b"alice"));
        let b = mint_content_hash("urn:example:", "Person", |h| h.update(b"alice"));
        let c = mint_content_hash("urn:example:", "Person", |h| h.update(b"bob"));
        let d = mint_content_hash("urn:example:", "Agent", |h| h.update(b"alice"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}
