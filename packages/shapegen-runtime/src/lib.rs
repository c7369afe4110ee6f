//! shapegen runtime
//!
//! Support library for code generated by `shapegen`. Generated modules
//! import the prelude and call into these modules for:
//!
//! - **Terms and datasets**: `term`, `dataset`, `vocab`
//! - **Graph codec**: `resource` readers/writers and `value` conversions
//! - **Equality and hashing**: `equals`, `hash`
//! - **Identifiers**: `identifier` (lazy, minted identifiers)
//! - **Document codec**: `json` conversions, projection and schema builders
//! - **Query templates**: `sparql` patterns and rendering

pub mod dataset;
pub mod equals;
pub mod error;
pub mod hash;
pub mod identifier;
pub mod json;
pub mod resource;
pub mod sparql;
pub mod term;
pub mod value;
pub mod vocab;

pub use dataset::{Dataset, Quad};
pub use error::{DecodeError, DocumentError, ValidationIssue};
pub use term::{BlankNode, Identifier, Literal, NamedNode, Term};

/// Everything generated code refers to unqualified
pub mod prelude {
    pub use crate::dataset::{Dataset, Quad};
    pub use crate::equals::{option_equals, property, sequence_equals, strict_equals, EqualsResult, Unequal};
    pub use crate::error::{DecodeError, DocumentError};
    pub use crate::hash::{hash_sequence, HashValue, ShapeHasher};
    pub use crate::identifier::{mint_blank, mint_content_hash, mint_random, LazyIdentifier};
    pub use crate::json::{self, FromDocument, ToDocument};
    pub use crate::resource::{FromRdfOptions, MutableResource, Resource, ToRdfOptions};
    pub use crate::sparql::{self, SparqlOptions};
    pub use crate::term::{BlankNode, Identifier, Literal, NamedNode, Term};
    pub use crate::value::{FromTerm, ToTerm};
    pub use crate::vocab::{rdf, xsd};
    pub use chrono::{DateTime, NaiveDate, Utc};
}
