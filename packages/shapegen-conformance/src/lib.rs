//! shapegen conformance
//!
//! The descriptor fixtures under `tests/fixtures`, generated at build time
//! and compiled against `shapegen-runtime`:
//!
//! - `catalog`: abstract parent, record and class styles, content-hash and
//!   explicit identifiers, a language-filtered literal, a union
//! - `fleet`: a three-level chain with a type tag on every level, a
//!   required nested record, union-valued properties
//! - `recursive`: a self-referencing type
//!
//! The integration tests drive each module through both codecs.

include!(concat!(env!("OUT_DIR"), "/generated.rs"));
