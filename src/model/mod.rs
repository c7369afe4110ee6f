//! Shape Type Model
//!
//! The substrate every generator reads. Each shape becomes an Object type,
//! a Union type or a named Value type; properties reference other shapes by
//! name. Types store only their own properties. Flattened views (effective
//! property lists, discriminator sets) are produced by the resolvers in
//! [`inheritance`] and [`identifier`].
//!
//! Lifecycle:
//! - [`build`] turns descriptors into a `TypeModel` and runs the resolvers,
//!   which enrich the model in place (descendant discriminator values,
//!   final identifier strategies)
//! - after `build` returns, the model is read-only

pub mod analysis;
pub mod build;
pub mod diagnostics;
pub mod identifier;
pub mod inheritance;

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use analysis::{Recursion, RecursionAnalysis};
pub use build::{build_model, BuildOutput};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};

/// Shapes are referenced by their declared name
pub type TypeName = String;

// =============================================================================
// Enumerations
// =============================================================================

/// How a type is declared in generated code. Affects dispatch only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationStyle {
    /// Struct with private fields, constructor, inherent methods
    #[default]
    Class,
    /// Struct with declared field visibility, free functions
    Record,
}

/// How instance identifiers are obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityStrategy {
    /// Must be supplied; never blank
    #[serde(rename = "explicit")]
    ExplicitOnly,
    /// A blank node is minted when absent
    #[default]
    #[serde(rename = "blank")]
    BlankDefault,
    /// A random IRI under namespace + type name, minted on first read
    #[serde(rename = "random")]
    RandomMint,
    /// An IRI derived from the structural hash of the properties
    #[serde(rename = "contentHash")]
    ContentHashMint,
}

impl IdentityStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExplicitOnly => "explicit",
            Self::BlankDefault => "blank",
            Self::RandomMint => "random",
            Self::ContentHashMint => "contentHash",
        }
    }

    /// Strategies that produce an identifier without caller input
    pub fn mints(&self) -> bool {
        !matches!(self, Self::ExplicitOnly)
    }

    /// Strategies that mint IRIs and therefore need a namespace
    pub fn needs_namespace(&self) -> bool {
        matches!(self, Self::RandomMint | Self::ContentHashMint)
    }
}

/// A generated routine family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Equals,
    Hash,
    Json,
    Rdf,
    Sparql,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::Equals,
        Feature::Hash,
        Feature::Json,
        Feature::Rdf,
        Feature::Sparql,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Hash => "hash",
            Self::Json => "json",
            Self::Rdf => "rdf",
            Self::Sparql => "sparql",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binding-surface visibility of a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Restricted,
    Private,
}

impl Visibility {
    /// Field visibility keyword in record declarations
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Public => "pub ",
            Self::Restricted => "pub(crate) ",
            Self::Private => "",
        }
    }
}

/// How many values a property holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Exactly one value
    Required,
    /// Zero or one value
    Optional,
    /// Any number of unordered values
    Set { allow_empty: bool },
    /// Ordered values, encoded as an RDF list
    List { allow_empty: bool },
}

impl Cardinality {
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Set { .. } | Self::List { .. })
    }

    pub fn allow_empty(&self) -> bool {
        match self {
            Self::Set { allow_empty } | Self::List { allow_empty } => *allow_empty,
            Self::Required => false,
            Self::Optional => true,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Optional => write!(f, "optional"),
            Self::Set { allow_empty: true } => write!(f, "set"),
            Self::Set { allow_empty: false } => write!(f, "non-empty set"),
            Self::List { allow_empty: true } => write!(f, "list"),
            Self::List { allow_empty: false } => write!(f, "non-empty list"),
        }
    }
}

/// Primitive value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "dateTime")]
    DateTime,
    #[serde(rename = "iri")]
    NamedNode,
    #[serde(rename = "blank")]
    BlankNode,
    #[serde(rename = "identifier")]
    Identifier,
    #[serde(rename = "literal")]
    Literal,
    #[serde(rename = "term")]
    Term,
}

impl ScalarType {
    /// Rust type of a stored value
    pub fn rust_type(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Boolean => "bool",
            Self::Integer => "i64",
            Self::Double => "f64",
            Self::Date => "NaiveDate",
            Self::DateTime => "DateTime<Utc>",
            Self::NamedNode => "NamedNode",
            Self::BlankNode => "BlankNode",
            Self::Identifier => "Identifier",
            Self::Literal => "Literal",
            Self::Term => "Term",
        }
    }

    /// Accessors return these by value
    pub fn is_copy(&self) -> bool {
        matches!(
            self,
            Self::Boolean | Self::Integer | Self::Double | Self::Date | Self::DateTime
        )
    }

    /// Values that keep their language tag through decoding. Plain strings
    /// drop the tag, so they cannot be filtered by language.
    pub fn accepts_language(&self) -> bool {
        matches!(self, Self::Literal | Self::Term)
    }
}

/// A constant from a descriptor: default, allowed or required value
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    String(String),
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Iri(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => write!(f, "{:?}", value),
            Self::Boolean(value) => write!(f, "{}", value),
            Self::Integer(value) => write!(f, "{}", value),
            Self::Double(value) => write!(f, "{}", value),
            Self::Date(value) => write!(f, "{}", value),
            Self::DateTime(value) => write!(f, "{}", value.to_rfc3339()),
            Self::Iri(value) => write!(f, "<{}>", value),
        }
    }
}

// =============================================================================
// Types
// =============================================================================

/// What a property holds
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    Scalar(ScalarType),
    /// An Object or Union type
    Shape(TypeName),
}

impl ValueType {
    pub fn shape_name(&self) -> Option<&str> {
        match self {
            Self::Shape(name) => Some(name),
            Self::Scalar(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    /// Type that declares the property
    pub owner: TypeName,
    pub predicate: String,
    pub cardinality: Cardinality,
    pub value_type: ValueType,
    pub mutable: bool,
    pub visibility: Visibility,
    /// Only on Required properties
    pub default_value: Option<Constant>,
    /// Literal values outside these languages are dropped on decode
    pub language_in: Vec<String>,
    pub allowed_values: Vec<Constant>,
    pub required_value: Option<Constant>,
    pub comment: Option<String>,
}

/// Discriminator of an object type
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscriminatorProperty {
    /// Property name in documents
    pub name: String,
    /// Values this type claims; the first is written on encode
    pub own_values: Vec<String>,
    /// Own values of every transitive descendant, filled by the inheritance resolver
    pub descendant_values: Vec<String>,
}

/// Which identifier kinds a type accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    #[default]
    Any,
    /// IRIs only
    Named,
    /// Blank nodes only
    Blank,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IdentifierSpec {
    pub kind: IdentifierKind,
    /// Enumerated IRIs the identifier must be one of
    pub allowed: Vec<String>,
    pub strategy: IdentityStrategy,
    /// Namespace for minted IRIs
    pub namespace: Option<String>,
}

impl IdentifierSpec {
    /// Rust type of the identifier
    pub fn rust_type(&self) -> &'static str {
        if !self.allowed.is_empty() || self.kind == IdentifierKind::Named {
            return "NamedNode";
        }
        match self.kind {
            IdentifierKind::Blank => "BlankNode",
            _ if self.strategy.needs_namespace() || self.strategy == IdentityStrategy::ExplicitOnly => {
                "NamedNode"
            }
            _ => "Identifier",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub name: TypeName,
    pub comment: Option<String>,
    /// Own properties in declaration order
    pub properties: Vec<Property>,
    pub parents: Vec<TypeName>,
    pub is_abstract: bool,
    pub style: DeclarationStyle,
    pub discriminator: DiscriminatorProperty,
    pub identifier: IdentifierSpec,
    /// Type tags written on encode
    pub rdf_type_assertions: Vec<String>,
    /// Type tag required on decode
    pub rdf_type_validation: Option<String>,
    pub features: BTreeSet<Feature>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub name: TypeName,
    pub comment: Option<String>,
    /// Object or Union members, in dispatch order
    pub members: Vec<TypeName>,
    pub style: DeclarationStyle,
    pub discriminator_property: String,
    pub features: BTreeSet<Feature>,
}

/// A named value shape; references to it resolve to the scalar
#[derive(Debug, Clone, PartialEq)]
pub struct ValueShape {
    pub name: TypeName,
    pub scalar: ScalarType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeType {
    Object(ObjectType),
    Union(UnionType),
    Value(ValueShape),
}

impl ShapeType {
    pub fn name(&self) -> &str {
        match self {
            Self::Object(object) => &object.name,
            Self::Union(union) => &union.name,
            Self::Value(value) => &value.name,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionType> {
        match self {
            Self::Union(union) => Some(union),
            _ => None,
        }
    }

    pub fn features(&self) -> Option<&BTreeSet<Feature>> {
        match self {
            Self::Object(object) => Some(&object.features),
            Self::Union(union) => Some(&union.features),
            Self::Value(_) => None,
        }
    }

    /// Shapes referenced by this type: parents, property values, members
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::new();
        match self {
            Self::Object(object) => {
                deps.extend(object.parents.iter().map(String::as_str));
                deps.extend(object.properties.iter().filter_map(|p| p.value_type.shape_name()));
            }
            Self::Union(union) => deps.extend(union.members.iter().map(String::as_str)),
            Self::Value(_) => {}
        }
        let mut seen = BTreeSet::new();
        deps.retain(|name| seen.insert(*name));
        deps
    }
}

// =============================================================================
// Type Model
// =============================================================================

/// All shapes of one compilation, in declaration order
#[derive(Debug, Clone, Default)]
pub struct TypeModel {
    types: Vec<ShapeType>,
    index: HashMap<TypeName, usize>,
    /// Types whose compilation was aborted by a model error
    failed: BTreeSet<TypeName>,
}

impl TypeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type; returns false if the name is taken
    pub fn insert(&mut self, shape: ShapeType) -> bool {
        if self.index.contains_key(shape.name()) {
            return false;
        }
        self.index.insert(shape.name().to_string(), self.types.len());
        self.types.push(shape);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ShapeType> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut ShapeType> {
        match self.index.get(name) {
            Some(&i) => self.types.get_mut(i),
            None => None,
        }
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.get(name).and_then(ShapeType::as_object)
    }

    pub fn union(&self, name: &str) -> Option<&UnionType> {
        self.get(name).and_then(ShapeType::as_union)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShapeType> {
        self.types.iter()
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectType> {
        self.types.iter().filter_map(ShapeType::as_object)
    }

    pub fn unions(&self) -> impl Iterator<Item = &UnionType> {
        self.types.iter().filter_map(ShapeType::as_union)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(ShapeType::name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Direct children of an object type, in declaration order
    pub fn children(&self, name: &str) -> Vec<&ObjectType> {
        self.objects()
            .filter(|object| object.parents.iter().any(|parent| parent == name))
            .collect()
    }

    pub(crate) fn mark_failed(&mut self, name: &str) -> bool {
        self.failed.insert(name.to_string())
    }

    pub fn is_failed(&self, name: &str) -> bool {
        self.failed.contains(name)
    }

    pub fn failed(&self) -> &BTreeSet<TypeName> {
        &self.failed
    }
}

// =============================================================================
// Model Errors
// =============================================================================

/// Fatal problem with one type; compilation of that type is aborted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("'{reference}' referenced by '{type_name}' is not a declared shape")]
    UnresolvedReference { type_name: TypeName, reference: String },

    #[error("shape '{type_name}' is declared more than once")]
    DuplicateTypeName { type_name: TypeName },

    #[error("inheritance cycle through '{type_name}': {}", cycle.join(" -> "))]
    InheritanceCycle { type_name: TypeName, cycle: Vec<TypeName> },

    #[error("parent '{parent}' of '{type_name}' is not an object shape")]
    ParentNotObject { type_name: TypeName, parent: TypeName },

    #[error("property '{property}' of '{type_name}' is already declared by '{first_owner}'")]
    DuplicateProperty {
        type_name: TypeName,
        property: String,
        first_owner: TypeName,
    },

    #[error("'{type_name}' uses discriminator '{found}' but '{related}' uses '{expected}'")]
    DiscriminatorConflict {
        type_name: TypeName,
        expected: String,
        found: String,
        related: TypeName,
    },

    #[error("'{type_name}' has no discriminator value left in '{union}'")]
    EmptyDiscriminatorSet { type_name: TypeName, union: TypeName },

    #[error("identifier of '{type_name}': {reason}")]
    IdentifierStrategyConflict { type_name: TypeName, reason: String },

    #[error("identifier strategy '{strategy}' of '{type_name}' needs a mint namespace")]
    MissingIdentifierInput { type_name: TypeName, strategy: String },

    #[error("property '{property}' of '{type_name}' has a default but is not required")]
    DefaultOnNonRequired { type_name: TypeName, property: String },

    #[error("property '{property}' of '{type_name}': {reason}")]
    InvalidConstant {
        type_name: TypeName,
        property: String,
        reason: String,
    },

    #[error("property '{property}' of '{type_name}' has minCount {min} above maxCount {max}")]
    InvalidCardinality {
        type_name: TypeName,
        property: String,
        min: u32,
        max: u32,
    },

    #[error("property '{property}' of '{type_name}' holds abstract shape '{target}'")]
    AbstractPropertyValue {
        type_name: TypeName,
        property: String,
        target: TypeName,
    },

    #[error("property name '{property}' of '{type_name}' is reserved")]
    ReservedPropertyName { type_name: TypeName, property: String },

    #[error("union '{type_name}' member '{member}' is abstract")]
    AbstractUnionMember { type_name: TypeName, member: TypeName },

    #[error("union '{type_name}' member '{member}' is not an object or union shape")]
    InvalidUnionMember { type_name: TypeName, member: TypeName },

    #[error("union '{type_name}' has no members")]
    EmptyUnion { type_name: TypeName },

    #[error("generated name '{generated}' of '{type_name}' collides with {other}")]
    TypeNameCollision {
        type_name: TypeName,
        generated: String,
        other: String,
    },

    #[error("'{type_name}' depends on '{dependency}', which failed")]
    DependencyFailed { type_name: TypeName, dependency: TypeName },
}

impl ModelError {
    /// The type whose compilation this error aborts
    pub fn type_name(&self) -> &str {
        match self {
            Self::UnresolvedReference { type_name, .. }
            | Self::DuplicateTypeName { type_name }
            | Self::InheritanceCycle { type_name, .. }
            | Self::ParentNotObject { type_name, .. }
            | Self::DuplicateProperty { type_name, .. }
            | Self::DiscriminatorConflict { type_name, .. }
            | Self::EmptyDiscriminatorSet { type_name, .. }
            | Self::IdentifierStrategyConflict { type_name, .. }
            | Self::MissingIdentifierInput { type_name, .. }
            | Self::DefaultOnNonRequired { type_name, .. }
            | Self::InvalidConstant { type_name, .. }
            | Self::InvalidCardinality { type_name, .. }
            | Self::AbstractPropertyValue { type_name, .. }
            | Self::ReservedPropertyName { type_name, .. }
            | Self::AbstractUnionMember { type_name, .. }
            | Self::InvalidUnionMember { type_name, .. }
            | Self::EmptyUnion { type_name }
            | Self::TypeNameCollision { type_name, .. }
            | Self::DependencyFailed { type_name, .. } => type_name,
        }
    }

    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::UnresolvedReference { .. } => DiagnosticCode::UnresolvedReference,
            Self::DuplicateTypeName { .. } => DiagnosticCode::DuplicateTypeName,
            Self::InheritanceCycle { .. } | Self::ParentNotObject { .. } => DiagnosticCode::InvalidInheritance,
            Self::DuplicateProperty { .. } => DiagnosticCode::DuplicateProperty,
            Self::DiscriminatorConflict { .. } => DiagnosticCode::DiscriminatorConflict,
            Self::EmptyDiscriminatorSet { .. } => DiagnosticCode::EmptyDiscriminatorSet,
            Self::IdentifierStrategyConflict { .. } => DiagnosticCode::IdentifierStrategyConflict,
            Self::MissingIdentifierInput { .. } => DiagnosticCode::MissingIdentifierInput,
            Self::DefaultOnNonRequired { .. } => DiagnosticCode::DefaultOnNonRequired,
            Self::InvalidConstant { .. } | Self::InvalidCardinality { .. } | Self::AbstractPropertyValue { .. } => {
                DiagnosticCode::InvalidConstraint
            }
            Self::ReservedPropertyName { .. } | Self::TypeNameCollision { .. } => DiagnosticCode::TypeNameCollision,
            Self::AbstractUnionMember { .. } | Self::InvalidUnionMember { .. } | Self::EmptyUnion { .. } => {
                DiagnosticCode::InvalidUnionMember
            }
            Self::DependencyFailed { .. } => DiagnosticCode::DependencyFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: IdentifierKind, strategy: IdentityStrategy) -> IdentifierSpec {
        IdentifierSpec {
            kind,
            strategy,
            ..Default::default()
        }
    }

    #[test]
    fn test_identifier_rust_type() {
        assert_eq!(spec(IdentifierKind::Any, IdentityStrategy::BlankDefault).rust_type(), "Identifier");
        assert_eq!(spec(IdentifierKind::Blank, IdentityStrategy::BlankDefault).rust_type(), "BlankNode");
        assert_eq!(spec(IdentifierKind::Any, IdentityStrategy::ExplicitOnly).rust_type(), "NamedNode");
        assert_eq!(spec(IdentifierKind::Any, IdentityStrategy::RandomMint).rust_type(), "NamedNode");

        let enumerated = IdentifierSpec {
            allowed: vec!["http://example.com/a".to_string()],
            strategy: IdentityStrategy::ExplicitOnly,
            ..Default::default()
        };
        assert_eq!(enumerated.rust_type(), "NamedNode");
    }

    #[test]
    fn test_strategy_serde_names() {
        let parsed: IdentityStrategy = serde_json::from_str("\"contentHash\"").unwrap();
        assert_eq!(parsed, IdentityStrategy::ContentHashMint);
        assert_eq!(serde_json::to_string(&IdentityStrategy::ExplicitOnly).unwrap(), "\"explicit\"");
    }

    #[test]
    fn test_model_rejects_duplicate_names() {
        let mut model = TypeModel::new();
        let value = |name: &str| {
            ShapeType::Value(ValueShape {
                name: name.to_string(),
                scalar: ScalarType::String,
            })
        };
        assert!(model.insert(value("Name")));
        assert!(!model.insert(value("Name")));
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_model_error_type_name() {
        let error = ModelError::DuplicateProperty {
            type_name: "Child".to_string(),
            property: "name".to_string(),
            first_owner: "Parent".to_string(),
        };
        assert_eq!(error.type_name(), "Child");
        assert_eq!(error.code(), DiagnosticCode::DuplicateProperty);
        assert!(error.to_string().contains("Parent"));
    }
}
