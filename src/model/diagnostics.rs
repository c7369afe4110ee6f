//! Diagnostics
//!
//! Collects errors, warnings and notes while the model is built and
//! resolved. Errors abort compilation of the type they name; warnings and
//! notes are reported alongside the generated output.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ModelError, TypeName};

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === References ===
    /// Parent, property value or member names no shape
    UnresolvedReference,
    /// Two descriptors share a name
    DuplicateTypeName,
    /// Generated Rust name clashes with another type or the runtime prelude
    TypeNameCollision,

    // === Inheritance ===
    /// Cycle in the parent graph, or a parent that is not an object
    InvalidInheritance,
    /// Same property name declared twice along a chain
    DuplicateProperty,
    /// Abstract type that nothing derives from
    AbstractLeaf,

    // === Discriminators ===
    /// Discriminator property names disagree along a chain or union
    DiscriminatorConflict,
    /// Two union members claim the same value; first declared keeps it
    AmbiguousDiscriminator,
    /// A union member ends up with no values
    EmptyDiscriminatorSet,
    /// Union member is abstract, a value shape, or the union is empty
    InvalidUnionMember,

    // === Identifiers ===
    IdentifierStrategyConflict,
    MissingIdentifierInput,

    // === Properties ===
    DefaultOnNonRequired,
    /// Bad constant or cardinality bounds
    InvalidConstraint,

    // === Generation ===
    /// Type depends on a failed type
    DependencyFailed,
    /// Requested feature dropped because a dependency lacks it
    FeatureNarrowed,
    /// Recursive reference boxed or left unspliced
    RecursiveReference,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnresolvedReference => "E001",
            Self::DuplicateTypeName => "E002",
            Self::TypeNameCollision => "E003",
            Self::InvalidInheritance => "E004",
            Self::DuplicateProperty => "E005",
            Self::DiscriminatorConflict => "E006",
            Self::EmptyDiscriminatorSet => "E007",
            Self::InvalidUnionMember => "E008",
            Self::IdentifierStrategyConflict => "E009",
            Self::MissingIdentifierInput => "E010",
            Self::DefaultOnNonRequired => "E011",
            Self::InvalidConstraint => "E012",
            Self::DependencyFailed => "E013",
            Self::AmbiguousDiscriminator => "W001",
            Self::AbstractLeaf => "W002",
            Self::FeatureNarrowed => "I001",
            Self::RecursiveReference => "I002",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::AmbiguousDiscriminator | Self::AbstractLeaf => Severity::Warning,
            Self::FeatureNarrowed | Self::RecursiveReference => Severity::Info,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Type the diagnostic is about
    pub type_name: TypeName,
    pub code: DiagnosticCode,
    pub message: String,
    /// Additional context (related types, properties)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(type_name: impl Into<TypeName>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl From<&ModelError> for DiagnosticItem {
    fn from(error: &ModelError) -> Self {
        Self::new(error.type_name(), error.code(), error.to_string())
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.type_name
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from model building and generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item
    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    /// Add an item; severity comes from the code
    pub fn report(&mut self, type_name: impl Into<TypeName>, code: DiagnosticCode, message: impl Into<String>) {
        self.push(DiagnosticItem::new(type_name, code, message));
    }

    /// Record a model error
    pub fn model_error(&mut self, error: &ModelError) {
        self.push(DiagnosticItem::from(error));
    }

    /// Record an ambiguous discriminator claim
    pub fn ambiguous_discriminator(&mut self, union: &str, value: &str, kept_by: &str, dropped_by: &str) {
        self.push(
            DiagnosticItem::new(
                union,
                DiagnosticCode::AmbiguousDiscriminator,
                format!("discriminator value '{}' is claimed by more than one member", value),
            )
            .with_context(format!("kept by '{}'", kept_by))
            .with_context(format!("dropped from '{}'", dropped_by)),
        );
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    /// Get all errors
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Items about one type
    pub fn for_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a DiagnosticItem> {
        self.items.iter().filter(move |i| i.type_name == type_name)
    }

    /// Get all items
    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if self.has_errors() {
            output.push_str(&format!(
                "\n{} error(s), {} warning(s)\n",
                self.error_count(),
                self.warning_count()
            ));
        } else if self.warning_count() > 0 {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
