//! Decode errors returned by generated codecs

use thiserror::Error;

use crate::term::Identifier;

/// Graph decode failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Mistyped value for {predicate} on {subject}: expected {expected}, got {actual}")]
    MistypedValue {
        subject: Identifier,
        predicate: String,
        expected: String,
        actual: String,
    },

    #[error("Missing value for {predicate} on {subject}: expected {expected}")]
    MissingValue {
        subject: Identifier,
        predicate: String,
        expected: String,
    },

    #[error("Empty sequence for {predicate} on {subject}")]
    EmptySequence { subject: Identifier, predicate: String },

    #[error("No member of union {union} could be decoded from {subject}")]
    UnionExhausted { subject: Identifier, union: String },
}

impl DecodeError {
    /// Subject the failure was reported against
    pub fn subject(&self) -> &Identifier {
        match self {
            Self::MistypedValue { subject, .. }
            | Self::MissingValue { subject, .. }
            | Self::EmptySequence { subject, .. }
            | Self::UnionExhausted { subject, .. } => subject,
        }
    }
}

/// A single schema validation failure inside a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// JSON pointer to the offending value
    pub instance_path: String,
    pub message: String,
}

/// Document decode failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Document failed validation: {}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("Invalid value at {key}: {message}")]
    Projection { key: String, message: String },

    #[error("Unknown discriminator value '{value}' for {type_name}")]
    UnknownDiscriminator { type_name: String, value: String },

    #[error("Invalid generated schema: {0}")]
    Schema(String),
}

impl DocumentError {
    pub fn projection(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Projection {
            key: key.into(),
            message: message.into(),
        }
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.instance_path, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}
