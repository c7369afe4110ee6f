//! Type and Expression Rendering
//!
//! Shared by the emitters: how a field is stored, passed, returned and
//! compared, and how descriptor constants become Rust expressions.

use chrono::{Datelike, Timelike};

use super::{FieldRegion, FieldValue};
use crate::model::{Cardinality, Constant, ScalarType};

// =============================================================================
// Field Types
// =============================================================================

fn boxed(field: &FieldRegion, item: &str) -> String {
    if field.boxed {
        format!("Box<{}>", item)
    } else {
        item.to_string()
    }
}

/// Type of the struct field and of the property record field
pub fn stored_type(field: &FieldRegion) -> String {
    let item = field.item_type();
    match field.cardinality {
        Cardinality::Required => boxed(field, item),
        Cardinality::Optional => format!("Option<{}>", boxed(field, item)),
        Cardinality::Set { .. } | Cardinality::List { .. } => format!("Vec<{}>", item),
    }
}

/// Type of the constructor parameter; defaulted fields may be omitted
pub fn parameter_type(field: &FieldRegion) -> String {
    let item = field.item_type();
    match field.cardinality {
        Cardinality::Required if field.default_value.is_some() => format!("Option<{}>", item),
        Cardinality::Required => item.to_string(),
        Cardinality::Optional => format!("Option<{}>", item),
        Cardinality::Set { .. } | Cardinality::List { .. } => format!("Vec<{}>", item),
    }
}

/// Convert a parameter expression into the stored form
pub fn store_parameter(field: &FieldRegion, expr: &str) -> String {
    match field.cardinality {
        Cardinality::Required => match (&field.default_value, field.scalar()) {
            (Some(default), Some(scalar)) => {
                let default = constant_value(default, scalar);
                if scalar.is_copy() {
                    format!("{}.unwrap_or({})", expr, default)
                } else {
                    format!("{}.unwrap_or_else(|| {})", expr, default)
                }
            }
            _ if field.boxed => format!("Box::new({})", expr),
            _ => expr.to_string(),
        },
        Cardinality::Optional if field.boxed => format!("{}.map(Box::new)", expr),
        _ => expr.to_string(),
    }
}

fn is_copy(field: &FieldRegion) -> bool {
    field.scalar().map(|s| s.is_copy()).unwrap_or(false)
}

fn is_string(field: &FieldRegion) -> bool {
    field.scalar() == Some(ScalarType::String)
}

/// Return type of the accessor
pub fn accessor_type(field: &FieldRegion) -> String {
    let item = field.item_type();
    match field.cardinality {
        Cardinality::Required if is_string(field) => "&str".to_string(),
        Cardinality::Required if is_copy(field) => item.to_string(),
        Cardinality::Required => format!("&{}", item),
        Cardinality::Optional if is_string(field) => "Option<&str>".to_string(),
        Cardinality::Optional if is_copy(field) => format!("Option<{}>", item),
        Cardinality::Optional => format!("Option<&{}>", item),
        Cardinality::Set { .. } | Cardinality::List { .. } => format!("&[{}]", item),
    }
}

/// Accessor body over a stored field expression such as `self.name`
pub fn accessor_body(field: &FieldRegion, expr: &str) -> String {
    match field.cardinality {
        Cardinality::Required if is_copy(field) => expr.to_string(),
        Cardinality::Required => format!("&{}", expr),
        Cardinality::Optional if is_copy(field) => expr.to_string(),
        Cardinality::Optional if is_string(field) || field.boxed => format!("{}.as_deref()", expr),
        Cardinality::Optional => format!("{}.as_ref()", expr),
        Cardinality::Set { .. } | Cardinality::List { .. } => format!("&{}", expr),
    }
}

/// A single value as a reference, given the accessor (or `Some`) form
pub fn value_ref(field: &FieldRegion, expr: &str) -> String {
    if is_copy(field) {
        format!("&{}", expr)
    } else {
        expr.to_string()
    }
}

/// Path for associated calls on a scalar type
pub fn scalar_path(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::DateTime => "DateTime::<Utc>",
        other => other.rust_type(),
    }
}

// =============================================================================
// Constants
// =============================================================================

fn date(value: &chrono::NaiveDate) -> String {
    format!(
        "NaiveDate::from_ymd_opt({}, {}, {}).unwrap_or_default()",
        value.year(),
        value.month(),
        value.day()
    )
}

fn date_time(value: &chrono::DateTime<chrono::Utc>) -> String {
    format!(
        "DateTime::from_timestamp({}, {}).unwrap_or_default()",
        value.timestamp(),
        value.nanosecond()
    )
}

fn double(value: f64) -> String {
    format!("{:?}f64", value)
}

/// Lexical form and datatype constant of a non-string literal
fn typed_lexical(constant: &Constant) -> Option<(String, &'static str)> {
    match constant {
        Constant::Boolean(value) => Some((value.to_string(), "xsd::BOOLEAN")),
        Constant::Integer(value) => Some((value.to_string(), "xsd::INTEGER")),
        Constant::Double(value) => Some((value.to_string(), "xsd::DOUBLE")),
        Constant::Date(value) => Some((value.to_string(), "xsd::DATE")),
        Constant::DateTime(value) => Some((value.to_rfc3339(), "xsd::DATE_TIME")),
        Constant::String(_) | Constant::Iri(_) => None,
    }
}

/// Expression of type `Term`
pub fn constant_term(constant: &Constant) -> String {
    match constant {
        Constant::String(value) => format!("{:?}.to_term()", value),
        Constant::Boolean(value) => format!("{}.to_term()", value),
        Constant::Integer(value) => format!("{}i64.to_term()", value),
        Constant::Double(value) => format!("{}.to_term()", double(*value)),
        Constant::Date(value) => format!("{}.to_term()", date(value)),
        Constant::DateTime(value) => format!("{}.to_term()", date_time(value)),
        Constant::Iri(value) => format!("NamedNode::new({:?}).to_term()", value),
    }
}

/// Owned expression of the scalar's Rust type
pub fn constant_value(constant: &Constant, scalar: ScalarType) -> String {
    match (scalar, constant) {
        (ScalarType::String, Constant::String(value)) => format!("{:?}.to_string()", value),
        (ScalarType::Boolean, Constant::Boolean(value)) => value.to_string(),
        (ScalarType::Integer, Constant::Integer(value)) => format!("{}i64", value),
        (ScalarType::Double, Constant::Double(value)) => double(*value),
        (ScalarType::Date, Constant::Date(value)) => date(value),
        (ScalarType::DateTime, Constant::DateTime(value)) => date_time(value),
        (ScalarType::NamedNode, Constant::Iri(value) | Constant::String(value)) => {
            format!("NamedNode::new({:?})", value)
        }
        (ScalarType::BlankNode, Constant::String(value) | Constant::Iri(value)) => {
            format!("BlankNode::new({:?})", value)
        }
        (ScalarType::Identifier, Constant::Iri(value) | Constant::String(value)) => {
            format!("Identifier::from(NamedNode::new({:?}))", value)
        }
        (ScalarType::Literal, Constant::String(value) | Constant::Iri(value)) => {
            format!("Literal::new_simple({:?})", value)
        }
        (ScalarType::Literal, other) => match typed_lexical(other) {
            Some((lexical, datatype)) => format!("Literal::new_typed({:?}, NamedNode::new({}))", lexical, datatype),
            None => format!("Literal::new_simple({:?})", other.to_string()),
        },
        (_, other) => format!("{}::from({})", scalar.rust_type(), constant_term(other)),
    }
}

/// Reference expression comparable with [`value_ref`] of the same field
pub fn constant_ref(constant: &Constant, scalar: ScalarType) -> String {
    match (scalar, constant) {
        (ScalarType::String, Constant::String(value)) => format!("{:?}", value),
        _ => format!("&{}", constant_value(constant, scalar)),
    }
}

/// Expression of the JSON document form
pub fn constant_document(constant: &Constant, scalar: ScalarType) -> String {
    match (scalar, constant) {
        (ScalarType::String, Constant::String(value)) => format!("{:?}.to_document()", value),
        _ => format!("{}.to_document()", constant_value(constant, scalar)),
    }
}

/// Scalar of a field, or the scalar a constant on a shape field is
/// compared against (identifiers)
pub fn constant_scalar(field: &FieldRegion) -> ScalarType {
    match &field.value {
        FieldValue::Scalar(scalar) => *scalar,
        FieldValue::Shape(_) => ScalarType::Identifier,
    }
}

// =============================================================================
// Text
// =============================================================================

/// Doc comment lines at `indent`
pub fn doc_comment(comment: Option<&str>, indent: &str) -> String {
    match comment {
        Some(comment) if !comment.trim().is_empty() => comment
            .lines()
            .map(|line| {
                let line = line.trim_end();
                if line.is_empty() {
                    format!("{}///\n", indent)
                } else {
                    format!("{}/// {}\n", indent, line)
                }
            })
            .collect(),
        _ => String::new(),
    }
}

/// Rust string literal
pub fn quoted(text: &str) -> String {
    format!("{:?}", text)
}

/// `&["a", "b"]`
pub fn str_slice(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| quoted(v)).collect();
    format!("&[{}]", items.join(", "))
}
