//! Document Codec Support
//!
//! Scalar conversions to and from JSON values, field projection helpers and
//! schema builders used by generated `to_json` / `from_json` / `json_schema`
//! routines. Validation uses the `jsonschema` crate.
//!
//! Document forms:
//! - identifiers are strings; local identifiers carry the `_:` prefix
//! - literals are `{"@value", "@type"?, "@language"?}` objects
//! - terms are either `{"@id"}` or literal objects

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use jsonschema::JSONSchema;
use tracing::debug;

pub use serde_json::{self, json, Map, Value};

use crate::error::{DocumentError, ValidationIssue};
use crate::term::{BlankNode, Identifier, Literal, NamedNode, Term, BLANK_NODE_PREFIX};
use crate::vocab::xsd;

// =============================================================================
// Conversion Traits
// =============================================================================

/// Encode a value into its document form
pub trait ToDocument {
    fn to_document(&self) -> Value;
}

/// Decode a value from its document form
pub trait FromDocument: Sized {
    fn from_document(value: &Value) -> Result<Self, DocumentError>;

    /// Schema of the document form
    fn document_schema() -> Value;
}

impl<T: ToDocument + ?Sized> ToDocument for &T {
    fn to_document(&self) -> Value {
        (**self).to_document()
    }
}

fn expected(what: &str, value: &Value) -> DocumentError {
    DocumentError::projection("", format!("expected {}, got {}", what, value))
}

fn as_str<'a>(value: &'a Value, what: &str) -> Result<&'a str, DocumentError> {
    value.as_str().ok_or_else(|| expected(what, value))
}

impl ToDocument for str {
    fn to_document(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToDocument for String {
    fn to_document(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FromDocument for String {
    fn from_document(value: &Value) -> Result<Self, DocumentError> {
        as_str(value, "string").map(str::to_string)
    }

    fn document_schema() -> Value {
        json!({ "type": "string" })
    }
}

impl ToDocument for bool {
    fn to_document(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromDocument for bool {
    fn from_document(value: &Value) -> Result<Self, DocumentError> {
        value.as_bool().ok_or_else(|| expected("boolean", value))
    }

    fn document_schema() -> Value {
        json!({ "type": "boolean" })
    }
}

impl ToDocument for i64 {
    fn to_document(&self) -> Value {
        Value::from(*self)
    }
}

impl FromDocument for i64 {
    fn from_document(value: &Value) -> Result<Self, DocumentError> {
        value.as_i64().ok_or_else(|| expected("integer", value))
    }

    fn document_schema() -> Value {
        json!({ "type": "integer" })
    }
}

impl ToDocument for f64 {
    fn to_document(&self) -> Value {
        Value::from(*self)
    }
}

impl FromDocument for f64 {
    fn from_document(value: &Value) -> Result<Self, DocumentError> {
        value.as_f64().ok_or_else(|| expected("number", value))
    }

    fn document_schema() -> Value {
        json!({ "type": "number" })
    }
}

impl ToDocument for NaiveDate {
    fn to_document(&self) -> Value {
        Value::String(self.format("%Y-%m-%d").to_string())
    }
}

impl FromDocument for NaiveDate {
    fn from_document(value: &Value) -> Result<Self, DocumentError> {
        NaiveDate::parse_from_str(as_str(value, "date")?, "%Y-%m-%d").map_err(|_| expected("date", value))
    }

    fn document_schema() -> Value {
        json!({ "type": "string", "format": "date" })
    }
}

impl ToDocument for DateTime<Utc> {
    fn to_document(&self) -> Value {
        Value::String(self.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl FromDocument for DateTime<Utc> {
    fn from_document(value: &Value) -> Result<Self, DocumentError> {
        DateTime::parse_from_rfc3339(as_str(value, "date-time")?)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| expected("date-time", value))
    }

    fn document_schema() -> Value {
        json!({ "type": "string", "format": "date-time" })
    }
}

// =============================================================================
// Identifiers and Terms
// =============================================================================

impl ToDocument for NamedNode {
    fn to_document(&self) -> Value {
        Value::String(self.as_str().to_string())
    }
}

impl FromDocument for NamedNode {
    fn from_document(value: &Value) -> Result<Self, DocumentError> {
        match Identifier::parse(as_str(value, "IRI")?) {
            Identifier::NamedNode(node) => Ok(node),
            Identifier::BlankNode(_) => Err(expected("IRI", value)),
        }
    }

    fn document_schema() -> Value {
        json!({ "type": "string", "minLength": 1 })
    }
}

impl ToDocument for BlankNode {
    fn to_document(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl FromDocument for BlankNode {
    fn from_document(value: &Value) -> Result<Self, DocumentError> {
        match Identifier::parse(as_str(value, "blank node")?) {
            Identifier::BlankNode(node) => Ok(node),
            Identifier::NamedNode(_) => Err(expected("blank node", value)),
        }
    }

    fn document_schema() -> Value {
        json!({ "type": "string", "pattern": format!("^{}", BLANK_NODE_PREFIX) })
    }
}

impl ToDocument for Identifier {
    fn to_document(&self) -> Value {
        Value::String(self.to_text())
    }
}

impl FromDocument for Identifier {
    fn from_document(value: &Value) -> Result<Self, DocumentError> {
        Ok(Identifier::parse(as_str(value, "identifier")?))
    }

    fn document_schema() -> Value {
        json!({ "type": "string", "minLength": 1 })
    }
}

impl ToDocument for Literal {
    fn to_document(&self) -> Value {
        let mut object = Map::new();
        object.insert("@value".to_string(), Value::String(self.value().to_string()));
        match self.language() {
            Some(language) => {
                object.insert("@language".to_string(), Value::String(language.to_string()));
            }
            None if self.datatype().as_str() != xsd::STRING => {
                object.insert("@type".to_string(), Value::String(self.datatype().as_str().to_string()));
            }
            None => {}
        }
        Value::Object(object)
    }
}

impl FromDocument for Literal {
    fn from_document(value: &Value) -> Result<Self, DocumentError> {
        let object = value.as_object().ok_or_else(|| expected("literal object", value))?;
        let lexical = object
            .get("@value")
            .and_then(Value::as_str)
            .ok_or_else(|| expected("@value string", value))?;
        if let Some(language) = object.get("@language").and_then(Value::as_str) {
            return Ok(Literal::new_language_tagged(lexical, language));
        }
        match object.get("@type").and_then(Value::as_str) {
            Some(datatype) => Ok(Literal::new_typed(lexical, NamedNode::new(datatype))),
            None => Ok(Literal::new_simple(lexical)),
        }
    }

    fn document_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "@value": { "type": "string" },
                "@type": { "type": "string" },
                "@language": { "type": "string" }
            },
            "required": ["@value"]
        })
    }
}

impl ToDocument for Term {
    fn to_document(&self) -> Value {
        match self {
            Term::Literal(literal) => literal.to_document(),
            Term::NamedNode(node) => json!({ "@id": node.as_str() }),
            Term::BlankNode(node) => json!({ "@id": node.to_string() }),
        }
    }
}

impl FromDocument for Term {
    fn from_document(value: &Value) -> Result<Self, DocumentError> {
        match value.get("@id") {
            Some(id) => Ok(Term::from(Identifier::from_document(id)?)),
            None => Literal::from_document(value).map(Term::Literal),
        }
    }

    fn document_schema() -> Value {
        one_of(vec![
            object_schema(
                Map::from_iter([("@id".to_string(), Identifier::document_schema())]),
                vec!["@id".to_string()],
            ),
            Literal::document_schema(),
        ])
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validate a document against a generated schema
pub fn validate(schema: &Value, document: &Value) -> Result<(), DocumentError> {
    let compiled = JSONSchema::compile(schema).map_err(|e| DocumentError::Schema(e.to_string()))?;
    let issues: Vec<ValidationIssue> = match compiled.validate(document) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .map(|e| ValidationIssue {
                instance_path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect(),
    };
    debug!(issues = issues.len(), "document failed validation");
    Err(DocumentError::Validation(issues))
}

// =============================================================================
// Projection
// =============================================================================

fn keyed(key: &str, error: DocumentError) -> DocumentError {
    match error {
        DocumentError::Projection { key: inner, message } if inner.is_empty() => DocumentError::Projection {
            key: key.to_string(),
            message,
        },
        DocumentError::Projection { key: inner, message } => DocumentError::Projection {
            key: format!("{}.{}", key, inner),
            message,
        },
        other => other,
    }
}

/// The document as a JSON object
pub fn object(document: &Value) -> Result<&Map<String, Value>, DocumentError> {
    document.as_object().ok_or_else(|| expected("object", document))
}

pub fn required<T>(
    object: &Map<String, Value>,
    key: &str,
    decode: impl FnOnce(&Value) -> Result<T, DocumentError>,
) -> Result<T, DocumentError> {
    match object.get(key) {
        Some(value) if !value.is_null() => decode(value).map_err(|e| keyed(key, e)),
        _ => Err(DocumentError::projection(key, "missing required value")),
    }
}

/// Absent and `null` both decode to `None`
pub fn optional<T>(
    object: &Map<String, Value>,
    key: &str,
    decode: impl FnOnce(&Value) -> Result<T, DocumentError>,
) -> Result<Option<T>, DocumentError> {
    match object.get(key) {
        Some(value) if !value.is_null() => decode(value).map(Some).map_err(|e| keyed(key, e)),
        _ => Ok(None),
    }
}

/// Absent decodes to an empty sequence
pub fn sequence<T>(
    object: &Map<String, Value>,
    key: &str,
    mut decode: impl FnMut(&Value) -> Result<T, DocumentError>,
) -> Result<Vec<T>, DocumentError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| decode(item).map_err(|e| keyed(&format!("{}[{}]", key, index), e)))
            .collect(),
        Some(other) => Err(keyed(key, expected("array", other))),
    }
}

/// The discriminator value of a document
pub fn discriminator<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str, DocumentError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| DocumentError::projection(key, "missing discriminator"))
}

/// Encode a sequence
pub fn array<T>(items: &[T], encode: impl Fn(&T) -> Value) -> Value {
    Value::Array(items.iter().map(encode).collect())
}

// =============================================================================
// Schema Builders
// =============================================================================

/// Object schema; repeated required keys (diamond inheritance) collapse
pub fn object_schema(properties: Map<String, Value>, mut required: Vec<String>) -> Value {
    let mut seen = std::collections::HashSet::new();
    required.retain(|key| seen.insert(key.clone()));
    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), json!(required));
    }
    Value::Object(schema)
}

/// Open object schema, used where a nested schema would recurse
pub fn any_object_schema() -> Value {
    json!({ "type": "object" })
}

pub fn array_schema(items: Value, min_items: usize) -> Value {
    let mut schema = json!({ "type": "array", "items": items });
    if min_items > 0 {
        schema["minItems"] = json!(min_items);
    }
    schema
}

pub fn enumerated(values: Vec<Value>) -> Value {
    json!({ "enum": values })
}

pub fn constant(value: Value) -> Value {
    json!({ "const": value })
}

/// Array that must contain `value`
pub fn contains(value: Value) -> Value {
    json!({ "type": "array", "contains": { "const": value } })
}

/// Object whose discriminator is one of `values`; narrows a union branch
pub fn discriminated(key: &str, values: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": { key: { "enum": values } },
        "required": [key],
    })
}

pub fn one_of(schemas: Vec<Value>) -> Value {
    json!({ "oneOf": schemas })
}

pub fn all_of(schemas: Vec<Value>) -> Value {
    json!({ "allOf": schemas })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_document_forms() {
        let blank = Identifier::from(BlankNode::new("b1"));
        assert_eq!(blank.to_document(), json!("_:b1"));
        assert_eq!(Identifier::from_document(&json!("_:b1")).unwrap(), blank);
        assert!(NamedNode::from_document(&json!("_:b1")).is_err());
    }

    #[test]
    fn test_literal_document_forms() {
        let tagged = Literal::new_language_tagged("chat", "fr");
        assert_eq!(tagged.to_document(), json!({"@value": "chat", "@language": "fr"}));
        assert_eq!(Literal::from_document(&tagged.to_document()).unwrap(), tagged);

        let simple = Literal::new_simple("x");
        assert_eq!(simple.to_document(), json!({"@value": "x"}));
    }

    #[test]
    fn test_required_keys_collapse() {
        let schema = object_schema(Map::new(), vec!["a".to_string(), "b".to_string(), "a".to_string()]);
        assert_eq!(schema["required"], json!(["a", "b"]));
    }

    #[test]
    fn test_discriminated_branch() {
        let schema = discriminated("type", &["Circle", "Disc"]);
        assert!(validate(&schema, &json!({"type": "Disc"})).is_ok());
        assert!(validate(&schema, &json!({"type": "Square"})).is_err());
        assert!(validate(&schema, &json!({})).is_err());
    }

    #[test]
    fn test_validate_reports_issues() {
        let schema = object_schema(
            Map::from_iter([("name".to_string(), String::document_schema())]),
            vec!["name".to_string()],
        );
        assert!(validate(&schema, &json!({"name": "a"})).is_ok());
        match validate(&schema, &json!({"name": 5})) {
            Err(DocumentError::Validation(issues)) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].instance_path, "/name");
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_projection_errors_are_keyed() {
        let document = json!({"items": [1, "two"]});
        let object = object(&document).unwrap();
        match sequence(object, "items", i64::from_document) {
            Err(DocumentError::Projection { key, .. }) => assert_eq!(key, "items[1]"),
            other => panic!("Expected projection error, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_null_is_absent() {
        let document = json!({"label": null});
        let object = object(&document).unwrap();
        assert_eq!(optional(object, "label", String::from_document).unwrap(), None);
    }
}
