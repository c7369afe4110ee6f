//! Shape Descriptors
//!
//! Resolved shape definitions handed over by the shape-loading side. Raw
//! SHACL graphs are parsed elsewhere; what arrives here is JSON with
//! predicate IRIs, cardinality bounds and references by shape name already
//! filled in.
//!
//! A document is either a single shape or `{"shapes": [...]}`. Documents
//! are checked against [`DESCRIPTOR_SCHEMA`] before they are deserialized.

pub mod loader;

use std::collections::BTreeSet;

use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ShapegenError};
use crate::model::{DeclarationStyle, Feature, IdentifierKind, IdentityStrategy, ScalarType, Visibility};

pub use loader::{load_path, LoadedDescriptors};

// =============================================================================
// Descriptor Types
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Object,
    Union,
    Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeDescriptor {
    pub name: String,
    #[serde(default)]
    pub kind: ShapeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    // Object shapes
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<DeclarationStyle>,
    /// Canonical type tag; written and validated unless overridden
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdf_type: Option<String>,
    /// Tags written on encode, replacing `rdfType`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_rdf_types: Option<Vec<String>>,
    /// Tag validated on decode, replacing `rdfType`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_rdf_type: Option<String>,
    #[serde(default = "default_true")]
    pub validate_rdf_type: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<DiscriminatorDescriptor>,
    #[serde(default)]
    pub identifier: IdentifierDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeSet<Feature>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyDescriptor>,

    // Union shapes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,

    // Value shapes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<ScalarType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscriminatorDescriptor {
    /// Document property holding the discriminator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// Own values; defaults to the shape name for concrete shapes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentifierDescriptor {
    #[serde(default)]
    pub kind: IdentifierKind,
    #[serde(default, rename = "in", skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<IdentityStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub name: String,
    /// Predicate IRI
    pub path: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub datatype: Option<ScalarType>,
    /// Name of an object, union or value shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,
    /// Ordered values encoded as an RDF list
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub mutable: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub language_in: Vec<String>,
    #[serde(default, rename = "in", skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A set of shapes as it appears on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorSet {
    pub shapes: Vec<ShapeDescriptor>,
}

// =============================================================================
// Document Schema
// =============================================================================

/// JSON Schema every descriptor document must satisfy
pub const DESCRIPTOR_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "definitions": {
    "constant": {
      "oneOf": [
        { "type": ["string", "boolean", "number"] },
        {
          "type": "object",
          "properties": { "@id": { "type": "string" } },
          "required": ["@id"],
          "additionalProperties": false
        }
      ]
    },
    "property": {
      "type": "object",
      "required": ["name", "path"],
      "properties": {
        "name": { "type": "string", "minLength": 1 },
        "path": { "type": "string", "minLength": 1 },
        "type": {
          "enum": ["string", "boolean", "integer", "double", "date", "dateTime",
                   "iri", "blank", "identifier", "literal", "term"]
        },
        "shape": { "type": "string", "minLength": 1 },
        "minCount": { "type": "integer", "minimum": 0 },
        "maxCount": { "type": "integer", "minimum": 1 },
        "list": { "type": "boolean" },
        "mutable": { "type": "boolean" },
        "visibility": { "enum": ["public", "restricted", "private"] },
        "defaultValue": { "$ref": "#/definitions/constant" },
        "languageIn": { "type": "array", "items": { "type": "string" } },
        "in": { "type": "array", "items": { "$ref": "#/definitions/constant" } },
        "hasValue": { "$ref": "#/definitions/constant" },
        "comment": { "type": "string" }
      },
      "oneOf": [
        { "required": ["type"], "not": { "required": ["shape"] } },
        { "required": ["shape"], "not": { "required": ["type"] } }
      ]
    },
    "shape": {
      "type": "object",
      "required": ["name"],
      "properties": {
        "name": { "type": "string", "pattern": "^[A-Za-z][A-Za-z0-9_]*$" },
        "kind": { "enum": ["object", "union", "value"] },
        "comment": { "type": "string" },
        "abstract": { "type": "boolean" },
        "parents": { "type": "array", "items": { "type": "string" } },
        "style": { "enum": ["class", "record"] },
        "rdfType": { "type": "string" },
        "toRdfTypes": { "type": "array", "items": { "type": "string" } },
        "fromRdfType": { "type": "string" },
        "validateRdfType": { "type": "boolean" },
        "discriminator": {
          "type": "object",
          "properties": {
            "property": { "type": "string", "minLength": 1 },
            "values": { "type": "array", "items": { "type": "string" } }
          }
        },
        "identifier": {
          "type": "object",
          "properties": {
            "kind": { "enum": ["any", "named", "blank"] },
            "in": { "type": "array", "items": { "type": "string" } },
            "strategy": { "enum": ["explicit", "blank", "random", "contentHash"] },
            "namespace": { "type": "string" }
          }
        },
        "features": {
          "type": "array",
          "items": { "enum": ["equals", "hash", "json", "rdf", "sparql"] }
        },
        "properties": { "type": "array", "items": { "$ref": "#/definitions/property" } },
        "members": { "type": "array", "items": { "type": "string" } },
        "datatype": {
          "enum": ["string", "boolean", "integer", "double", "date", "dateTime",
                   "iri", "blank", "identifier", "literal", "term"]
        }
      }
    }
  },
  "type": "object",
  "if": { "required": ["shapes"] },
  "then": {
    "properties": {
      "shapes": { "type": "array", "items": { "$ref": "#/definitions/shape" } }
    }
  },
  "else": { "$ref": "#/definitions/shape" }
}"##;

/// Validate a descriptor document against [`DESCRIPTOR_SCHEMA`]
pub fn validate_document(document: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(DESCRIPTOR_SCHEMA)?;
    let compiled = JSONSchema::compile(&schema).map_err(|e| ShapegenError::InvalidFormat(e.to_string()))?;
    let result = compiled.validate(document);
    if let Err(errors) = result {
        let messages: Vec<String> = errors
            .map(|e| format!("{}: {}", e.instance_path, e))
            .collect();
        return Err(ShapegenError::InvalidDescriptor(messages));
    }
    Ok(())
}

/// Parse one descriptor document
pub fn parse_document(document: &Value) -> Result<DescriptorSet> {
    validate_document(document)?;
    let set = if document.get("shapes").is_some() {
        serde_json::from_value(document.clone())?
    } else {
        DescriptorSet {
            shapes: vec![serde_json::from_value(document.clone())?],
        }
    };
    debug!(shapes = set.shapes.len(), "parsed descriptor document");
    Ok(set)
}

/// Parse descriptor JSON text
pub fn parse_str(content: &str) -> Result<DescriptorSet> {
    let document: Value = serde_json::from_str(content)?;
    parse_document(&document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_single_shape() {
        let set = parse_str(r#"{"name": "Person", "properties": [{"name": "name", "path": "http://schema.org/name", "type": "string", "minCount": 1, "maxCount": 1}]}"#)
            .unwrap();
        assert_eq!(set.shapes.len(), 1);
        let person = &set.shapes[0];
        assert_eq!(person.kind, ShapeKind::Object);
        assert!(person.validate_rdf_type);
        assert_eq!(person.properties[0].datatype, Some(ScalarType::String));
        assert_eq!(person.properties[0].min_count, Some(1));
    }

    #[test]
    fn test_parse_shape_set() {
        let document = json!({
            "shapes": [
                {"name": "Circle", "properties": []},
                {"name": "Square"},
                {"name": "Figure", "kind": "union", "members": ["Circle", "Square"]}
            ]
        });
        let set = parse_document(&document).unwrap();
        assert_eq!(set.shapes.len(), 3);
        assert_eq!(set.shapes[2].kind, ShapeKind::Union);
        assert_eq!(set.shapes[2].members, vec!["Circle", "Square"]);
    }

    #[test]
    fn test_identifier_descriptor() {
        let set = parse_str(
            r#"{"name": "Doc", "identifier": {"kind": "named", "strategy": "contentHash", "namespace": "urn:doc:"}}"#,
        )
        .unwrap();
        let identifier = &set.shapes[0].identifier;
        assert_eq!(identifier.kind, IdentifierKind::Named);
        assert_eq!(identifier.strategy, Some(IdentityStrategy::ContentHashMint));
    }

    #[test]
    fn test_property_needs_exactly_one_value_type() {
        let both = json!({"name": "A", "properties": [
            {"name": "x", "path": "urn:x", "type": "string", "shape": "B"}
        ]});
        assert!(matches!(parse_document(&both), Err(ShapegenError::InvalidDescriptor(_))));

        let neither = json!({"name": "A", "properties": [{"name": "x", "path": "urn:x"}]});
        assert!(parse_document(&neither).is_err());
    }

    #[test]
    fn test_invalid_enum_rejected() {
        let document = json!({"name": "A", "identifier": {"strategy": "sequential"}});
        match parse_document(&document) {
            Err(ShapegenError::InvalidDescriptor(messages)) => {
                assert!(messages.iter().any(|m| m.contains("/identifier/strategy")));
            }
            other => panic!("Expected InvalidDescriptor, got {:?}", other),
        }
    }
}
