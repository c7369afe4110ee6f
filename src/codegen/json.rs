//! Document Codec Emitter
//!
//! Emits, per object type:
//! - `t_properties_to_json` / `t_properties_from_json` /
//!   `t_properties_json_schema` over the property map, parents first
//! - top-level `to_json`, `project_json` (no validation), `from_json`
//!   (validate, then project) and `json_schema`
//!
//! Documents carry the identifier under `@id` and the discriminator under
//! the type's discriminator key. Nested values are embedded documents; an
//! edge inside a recursive group gets an open schema and is validated on
//! its own when projected.

use super::types::{constant_document, quoted, scalar_path, store_parameter, str_slice};
use super::{FieldRegion, FieldValue, ObjectRegion, Routine, UnionRegion};
use crate::model::{Cardinality, IdentityStrategy};

const ID_KEY: &str = "@id";

// =============================================================================
// Field Expressions
// =============================================================================

/// Expression encoding one value bound to `value`
fn encode(field: &FieldRegion, value: &str) -> String {
    match field.shape() {
        Some(handle) => format!("{}({})", handle.routine("to_json"), value),
        None => format!("{}.to_document()", value),
    }
}

/// Decoder function for one value
fn decoder(field: &FieldRegion) -> String {
    match &field.value {
        FieldValue::Shape(handle) if field.recursive => handle.routine("from_json"),
        FieldValue::Shape(handle) => handle.routine("project_json"),
        FieldValue::Scalar(scalar) => format!("{}::from_document", scalar_path(*scalar)),
    }
}

fn key(field: &FieldRegion) -> String {
    format!("{}.to_string()", quoted(&field.key))
}

fn field_to_json(field: &FieldRegion) -> String {
    let accessor = format!("value.{}()", field.field);
    match field.cardinality {
        Cardinality::Required => format!("    object.insert({}, {});\n", key(field), encode(field, &accessor)),
        Cardinality::Optional => format!(
            "    if let Some(item) = {} {{\n        object.insert({}, {});\n    }}\n",
            accessor,
            key(field),
            encode(field, "item")
        ),
        Cardinality::Set { .. } | Cardinality::List { .. } => format!(
            "    object.insert({}, json::array({}, |item| {}));\n",
            key(field),
            accessor,
            encode(field, "item")
        ),
    }
}

fn field_from_json(field: &FieldRegion) -> String {
    let projection = match field.cardinality {
        Cardinality::Required if field.default_value.is_none() => "required",
        Cardinality::Required | Cardinality::Optional => "optional",
        Cardinality::Set { .. } | Cardinality::List { .. } => "sequence",
    };
    let expr = format!(
        "json::{}(object, {}, {})?",
        projection,
        quoted(&field.key),
        decoder(field)
    );
    store_parameter(field, &expr)
}

/// Schema of one value, before cardinality
fn item_schema(field: &FieldRegion) -> String {
    match &field.value {
        FieldValue::Shape(_) if field.recursive => "json::any_object_schema()".to_string(),
        FieldValue::Shape(handle) => format!("{}()", handle.routine("json_schema")),
        FieldValue::Scalar(scalar) if !field.allowed_values.is_empty() => {
            let values: Vec<String> = field
                .allowed_values
                .iter()
                .map(|value| constant_document(value, *scalar))
                .collect();
            format!("json::enumerated(vec![{}])", values.join(", "))
        }
        FieldValue::Scalar(scalar) => format!("{}::document_schema()", scalar_path(*scalar)),
    }
}

fn field_schema(field: &FieldRegion) -> String {
    // Shape values have no scalar document form to pin
    let required_value = match (&field.required_value, field.scalar()) {
        (Some(constant), Some(scalar)) => Some(constant_document(constant, scalar)),
        _ => None,
    };
    match field.cardinality {
        Cardinality::Required | Cardinality::Optional => match required_value {
            Some(value) => format!("json::constant({})", value),
            None => item_schema(field),
        },
        Cardinality::Set { allow_empty } | Cardinality::List { allow_empty } => {
            let array = format!(
                "json::array_schema({}, {})",
                item_schema(field),
                if allow_empty { 0 } else { 1 }
            );
            match required_value {
                Some(value) => format!("json::all_of(vec![{}, json::contains({})])", array, value),
                None => array,
            }
        }
    }
}

fn is_required_key(field: &FieldRegion) -> bool {
    match field.cardinality {
        Cardinality::Required => field.default_value.is_none(),
        Cardinality::Optional => false,
        Cardinality::Set { allow_empty } | Cardinality::List { allow_empty } => !allow_empty,
    }
}

// =============================================================================
// Objects
// =============================================================================

pub fn emit_object(region: &ObjectRegion) -> String {
    let mut output = String::new();
    emit_properties_to_json(&mut output, region);
    emit_properties_from_json(&mut output, region);
    emit_properties_json_schema(&mut output, region);
    if !region.is_abstract {
        emit_top_level(&mut output, region);
    }
    output
}

fn emit_properties_to_json(output: &mut String, region: &ObjectRegion) {
    output.push_str(&format!(
        "pub fn {}_properties_to_json<V: {} + ?Sized>(value: &V, object: &mut json::Map<String, json::Value>) {{\n",
        region.names.prefix, region.names.fields_trait
    ));
    for parent in &region.parents {
        output.push_str(&format!("    {}(value, object);\n", parent.properties_routine("to_json")));
    }
    for field in region.own_fields() {
        output.push_str(&field_to_json(field));
    }
    output.push_str("}\n\n");
}

fn emit_properties_from_json(output: &mut String, region: &ObjectRegion) {
    output.push_str(&format!(
        "pub fn {}_properties_from_json(object: &json::Map<String, json::Value>) -> Result<{}, DocumentError> {{\n",
        region.names.prefix, region.names.properties
    ));
    for (index, parent) in region.parents.iter().enumerate() {
        output.push_str(&format!(
            "    let parent{} = {}(object)?;\n",
            index,
            parent.properties_routine("from_json")
        ));
    }
    let inherited = region.inherited_fields();
    output.push_str(&format!("    Ok({} {{\n", region.names.properties));
    for field in &region.fields {
        match inherited.iter().find(|(_, inherited)| inherited.field == field.field) {
            Some((index, _)) => {
                output.push_str(&format!("        {0}: parent{1}.{0},\n", field.field, index));
            }
            None => {
                output.push_str(&format!("        {}: {},\n", field.field, field_from_json(field)));
            }
        }
    }
    output.push_str("    })\n");
    output.push_str("}\n\n");
}

fn emit_properties_json_schema(output: &mut String, region: &ObjectRegion) {
    output.push_str(&format!(
        "pub fn {}_properties_json_schema(properties: &mut json::Map<String, json::Value>, required: &mut Vec<String>) {{\n",
        region.names.prefix
    ));
    for parent in &region.parents {
        output.push_str(&format!(
            "    {}(properties, required);\n",
            parent.properties_routine("json_schema")
        ));
    }
    for field in region.own_fields() {
        output.push_str(&format!("    properties.insert({}, {});\n", key(field), field_schema(field)));
        if is_required_key(field) {
            output.push_str(&format!("    required.push({});\n", key(field)));
        }
    }
    output.push_str("}\n\n");
}

fn emit_top_level(output: &mut String, region: &ObjectRegion) {
    let routine = Routine::new(region.style, &region.names);
    let indent = routine.indent();
    let prefix = &region.names.prefix;
    let explicit = region.identifier.strategy == IdentityStrategy::ExplicitOnly;

    routine.begin(output);

    routine.open(output, "to_json", &routine.subject(), "json::Value");
    output.push_str(&format!("{}let mut object = json::Map::new();\n", indent));
    output.push_str(&format!(
        "{}object.insert({:?}.to_string(), {}.identifier().to_document());\n",
        indent,
        ID_KEY,
        routine.receiver()
    ));
    output.push_str(&format!(
        "{}object.insert({}.to_string(), json::Value::from({}::DISCRIMINATOR));\n",
        indent,
        quoted(&region.discriminator_key),
        routine.own()
    ));
    output.push_str(&format!(
        "{}{}_properties_to_json({}, &mut object);\n",
        indent,
        prefix,
        routine.receiver()
    ));
    output.push_str(&format!("{}json::Value::Object(object)\n", indent));
    routine.close(output);
    output.push('\n');

    routine.doc(output, "Decode a document assumed valid; see `from_json`");
    routine.open(output, "project_json", "document: &json::Value", &routine.result("DocumentError"));
    output.push_str(&format!("{}let object = json::object(document)?;\n", indent));
    output.push_str(&format!(
        "{}let identifier = json::{}(object, {:?}, {}::from_document)?;\n",
        indent,
        if explicit { "required" } else { "optional" },
        ID_KEY,
        region.identifier_type
    ));
    output.push_str(&format!(
        "{}let properties = {}_properties_from_json(object)?;\n",
        indent, prefix
    ));
    output.push_str(&format!(
        "{}Ok({}::from_properties(identifier, properties))\n",
        indent,
        routine.own()
    ));
    routine.close(output);
    output.push('\n');

    routine.open(output, "from_json", "document: &json::Value", &routine.result("DocumentError"));
    output.push_str(&format!(
        "{}json::validate(&{}(), document)?;\n",
        indent,
        routine.call("json_schema")
    ));
    output.push_str(&format!("{}{}(document)\n", indent, routine.call("project_json")));
    routine.close(output);
    output.push('\n');

    routine.open(output, "json_schema", "", "json::Value");
    output.push_str(&format!("{}let mut properties = json::Map::new();\n", indent));
    output.push_str(&format!("{}let mut required = Vec::new();\n", indent));
    let id_schema = if region.identifier.allowed.is_empty() {
        format!("{}::document_schema()", region.identifier_type)
    } else {
        enumerated(&region.identifier.allowed)
    };
    output.push_str(&format!(
        "{}properties.insert({:?}.to_string(), {});\n",
        indent, ID_KEY, id_schema
    ));
    if explicit {
        output.push_str(&format!("{}required.push({:?}.to_string());\n", indent, ID_KEY));
    }
    output.push_str(&format!(
        "{}properties.insert({}.to_string(), {});\n",
        indent,
        quoted(&region.discriminator_key),
        enumerated(&region.accepted_values)
    ));
    output.push_str(&format!(
        "{}required.push({}.to_string());\n",
        indent,
        quoted(&region.discriminator_key)
    ));
    output.push_str(&format!(
        "{}{}_properties_json_schema(&mut properties, &mut required);\n",
        indent, prefix
    ));
    output.push_str(&format!("{}json::object_schema(properties, required)\n", indent));
    routine.close(output);
    routine.end(output);
}

/// `json::enumerated(vec![json::Value::from("a"), ..])`
fn enumerated(values: &[String]) -> String {
    let values: Vec<String> = values
        .iter()
        .map(|value| format!("json::Value::from({})", quoted(value)))
        .collect();
    format!("json::enumerated(vec![{}])", values.join(", "))
}

// =============================================================================
// Unions
// =============================================================================

pub fn emit_union(region: &UnionRegion) -> String {
    let mut output = String::new();
    let routine = Routine::new(region.style, &region.names);
    let indent = routine.indent();
    let rust_name = &region.names.rust_name;
    // Members no value dispatches to cannot be decoded
    let reachable: Vec<_> = region.members.iter().filter(|m| !m.values.is_empty()).collect();

    routine.begin(&mut output);

    routine.open(&mut output, "to_json", &routine.subject(), "json::Value");
    output.push_str(&format!("{}match {} {{\n", indent, routine.receiver()));
    for member in &region.members {
        output.push_str(&format!(
            "{}    {}::{}(member) => {}(member),\n",
            indent,
            rust_name,
            member.handle.rust_name(),
            member.handle.routine("to_json")
        ));
    }
    output.push_str(&format!("{}}}\n", indent));
    routine.close(&mut output);
    output.push('\n');

    routine.open(&mut output, "project_json", "document: &json::Value", &routine.result("DocumentError"));
    output.push_str(&format!("{}let object = json::object(document)?;\n", indent));
    output.push_str(&format!(
        "{}match json::discriminator(object, {})? {{\n",
        indent,
        quoted(&region.discriminator_key)
    ));
    for member in &reachable {
        let values: Vec<String> = member.values.iter().map(|v| quoted(v)).collect();
        output.push_str(&format!(
            "{}    {} => {}(document).map({}::{}),\n",
            indent,
            values.join(" | "),
            member.handle.routine("project_json"),
            rust_name,
            member.handle.rust_name()
        ));
    }
    output.push_str(&format!(
        "{}    other => Err(DocumentError::UnknownDiscriminator {{\n",
        indent
    ));
    output.push_str(&format!("{}        type_name: {}.to_string(),\n", indent, quoted(&region.shape)));
    output.push_str(&format!("{}        value: other.to_string(),\n", indent));
    output.push_str(&format!("{}    }}),\n", indent));
    output.push_str(&format!("{}}}\n", indent));
    routine.close(&mut output);
    output.push('\n');

    routine.open(&mut output, "from_json", "document: &json::Value", &routine.result("DocumentError"));
    output.push_str(&format!(
        "{}json::validate(&{}(), document)?;\n",
        indent,
        routine.call("json_schema")
    ));
    output.push_str(&format!("{}{}(document)\n", indent, routine.call("project_json")));
    routine.close(&mut output);
    output.push('\n');

    routine.open(&mut output, "json_schema", "", "json::Value");
    output.push_str(&format!("{}json::one_of(vec![\n", indent));
    for member in &reachable {
        output.push_str(&format!(
            "{}    json::all_of(vec![{}(), json::discriminated({}, {})]),\n",
            indent,
            member.handle.routine("json_schema"),
            quoted(&region.discriminator_key),
            str_slice(&member.values)
        ));
    }
    output.push_str(&format!("{}])\n", indent));
    routine.close(&mut output);
    routine.end(&mut output);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::tests::{object_region, union_region};

    const SHAPES: &str = r#"{"shapes": [
        {"name": "Item", "abstract": true, "properties": [
            {"name": "title", "path": "urn:title", "type": "string", "minCount": 1, "maxCount": 1}
        ]},
        {"name": "Book", "parents": ["Item"], "properties": [
            {"name": "pages", "path": "urn:pages", "type": "integer", "maxCount": 1},
            {"name": "format", "path": "urn:format", "type": "string", "maxCount": 1, "in": ["paper", "ebook"]},
            {"name": "inPrint", "path": "urn:inPrint", "type": "boolean", "maxCount": 1, "defaultValue": true},
            {"name": "authors", "path": "urn:author", "shape": "Author", "minCount": 1},
            {"name": "sequel", "path": "urn:sequel", "shape": "Book", "maxCount": 1},
            {"name": "kind", "path": "urn:kind", "type": "string", "hasValue": "book"}
        ]},
        {"name": "Author", "style": "record",
            "identifier": {"kind": "named", "strategy": "explicit"},
            "properties": [
                {"name": "name", "path": "urn:name", "type": "string", "minCount": 1, "maxCount": 1}
            ]},
        {"kind": "union", "name": "Work", "members": ["Book", "Author"]}
    ]}"#;

    #[test]
    fn test_properties_to_json() {
        let code = emit_object(&object_region(SHAPES, "Book"));
        assert!(code.contains("    item_properties_to_json(value, object);\n"));
        assert!(code.contains("    if let Some(item) = value.pages() {\n        object.insert(\"pages\".to_string(), item.to_document());\n    }\n"));
        assert!(code.contains("    object.insert(\"inPrint\".to_string(), value.in_print().to_document());\n"));
        assert!(code.contains("    object.insert(\"authors\".to_string(), json::array(value.authors(), |item| author_to_json(item)));\n"));
        assert!(code.contains("        object.insert(\"sequel\".to_string(), Book::to_json(item));\n"));
    }

    #[test]
    fn test_properties_from_json() {
        let code = emit_object(&object_region(SHAPES, "Book"));
        assert!(code.contains("    let parent0 = item_properties_from_json(object)?;\n"));
        assert!(code.contains("        title: parent0.title,\n"));
        assert!(code.contains("        pages: json::optional(object, \"pages\", i64::from_document)?,\n"));
        assert!(code.contains("        in_print: json::optional(object, \"inPrint\", bool::from_document)?.unwrap_or(true),\n"));
        assert!(code.contains("        authors: json::sequence(object, \"authors\", author_project_json)?,\n"));
        assert!(code.contains("        sequel: json::optional(object, \"sequel\", Book::from_json)?.map(Box::new),\n"));
    }

    #[test]
    fn test_properties_schema() {
        let code = emit_object(&object_region(SHAPES, "Book"));
        assert!(code.contains("    properties.insert(\"format\".to_string(), json::enumerated(vec![\"paper\".to_document(), \"ebook\".to_document()]));\n"));
        assert!(code.contains("    properties.insert(\"authors\".to_string(), json::array_schema(author_json_schema(), 1));\n    required.push(\"authors\".to_string());\n"));
        assert!(code.contains("    properties.insert(\"sequel\".to_string(), json::any_object_schema());\n"));
        assert!(code.contains("json::all_of(vec![json::array_schema(String::document_schema(), 0), json::contains(\"book\".to_document())])"));
        assert!(!code.contains("required.push(\"inPrint\""));
    }

    #[test]
    fn test_top_level_class() {
        let code = emit_object(&object_region(SHAPES, "Book"));
        assert!(code.contains("impl Book {\n    pub fn to_json(&self) -> json::Value {\n        let mut object = json::Map::new();\n        object.insert(\"@id\".to_string(), self.identifier().to_document());\n"));
        assert!(code.contains("        object.insert(\"type\".to_string(), json::Value::from(Self::DISCRIMINATOR));\n"));
        assert!(code.contains("        let identifier = json::optional(object, \"@id\", Identifier::from_document)?;\n"));
        assert!(code.contains("    pub fn from_json(document: &json::Value) -> Result<Self, DocumentError> {\n        json::validate(&Self::json_schema(), document)?;\n        Self::project_json(document)\n    }"));
        assert!(code.contains("        properties.insert(\"type\".to_string(), json::enumerated(vec![json::Value::from(\"Book\")]));\n"));
    }

    #[test]
    fn test_top_level_record() {
        let code = emit_object(&object_region(SHAPES, "Author"));
        assert!(code.contains("pub fn author_to_json(value: &Author) -> json::Value {\n"));
        assert!(code.contains("    object.insert(\"@id\".to_string(), value.identifier().to_document());\n"));
        assert!(code.contains("    object.insert(\"type\".to_string(), json::Value::from(Author::DISCRIMINATOR));\n"));
        assert!(code.contains("pub fn author_project_json(document: &json::Value) -> Result<Author, DocumentError> {\n"));
        assert!(code.contains("    let identifier = json::required(object, \"@id\", NamedNode::from_document)?;\n"));
        assert!(code.contains("    Ok(Author::from_properties(identifier, properties))\n"));
        assert!(code.contains("    json::validate(&author_json_schema(), document)?;\n    author_project_json(document)\n"));
        assert!(code.contains("    required.push(\"@id\".to_string());\n"));
    }

    #[test]
    fn test_union() {
        let code = emit_union(&union_region(SHAPES, "Work"));
        assert!(code.contains("            Work::Book(member) => Book::to_json(member),\n"));
        assert!(code.contains("            Work::Author(member) => author_to_json(member),\n"));
        assert!(code.contains("        match json::discriminator(object, \"type\")? {\n"));
        assert!(code.contains("            \"Book\" => Book::project_json(document).map(Work::Book),\n"));
        assert!(code.contains("            other => Err(DocumentError::UnknownDiscriminator {\n                type_name: \"Work\".to_string(),\n"));
        assert!(code.contains("            json::all_of(vec![author_json_schema(), json::discriminated(\"type\", &[\"Author\"])]),\n"));
    }
}
