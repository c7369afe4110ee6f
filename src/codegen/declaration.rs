//! Declaration Emitter
//!
//! Emits, per object type:
//! - the accessor trait `TFields`, with direct parents' traits as supertraits
//! - the decoded property record `TProperties`
//! - for concrete types: the struct, `TParameters`, construction,
//!   identifier access, setters and the accessor trait impls
//!
//! and per union type the enum with its dispatch helpers.

use super::types::{accessor_body, accessor_type, doc_comment, parameter_type, quoted, store_parameter, stored_type};
use super::{FieldRegion, ObjectRegion, UnionRegion};
use crate::model::{Cardinality, DeclarationStyle, IdentityStrategy};

// =============================================================================
// Objects
// =============================================================================

pub fn emit_object(region: &ObjectRegion) -> String {
    let mut output = String::new();
    emit_fields_trait(&mut output, region);
    emit_properties(&mut output, region);
    if !region.is_abstract {
        emit_struct(&mut output, region);
        emit_parameters(&mut output, region);
        emit_inherent(&mut output, region);
        if region.style == DeclarationStyle::Record {
            emit_from_parameters(&mut output, region);
        }
        emit_trait_impls(&mut output, region);
    }
    output
}

fn emit_fields_trait(output: &mut String, region: &ObjectRegion) {
    output.push_str(&doc_comment(region.comment.as_deref(), ""));
    let supertraits: Vec<&str> = region.parents.iter().map(|p| p.names.fields_trait.as_str()).collect();
    if supertraits.is_empty() {
        output.push_str(&format!("pub trait {} {{\n", region.names.fields_trait));
    } else {
        output.push_str(&format!(
            "pub trait {}: {} {{\n",
            region.names.fields_trait,
            supertraits.join(" + ")
        ));
    }
    for field in region.own_fields() {
        output.push_str(&doc_comment(field.comment.as_deref(), "    "));
        output.push_str(&format!("    fn {}(&self) -> {};\n", field.field, accessor_type(field)));
    }
    output.push_str("}\n\n");
}

fn emit_properties(output: &mut String, region: &ObjectRegion) {
    output.push_str(&format!("/// Properties of `{}` decoded from a document or graph\n", region.shape));
    output.push_str("#[derive(Debug, Clone)]\n");
    output.push_str(&format!("pub struct {} {{\n", region.names.properties));
    for field in &region.fields {
        output.push_str(&format!("    pub {}: {},\n", field.field, stored_type(field)));
    }
    output.push_str("}\n\n");
}

fn is_explicit(region: &ObjectRegion) -> bool {
    region.identifier.strategy == IdentityStrategy::ExplicitOnly
}

/// Stored identifier type
fn identifier_field_type(region: &ObjectRegion) -> String {
    if is_explicit(region) {
        region.identifier_type.to_string()
    } else {
        format!("LazyIdentifier<{}>", region.identifier_type)
    }
}

/// Wrap a supplied identifier expression for storage
fn store_identifier(region: &ObjectRegion, expr: &str) -> String {
    if is_explicit(region) {
        expr.to_string()
    } else {
        format!("LazyIdentifier::from_option({})", expr)
    }
}

fn identifier_parameter(region: &ObjectRegion) -> String {
    if is_explicit(region) {
        region.identifier_type.to_string()
    } else {
        format!("Option<{}>", region.identifier_type)
    }
}

fn emit_struct(output: &mut String, region: &ObjectRegion) {
    output.push_str(&doc_comment(region.comment.as_deref(), ""));
    output.push_str("#[derive(Debug, Clone)]\n");
    output.push_str(&format!("pub struct {} {{\n", region.names.rust_name));
    output.push_str(&format!("    identifier: {},\n", identifier_field_type(region)));
    for field in &region.fields {
        let visibility = match region.style {
            DeclarationStyle::Class => "",
            DeclarationStyle::Record => field.visibility.keyword(),
        };
        output.push_str(&format!("    {}{}: {},\n", visibility, field.field, stored_type(field)));
    }
    output.push_str("}\n\n");
}

fn emit_parameters(output: &mut String, region: &ObjectRegion) {
    output.push_str(&format!("/// Constructor input for [`{}`]\n", region.names.rust_name));
    output.push_str("#[derive(Debug, Clone)]\n");
    output.push_str(&format!("pub struct {} {{\n", region.names.parameters));
    output.push_str(&format!("    pub identifier: {},\n", identifier_parameter(region)));
    for field in &region.fields {
        output.push_str(&format!("    pub {}: {},\n", field.field, parameter_type(field)));
    }
    output.push_str("}\n\n");
}

/// `Self { .. }` built from parameters
fn construct_from_parameters(region: &ObjectRegion, indent: &str) -> String {
    let mut body = format!("{}Self {{\n", indent);
    body.push_str(&format!(
        "{}    identifier: {},\n",
        indent,
        store_identifier(region, "parameters.identifier")
    ));
    for field in &region.fields {
        let expr = format!("parameters.{}", field.field);
        body.push_str(&format!("{}    {}: {},\n", indent, field.field, store_parameter(field, &expr)));
    }
    body.push_str(&format!("{}}}\n", indent));
    body
}

fn mint_expression(region: &ObjectRegion) -> String {
    let namespace = quoted(region.identifier.namespace.as_deref().unwrap_or_default());
    let type_name = quoted(&region.shape);
    match region.identifier.strategy {
        IdentityStrategy::ExplicitOnly => String::new(),
        IdentityStrategy::BlankDefault if region.identifier_type == "BlankNode" => "mint_blank".to_string(),
        IdentityStrategy::BlankDefault => format!("|| {}::from(mint_blank())", region.identifier_type),
        IdentityStrategy::RandomMint => format!("|| mint_random({}, {})", namespace, type_name),
        IdentityStrategy::ContentHashMint => format!(
            "|| mint_content_hash({}, {}, |hasher| {}_properties_hash(self, hasher))",
            namespace, type_name, region.names.prefix
        ),
    }
}

fn emit_inherent(output: &mut String, region: &ObjectRegion) {
    let rust_name = &region.names.rust_name;
    let discriminator = region.discriminator().unwrap_or(&region.shape);

    output.push_str(&format!("impl {} {{\n", rust_name));
    output.push_str("    /// Discriminator value written on encode\n");
    output.push_str(&format!("    pub const DISCRIMINATOR: &'static str = {};\n\n", quoted(discriminator)));

    if region.style == DeclarationStyle::Class {
        output.push_str(&format!("    pub fn new(parameters: {}) -> Self {{\n", region.names.parameters));
        output.push_str(&construct_from_parameters(region, "        "));
        output.push_str("    }\n\n");
    }

    output.push_str("    /// Assemble from decoded properties\n");
    output.push_str(&format!(
        "    pub fn from_properties(identifier: {}, properties: {}) -> Self {{\n",
        identifier_parameter(region),
        region.names.properties
    ));
    output.push_str("        Self {\n");
    output.push_str(&format!("            identifier: {},\n", store_identifier(region, "identifier")));
    for field in &region.fields {
        output.push_str(&format!("            {0}: properties.{0},\n", field.field));
    }
    output.push_str("        }\n");
    output.push_str("    }\n\n");

    if is_explicit(region) {
        output.push_str(&format!("    pub fn identifier(&self) -> &{} {{\n", region.identifier_type));
        output.push_str("        &self.identifier\n");
        output.push_str("    }\n");
    } else {
        output.push_str("    /// Identifier, minted on first read when none was supplied\n");
        output.push_str(&format!("    pub fn identifier(&self) -> &{} {{\n", region.identifier_type));
        output.push_str(&format!("        self.identifier.get_or_mint({})\n", mint_expression(region)));
        output.push_str("    }\n");
    }

    if region.style == DeclarationStyle::Class {
        for field in region.fields.iter().filter(|f| f.mutable) {
            output.push_str(&format!(
                "\n    pub fn set_{}(&mut self, value: {}) {{\n",
                field.field.trim_end_matches('_'),
                setter_type(field)
            ));
            output.push_str(&format!("        self.{} = {};\n", field.field, setter_store(field)));
            output.push_str("    }\n");
        }
    }
    output.push_str("}\n\n");
}

/// Setters take the unboxed value; defaults do not apply
fn setter_type(field: &FieldRegion) -> String {
    if field.boxed {
        parameter_type(field)
    } else {
        stored_type(field)
    }
}

fn setter_store(field: &FieldRegion) -> &'static str {
    match field.cardinality {
        Cardinality::Required if field.boxed => "Box::new(value)",
        Cardinality::Optional if field.boxed => "value.map(Box::new)",
        _ => "value",
    }
}

fn emit_from_parameters(output: &mut String, region: &ObjectRegion) {
    output.push_str(&format!(
        "impl From<{}> for {} {{\n",
        region.names.parameters, region.names.rust_name
    ));
    output.push_str(&format!("    fn from(parameters: {}) -> Self {{\n", region.names.parameters));
    output.push_str(&construct_from_parameters(region, "        "));
    output.push_str("    }\n");
    output.push_str("}\n\n");
}

fn emit_trait_impls(output: &mut String, region: &ObjectRegion) {
    let mut owners: Vec<(&str, &str)> = region
        .ancestors
        .iter()
        .map(|ancestor| (ancestor.shape.as_str(), ancestor.names.fields_trait.as_str()))
        .collect();
    owners.push((&region.shape, &region.names.fields_trait));

    for (owner, fields_trait) in owners {
        let fields: Vec<_> = region.fields.iter().filter(|f| f.owner == owner).collect();
        if fields.is_empty() {
            output.push_str(&format!("impl {} for {} {{}}\n\n", fields_trait, region.names.rust_name));
            continue;
        }
        output.push_str(&format!("impl {} for {} {{\n", fields_trait, region.names.rust_name));
        for (index, field) in fields.iter().enumerate() {
            if index > 0 {
                output.push('\n');
            }
            output.push_str(&format!("    fn {}(&self) -> {} {{\n", field.field, accessor_type(field)));
            output.push_str(&format!(
                "        {}\n",
                accessor_body(field, &format!("self.{}", field.field))
            ));
            output.push_str("    }\n");
        }
        output.push_str("}\n\n");
    }
}

// =============================================================================
// Unions
// =============================================================================

pub fn emit_union(region: &UnionRegion) -> String {
    let mut output = String::new();
    let rust_name = &region.names.rust_name;

    output.push_str(&doc_comment(region.comment.as_deref(), ""));
    output.push_str("#[derive(Debug, Clone)]\n");
    output.push_str(&format!("pub enum {} {{\n", rust_name));
    for member in &region.members {
        output.push_str(&format!("    {0}({0}),\n", member.handle.rust_name()));
    }
    output.push_str("}\n\n");

    output.push_str(&format!("impl {} {{\n", rust_name));
    output.push_str("    /// Discriminator value of the held member\n");
    output.push_str("    pub fn discriminator(&self) -> &'static str {\n");
    output.push_str("        match self {\n");
    for member in &region.members {
        let name = member.handle.rust_name();
        if member.handle.is_union {
            output.push_str(&format!("            Self::{}(value) => value.discriminator(),\n", name));
        } else {
            output.push_str(&format!("            Self::{0}(_) => {0}::DISCRIMINATOR,\n", name));
        }
    }
    output.push_str("        }\n");
    output.push_str("    }\n\n");

    output.push_str("    pub fn identifier(&self) -> Identifier {\n");
    output.push_str("        match self {\n");
    for member in &region.members {
        let name = member.handle.rust_name();
        if member.handle.is_union {
            output.push_str(&format!("            Self::{}(value) => value.identifier(),\n", name));
        } else {
            output.push_str(&format!(
                "            Self::{}(value) => Identifier::from(value.identifier().clone()),\n",
                name
            ));
        }
    }
    output.push_str("        }\n");
    output.push_str("    }\n");
    output.push_str("}\n\n");

    for member in &region.members {
        output.push_str(&format!(
            "impl From<{0}> for {1} {{\n    fn from(value: {0}) -> Self {{\n        Self::{0}(value)\n    }}\n}}\n\n",
            member.handle.rust_name(),
            rust_name
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::tests::{object_region, union_region};

    const PEOPLE: &str = r#"{"shapes": [
        {"name": "Agent", "abstract": true, "comment": "Something that acts", "properties": [
            {"name": "label", "path": "urn:label", "type": "string", "maxCount": 1}
        ]},
        {"name": "Person", "parents": ["Agent"], "properties": [
            {"name": "givenName", "path": "urn:given", "type": "string", "minCount": 1, "maxCount": 1, "mutable": true},
            {"name": "active", "path": "urn:active", "type": "boolean", "maxCount": 1, "defaultValue": true},
            {"name": "nicknames", "path": "urn:nick", "type": "string"},
            {"name": "friend", "path": "urn:friend", "shape": "Person", "maxCount": 1}
        ]}
    ]}"#;

    #[test]
    fn test_abstract_emits_trait_and_properties_only() {
        let code = emit_object(&object_region(PEOPLE, "Agent"));
        assert!(code.contains("/// Something that acts\npub trait AgentFields {\n    fn label(&self) -> Option<&str>;\n}"));
        assert!(code.contains("pub struct AgentProperties {\n    pub label: Option<String>,\n}"));
        assert!(!code.contains("pub struct Agent {"));
    }

    #[test]
    fn test_concrete_class() {
        let code = emit_object(&object_region(PEOPLE, "Person"));
        assert!(code.contains("pub trait PersonFields: AgentFields {"));
        assert!(code.contains("    identifier: LazyIdentifier<Identifier>,\n    label: Option<String>,\n    given_name: String,"));
        assert!(code.contains("    friend: Option<Box<Person>>,"));
        assert!(code.contains("    pub active: Option<bool>,"));
        assert!(code.contains("            active: parameters.active.unwrap_or(true),"));
        assert!(code.contains("            friend: parameters.friend.map(Box::new),"));
        assert!(code.contains("    pub const DISCRIMINATOR: &'static str = \"Person\";"));
        assert!(code.contains("self.identifier.get_or_mint(|| Identifier::from(mint_blank()))"));
        assert!(code.contains("    pub fn set_given_name(&mut self, value: String) {\n        self.given_name = value;"));
        assert!(code.contains("impl AgentFields for Person {\n    fn label(&self) -> Option<&str> {\n        self.label.as_deref()\n    }\n}"));
        assert!(code.contains("    fn friend(&self) -> Option<&Person> {\n        self.friend.as_deref()\n    }"));
        assert!(!code.contains("impl From<PersonParameters>"));
    }

    #[test]
    fn test_record_style_and_explicit_identifier() {
        let code = emit_object(&object_region(
            r#"{"name": "Tag", "style": "record",
                "identifier": {"kind": "named", "strategy": "explicit"},
                "properties": [
                    {"name": "code", "path": "urn:code", "type": "string", "minCount": 1, "maxCount": 1, "visibility": "private"},
                    {"name": "weight", "path": "urn:weight", "type": "integer", "maxCount": 1}
                ]}"#,
            "Tag",
        ));
        assert!(code.contains("    identifier: NamedNode,\n    code: String,\n    pub weight: Option<i64>,"));
        assert!(code.contains("    pub identifier: NamedNode,"));
        assert!(code.contains("impl From<TagParameters> for Tag {"));
        assert!(code.contains("            identifier: parameters.identifier,"));
        assert!(!code.contains("    pub fn new("));
        assert!(code.contains("    pub fn identifier(&self) -> &NamedNode {\n        &self.identifier\n    }"));
    }

    #[test]
    fn test_content_hash_mint() {
        let code = emit_object(&object_region(
            r#"{"name": "Doc", "identifier": {"strategy": "contentHash", "namespace": "urn:doc:"}}"#,
            "Doc",
        ));
        assert!(code.contains(
            "self.identifier.get_or_mint(|| mint_content_hash(\"urn:doc:\", \"Doc\", |hasher| doc_properties_hash(self, hasher)))"
        ));
    }

    #[test]
    fn test_union_declaration() {
        let code = emit_union(&union_region(
            r#"{"shapes": [
                {"name": "Circle"},
                {"name": "Square"},
                {"kind": "union", "name": "Figure", "members": ["Circle", "Square"]}
            ]}"#,
            "Figure",
        ));
        assert!(code.contains("pub enum Figure {\n    Circle(Circle),\n    Square(Square),\n}"));
        assert!(code.contains("            Self::Circle(_) => Circle::DISCRIMINATOR,"));
        assert!(code.contains("            Self::Square(value) => Identifier::from(value.identifier().clone()),"));
        assert!(code.contains("impl From<Circle> for Figure {"));
    }
}
