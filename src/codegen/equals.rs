//! Equality Emitter
//!
//! Property-level `t_properties_equals` is generic over the accessor trait,
//! so a child compares its inherited properties by calling each parent's
//! routine on itself. Comparison is structural over the effective
//! properties; identifiers are not compared. The first difference is
//! returned wrapped in the property it was found under.

use super::types::value_ref;
use super::{FieldRegion, ObjectRegion, UnionRegion};
use crate::model::{Cardinality, DeclarationStyle};

/// Expression comparing two single values bound to `l` and `r` style names
fn compare(field: &FieldRegion, left: &str, right: &str) -> String {
    match field.shape() {
        Some(handle) => format!("{}({}, {})", handle.routine("equals"), left, right),
        None => format!("strict_equals({}, {})", value_ref(field, left), value_ref(field, right)),
    }
}

fn field_comparison(field: &FieldRegion) -> String {
    let left = format!("left.{}()", field.field);
    let right = format!("right.{}()", field.field);
    let inner = match field.cardinality {
        Cardinality::Required => compare(field, &left, &right),
        Cardinality::Optional => {
            let closure = match field.shape() {
                Some(handle) => format!("|l, r| {}(l, r)", handle.routine("equals")),
                None => "|l, r| strict_equals(l, r)".to_string(),
            };
            format!("option_equals({}, {}, {})", left, right, closure)
        }
        Cardinality::Set { .. } | Cardinality::List { .. } => {
            let closure = match field.shape() {
                Some(handle) => handle.routine("equals"),
                None => "|l, r| strict_equals(l, r)".to_string(),
            };
            format!("sequence_equals({}, {}, {})", left, right, closure)
        }
    };
    format!("    property({:?}, {})?;\n", field.key, inner)
}

pub fn emit_object(region: &ObjectRegion) -> String {
    let mut output = String::new();
    let prefix = &region.names.prefix;

    output.push_str(&format!(
        "pub fn {}_properties_equals<V: {} + ?Sized>(left: &V, right: &V) -> EqualsResult {{\n",
        prefix, region.names.fields_trait
    ));
    for parent in &region.parents {
        output.push_str(&format!("    {}(left, right)?;\n", parent.properties_routine("equals")));
    }
    for field in region.own_fields() {
        output.push_str(&field_comparison(field));
    }
    output.push_str("    Ok(())\n");
    output.push_str("}\n\n");

    if region.is_abstract {
        return output;
    }

    let rust_name = &region.names.rust_name;
    match region.style {
        DeclarationStyle::Class => {
            output.push_str(&format!("impl {} {{\n", rust_name));
            output.push_str("    pub fn equals(&self, other: &Self) -> EqualsResult {\n");
            output.push_str(&format!("        {}_properties_equals(self, other)\n", prefix));
            output.push_str("    }\n");
            output.push_str("}\n\n");
        }
        DeclarationStyle::Record => {
            output.push_str(&format!(
                "pub fn {0}_equals(left: &{1}, right: &{1}) -> EqualsResult {{\n",
                prefix, rust_name
            ));
            output.push_str(&format!("    {}_properties_equals(left, right)\n", prefix));
            output.push_str("}\n\n");
        }
    }
    output
}

pub fn emit_union(region: &UnionRegion) -> String {
    let mut output = String::new();
    let rust_name = &region.names.rust_name;

    let (signature, left, right, indent) = match region.style {
        DeclarationStyle::Class => (
            "    pub fn equals(&self, other: &Self) -> EqualsResult {\n".to_string(),
            "self",
            "other",
            "    ",
        ),
        DeclarationStyle::Record => (
            format!(
                "pub fn {0}_equals(left: &{1}, right: &{1}) -> EqualsResult {{\n",
                region.names.prefix, rust_name
            ),
            "left",
            "right",
            "",
        ),
    };

    if region.style == DeclarationStyle::Class {
        output.push_str(&format!("impl {} {{\n", rust_name));
    }
    output.push_str(&signature);
    output.push_str(&format!("{}    match ({}, {}) {{\n", indent, left, right));
    for member in &region.members {
        let name = member.handle.rust_name();
        output.push_str(&format!(
            "{0}        ({1}::{2}(left), {1}::{2}(right)) => {3}(left, right),\n",
            indent,
            rust_name,
            name,
            member.handle.routine("equals")
        ));
    }
    if region.members.len() > 1 {
        output.push_str(&format!(
            "{}        (left, right) => Err(Unequal::Discriminator {{\n",
            indent
        ));
        output.push_str(&format!("{}            left: left.discriminator().to_string(),\n", indent));
        output.push_str(&format!("{}            right: right.discriminator().to_string(),\n", indent));
        output.push_str(&format!("{}        }}),\n", indent));
    }
    output.push_str(&format!("{}    }}\n", indent));
    output.push_str(&format!("{}}}\n", indent));
    if region.style == DeclarationStyle::Class {
        output.push_str("}\n");
    }
    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::tests::{object_region, union_region};

    const SHAPES: &str = r#"{"shapes": [
        {"name": "Base", "abstract": true, "properties": [
            {"name": "label", "path": "urn:label", "type": "string", "maxCount": 1}
        ]},
        {"name": "Point", "style": "record", "properties": [
            {"name": "x", "path": "urn:x", "type": "double", "minCount": 1, "maxCount": 1}
        ]},
        {"name": "Path", "parents": ["Base"], "properties": [
            {"name": "points", "path": "urn:points", "shape": "Point", "list": true},
            {"name": "closed", "path": "urn:closed", "type": "boolean", "minCount": 1, "maxCount": 1},
            {"name": "start", "path": "urn:start", "shape": "Point", "maxCount": 1},
            {"name": "tags", "path": "urn:tag", "type": "string"}
        ]},
        {"kind": "union", "name": "Drawing", "members": ["Point", "Path"]}
    ]}"#;

    #[test]
    fn test_property_level_routine() {
        let code = emit_object(&object_region(SHAPES, "Path"));
        assert!(code.contains("pub fn path_properties_equals<V: PathFields + ?Sized>(left: &V, right: &V) -> EqualsResult {\n    base_properties_equals(left, right)?;\n"));
        assert!(code.contains("    property(\"points\", sequence_equals(left.points(), right.points(), point_equals))?;\n"));
        assert!(code.contains("    property(\"closed\", strict_equals(&left.closed(), &right.closed()))?;\n"));
        assert!(code.contains("    property(\"start\", option_equals(left.start(), right.start(), |l, r| point_equals(l, r)))?;\n"));
        assert!(code.contains("    property(\"tags\", sequence_equals(left.tags(), right.tags(), |l, r| strict_equals(l, r)))?;\n"));
        assert!(code.contains("impl Path {\n    pub fn equals(&self, other: &Self) -> EqualsResult {\n        path_properties_equals(self, other)\n    }\n}"));
    }

    #[test]
    fn test_abstract_has_no_top_level() {
        let code = emit_object(&object_region(SHAPES, "Base"));
        assert!(code.contains("    property(\"label\", option_equals(left.label(), right.label(), |l, r| strict_equals(l, r)))?;\n"));
        assert!(!code.contains("impl Base"));
    }

    #[test]
    fn test_record_top_level() {
        let code = emit_object(&object_region(SHAPES, "Point"));
        assert!(code.contains("pub fn point_equals(left: &Point, right: &Point) -> EqualsResult {\n    point_properties_equals(left, right)\n}"));
    }

    #[test]
    fn test_union_dispatch() {
        let code = emit_union(&union_region(SHAPES, "Drawing"));
        assert!(code.contains("        match (self, other) {\n"));
        assert!(code.contains("            (Drawing::Point(left), Drawing::Point(right)) => point_equals(left, right),\n"));
        assert!(code.contains("            (Drawing::Path(left), Drawing::Path(right)) => Path::equals(left, right),\n"));
        assert!(code.contains("            (left, right) => Err(Unequal::Discriminator {\n"));
    }
}
