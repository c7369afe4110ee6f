//! Hash Emitter
//!
//! Mirrors the equality emitter: `t_properties_hash` feeds parents first,
//! then own properties in declaration order. Identifiers are not hashed,
//! so a content-hash identifier can be minted from this routine.

use super::{FieldRegion, ObjectRegion, UnionRegion};
use crate::model::{Cardinality, DeclarationStyle};

/// Statement feeding one value bound to `value` into `hasher`
fn feed(field: &FieldRegion, value: &str, hasher: &str) -> String {
    match field.shape() {
        Some(handle) => format!("{}({}, {});", handle.routine("hash"), value, hasher),
        None => format!("{}.hash_value({});", value, hasher),
    }
}

fn field_hash(field: &FieldRegion) -> String {
    let accessor = format!("value.{}()", field.field);
    match field.cardinality {
        Cardinality::Required => format!("    {}\n", feed(field, &accessor, "hasher")),
        Cardinality::Optional => format!(
            "    if let Some(item) = {} {{\n        {}\n    }}\n",
            accessor,
            feed(field, "item", "hasher")
        ),
        Cardinality::Set { .. } | Cardinality::List { .. } => {
            let item = match field.shape() {
                Some(handle) => format!("{}(item, digest)", handle.routine("hash")),
                None => "item.hash_value(digest)".to_string(),
            };
            format!("    hash_sequence({}, hasher, |item, digest| {});\n", accessor, item)
        }
    }
}

pub fn emit_object(region: &ObjectRegion) -> String {
    let mut output = String::new();
    let prefix = &region.names.prefix;

    output.push_str(&format!(
        "pub fn {}_properties_hash<V: {} + ?Sized, H: ShapeHasher + ?Sized>(value: &V, hasher: &mut H) {{\n",
        prefix, region.names.fields_trait
    ));
    for parent in &region.parents {
        output.push_str(&format!("    {}(value, hasher);\n", parent.properties_routine("hash")));
    }
    for field in region.own_fields() {
        output.push_str(&field_hash(field));
    }
    output.push_str("}\n\n");

    if region.is_abstract {
        return output;
    }

    let rust_name = &region.names.rust_name;
    match region.style {
        DeclarationStyle::Class => {
            output.push_str(&format!("impl {} {{\n", rust_name));
            output.push_str("    pub fn hash<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {\n");
            output.push_str(&format!("        {}_properties_hash(self, hasher)\n", prefix));
            output.push_str("    }\n");
            output.push_str("}\n\n");
        }
        DeclarationStyle::Record => {
            output.push_str(&format!(
                "pub fn {}_hash<H: ShapeHasher + ?Sized>(value: &{}, hasher: &mut H) {{\n",
                prefix, rust_name
            ));
            output.push_str(&format!("    {}_properties_hash(value, hasher)\n", prefix));
            output.push_str("}\n\n");
        }
    }
    output
}

pub fn emit_union(region: &UnionRegion) -> String {
    let mut output = String::new();
    let rust_name = &region.names.rust_name;

    let (subject, indent) = match region.style {
        DeclarationStyle::Class => {
            output.push_str(&format!("impl {} {{\n", rust_name));
            output.push_str("    pub fn hash<H: ShapeHasher + ?Sized>(&self, hasher: &mut H) {\n");
            ("self", "    ")
        }
        DeclarationStyle::Record => {
            output.push_str(&format!(
                "pub fn {}_hash<H: ShapeHasher + ?Sized>(value: &{}, hasher: &mut H) {{\n",
                region.names.prefix, rust_name
            ));
            ("value", "")
        }
    };

    output.push_str(&format!("{}    match {} {{\n", indent, subject));
    for member in &region.members {
        output.push_str(&format!(
            "{}        {}::{}(member) => {}(member, hasher),\n",
            indent,
            rust_name,
            member.handle.rust_name(),
            member.handle.routine("hash")
        ));
    }
    output.push_str(&format!("{}    }}\n", indent));
    output.push_str(&format!("{}}}\n", indent));
    if region.style == DeclarationStyle::Class {
        output.push_str("}\n");
    }
    output.push('\n');
    output
}
