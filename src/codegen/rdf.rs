//! Graph Codec Emitter
//!
//! Emits, per object type:
//! - `t_properties_to_rdf`: parents first (their type tags suppressed),
//!   then own type tags, then one statement per value
//! - `t_properties_from_rdf`: type tag check, parents, then each property
//!   through the `Values` pipeline
//! - top-level `to_rdf` / `from_rdf` binding the identifier
//!
//! Unions encode through the held member and decode by trying members in
//! declaration order; members always validate their type tags.

use super::types::{constant_ref, constant_term, quoted, str_slice, value_ref};
use super::{FieldRegion, ObjectRegion, Routine, ShapeHandle, UnionRegion};
use crate::model::{Cardinality, IdentityStrategy};

// =============================================================================
// Encoding
// =============================================================================

/// Statements adding one nested value bound to `item`
fn add_nested(handle: &ShapeHandle, field: &FieldRegion, item: &str, indent: &str) -> String {
    format!(
        "{0}let options = resource.nested_options();\n\
         {0}let child = {1}({2}, resource.dataset_mut(), &options);\n\
         {0}resource.add({3}, &child);\n",
        indent,
        handle.routine("to_rdf"),
        item,
        quoted(&field.predicate)
    )
}

fn field_to_rdf(field: &FieldRegion) -> String {
    let accessor = format!("value.{}()", field.field);
    let predicate = quoted(&field.predicate);

    if let Some(handle) = field.shape() {
        return match field.cardinality {
            Cardinality::Required => format!("    {{\n{}    }}\n", add_nested(handle, field, &accessor, "        ")),
            Cardinality::Optional => format!(
                "    if let Some(item) = {} {{\n{}    }}\n",
                accessor,
                add_nested(handle, field, "item", "        ")
            ),
            Cardinality::Set { .. } => format!(
                "    for item in {} {{\n{}    }}\n",
                accessor,
                add_nested(handle, field, "item", "        ")
            ),
            Cardinality::List { .. } => format!(
                "    {{\n        let options = resource.nested_options();\n        resource.add_list({}, {}, |item, dataset| Term::from({}(item, dataset, &options)));\n    }}\n",
                predicate,
                accessor,
                handle.routine("to_rdf")
            ),
        };
    }

    match field.cardinality {
        Cardinality::Required => match (&field.default_value, field.scalar()) {
            (Some(default), Some(scalar)) => format!(
                "    resource.add_unless_default({}, {}, {});\n",
                predicate,
                value_ref(field, &accessor),
                constant_ref(default, scalar)
            ),
            _ => format!("    resource.add({}, {});\n", predicate, value_ref(field, &accessor)),
        },
        Cardinality::Optional => format!(
            "    if let Some(item) = {} {{\n        resource.add({}, {});\n    }}\n",
            accessor,
            predicate,
            value_ref(field, "item")
        ),
        Cardinality::Set { .. } => format!(
            "    for item in {} {{\n        resource.add({}, item);\n    }}\n",
            accessor, predicate
        ),
        Cardinality::List { .. } => format!(
            "    resource.add_list({}, {}, |item, _dataset| item.to_term());\n",
            predicate, accessor
        ),
    }
}

// =============================================================================
// Decoding
// =============================================================================

fn decode_closure(field: &FieldRegion) -> String {
    match field.shape() {
        Some(handle) => format!(
            "|v| {}(&v.resource()?, options.nested())",
            handle.routine("from_rdf")
        ),
        None => format!("|v| v.to::<{}>()", field.item_type()),
    }
}

/// The `Values` pipeline reading one property
fn field_from_rdf(field: &FieldRegion) -> String {
    const STEP: &str = "\n            ";
    let mut chain = format!("resource{}.values({})", STEP, quoted(&field.predicate));

    if !field.language_in.is_empty() {
        chain.push_str(&format!("{}.filter_language({})", STEP, str_slice(&field.language_in)));
    }
    if !field.cardinality.is_sequence() {
        chain.push_str(&format!("{}.unique(options.unique_values)?", STEP));
    }
    if !field.allowed_values.is_empty() {
        let terms: Vec<String> = field.allowed_values.iter().map(constant_term).collect();
        chain.push_str(&format!("{}.require_in(&[{}])?", STEP, terms.join(", ")));
    }
    if let Some(value) = &field.required_value {
        chain.push_str(&format!("{}.require_has_value(&{})?", STEP, constant_term(value)));
    }
    if let Some(default) = &field.default_value {
        chain.push_str(&format!("{}.default_value({})", STEP, constant_term(default)));
    }

    let closure = decode_closure(field);
    let terminal = match field.cardinality {
        Cardinality::Required => format!(".required({})?", closure),
        Cardinality::Optional => format!(".optional({})?", closure),
        Cardinality::Set { allow_empty } => format!(".set({}, {})?", allow_empty, closure),
        Cardinality::List { allow_empty } => format!(".list({}, {})?", allow_empty, closure),
    };
    chain.push_str(STEP);
    chain.push_str(&terminal);

    match field.cardinality {
        Cardinality::Required if field.boxed => format!("Box::new({})", chain),
        Cardinality::Optional if field.boxed => format!("{}{}.map(Box::new)", chain, STEP),
        _ => chain,
    }
}

// =============================================================================
// Objects
// =============================================================================

pub fn emit_object(region: &ObjectRegion) -> String {
    let mut output = String::new();
    emit_properties_to_rdf(&mut output, region);
    emit_properties_from_rdf(&mut output, region);
    if !region.is_abstract {
        emit_top_level(&mut output, region);
    }
    output
}

fn emit_properties_to_rdf(output: &mut String, region: &ObjectRegion) {
    output.push_str(&format!(
        "pub fn {}_properties_to_rdf<V: {} + ?Sized>(value: &V, resource: &mut MutableResource<'_>, ignore_rdf_type: bool) {{\n",
        region.names.prefix, region.names.fields_trait
    ));
    for parent in &region.parents {
        output.push_str(&format!("    {}(value, resource, true);\n", parent.properties_routine("to_rdf")));
    }
    if !region.rdf_type_assertions.is_empty() {
        output.push_str("    if !ignore_rdf_type {\n");
        for rdf_type in &region.rdf_type_assertions {
            output.push_str(&format!("        resource.add_rdf_type({});\n", quoted(rdf_type)));
        }
        output.push_str("    }\n");
    }
    for field in region.own_fields() {
        output.push_str(&field_to_rdf(field));
    }
    output.push_str("}\n\n");
}

fn emit_properties_from_rdf(output: &mut String, region: &ObjectRegion) {
    output.push_str(&format!(
        "pub fn {}_properties_from_rdf(resource: &Resource<'_>, options: FromRdfOptions) -> Result<{}, DecodeError> {{\n",
        region.names.prefix, region.names.properties
    ));
    if let Some(rdf_type) = &region.rdf_type_validation {
        output.push_str("    if !options.ignore_rdf_type {\n");
        output.push_str(&format!("        resource.require_rdf_type({})?;\n", quoted(rdf_type)));
        output.push_str("    }\n");
    }
    for (index, parent) in region.parents.iter().enumerate() {
        output.push_str(&format!(
            "    let parent{} = {}(resource, options.delegated())?;\n",
            index,
            parent.properties_routine("from_rdf")
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
                output.push_str(&format!("        {}: {},\n", field.field, field_from_rdf(field)));
            }
        }
    }
    output.push_str("    })\n");
    output.push_str("}\n\n");
}

fn emit_top_level(output: &mut String, region: &ObjectRegion) {
    let routine = Routine::new(region.style, &region.names);
    let indent = routine.indent();
    let prefix = &region.names.prefix;

    routine.begin(output);

    routine.doc(output, "Write this value's statements; returns its identifier");
    routine.open(
        output,
        "to_rdf",
        &format!("{}, dataset: &mut Dataset, options: &ToRdfOptions", routine.subject()),
        "Identifier",
    );
    output.push_str(&format!(
        "{}let identifier = Identifier::from({}.identifier().clone());\n",
        indent,
        routine.receiver()
    ));
    output.push_str(&format!(
        "{}let mut resource = MutableResource::new(dataset, identifier.clone(), options.graph.clone());\n",
        indent
    ));
    output.push_str(&format!(
        "{}{}_properties_to_rdf({}, &mut resource, options.ignore_rdf_type);\n",
        indent,
        prefix,
        routine.receiver()
    ));
    output.push_str(&format!("{}identifier\n", indent));
    routine.close(output);
    output.push('\n');

    routine.open(
        output,
        "from_rdf",
        "resource: &Resource<'_>, options: FromRdfOptions",
        &routine.result("DecodeError"),
    );
    output.push_str(&format!(
        "{}let identifier = resource.identifier_as::<{}>()?;\n",
        indent, region.identifier_type
    ));
    if !region.identifier.allowed.is_empty() {
        output.push_str(&format!(
            "{}resource.require_identifier_in({})?;\n",
            indent,
            str_slice(&region.identifier.allowed)
        ));
    }
    output.push_str(&format!(
        "{}let properties = {}_properties_from_rdf(resource, options)?;\n",
        indent, prefix
    ));
    let identifier = if region.identifier.strategy == IdentityStrategy::ExplicitOnly {
        "identifier"
    } else {
        "Some(identifier)"
    };
    output.push_str(&format!(
        "{}Ok({}::from_properties({}, properties))\n",
        indent,
        routine.own(),
        identifier
    ));
    routine.close(output);
    routine.end(output);
}

// =============================================================================
// Unions
// =============================================================================

pub fn emit_union(region: &UnionRegion) -> String {
    let mut output = String::new();
    let routine = Routine::new(region.style, &region.names);
    let indent = routine.indent();
    let rust_name = &region.names.rust_name;

    routine.begin(&mut output);

    routine.open(
        &mut output,
        "to_rdf",
        &format!("{}, dataset: &mut Dataset, options: &ToRdfOptions", routine.subject()),
        "Identifier",
    );
    output.push_str(&format!("{}match {} {{\n", indent, routine.receiver()));
    for member in &region.members {
        output.push_str(&format!(
            "{}    {}::{}(member) => {}(member, dataset, options),\n",
            indent,
            rust_name,
            member.handle.rust_name(),
            member.handle.routine("to_rdf")
        ));
    }
    output.push_str(&format!("{}}}\n", indent));
    routine.close(&mut output);
    output.push('\n');

    routine.doc(&mut output, "Decode the first member, in declaration order, that accepts the resource");
    routine.open(
        &mut output,
        "from_rdf",
        "resource: &Resource<'_>, options: FromRdfOptions",
        &routine.result("DecodeError"),
    );
    for member in &region.members {
        output.push_str(&format!(
            "{}if let Ok(member) = {}(resource, options.discriminating()) {{\n",
            indent,
            member.handle.routine("from_rdf")
        ));
        output.push_str(&format!(
            "{}    return Ok({}::{}(member));\n",
            indent,
            rust_name,
            member.handle.rust_name()
        ));
        output.push_str(&format!("{}}}\n", indent));
    }
    output.push_str(&format!("{}Err(DecodeError::UnionExhausted {{\n", indent));
    output.push_str(&format!("{}    subject: resource.identifier().clone(),\n", indent));
    output.push_str(&format!("{}    union: {}.to_string(),\n", indent, quoted(&region.shape)));
    output.push_str(&format!("{}}})\n", indent));
    routine.close(&mut output);
    routine.end(&mut output);
    output
}
