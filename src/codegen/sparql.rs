//! Query Template Emitter
//!
//! Emits, per type, the CONSTRUCT template and WHERE patterns that fetch
//! exactly the statements the graph decoder reads:
//! - single required values are unconditional; optional values, sets and
//!   defaulted values sit in OPTIONAL groups
//! - lists use the fixed list skeleton, so any length matches
//! - nested objects splice their own fragment under `options.nested(..)`,
//!   except across recursive edges
//!
//! Unions concatenate member templates and match one member per UNION branch.

use super::types::{constant_term, quoted};
use super::{FieldRegion, ObjectRegion, Routine, ShapeHandle, UnionRegion};
use crate::model::Cardinality;

const TRIPLES: &str = "sparql_construct_template_triples";
const PATTERNS: &str = "sparql_where_patterns";

/// The nested fragment, if this field splices one
fn spliced(field: &FieldRegion) -> Option<&ShapeHandle> {
    field.shape().filter(|_| !field.recursive)
}

fn value_triple(field: &FieldRegion) -> String {
    format!(
        "sparql::Triple::new(options.subject.clone(), {}, options.variable({}))",
        quoted(&field.predicate),
        quoted(&field.field)
    )
}

fn type_triple(rdf_type: &str) -> String {
    format!(
        "sparql::Triple::new(options.subject.clone(), rdf::TYPE, sparql::SparqlTerm::NamedNode(NamedNode::new({})))",
        quoted(rdf_type)
    )
}

fn is_conditional(field: &FieldRegion) -> bool {
    match field.cardinality {
        Cardinality::Required => field.default_value.is_some(),
        Cardinality::Optional | Cardinality::Set { .. } => true,
        Cardinality::List { .. } => false,
    }
}

/// FILTER patterns over the field's variable
fn filters(field: &FieldRegion) -> Vec<String> {
    let mut filters = Vec::new();
    if !field.allowed_values.is_empty() {
        let values: Vec<String> = field
            .allowed_values
            .iter()
            .map(|value| format!("sparql::SparqlTerm::from({})", constant_term(value)))
            .collect();
        filters.push(format!(
            "sparql::Pattern::Filter(sparql::Expression::In {{ variable: options.variable_name({}), values: vec![{}] }})",
            quoted(&field.field),
            values.join(", ")
        ));
    }
    if !field.language_in.is_empty() {
        let languages: Vec<String> = field
            .language_in
            .iter()
            .map(|language| format!("{}.to_string()", quoted(language)))
            .collect();
        filters.push(format!(
            "sparql::Pattern::Filter(sparql::Expression::LangIn {{ variable: options.variable_name({}), languages: vec![{}] }})",
            quoted(&field.field),
            languages.join(", ")
        ));
    }
    filters
}

// =============================================================================
// Construct Template
// =============================================================================

fn field_triples(field: &FieldRegion) -> String {
    let mut code = String::new();
    match field.cardinality {
        Cardinality::List { .. } => {
            code.push_str("    {\n");
            code.push_str(&format!(
                "        let list = sparql::ListSkeleton::new(options, {});\n",
                quoted(&field.field)
            ));
            code.push_str(&format!(
                "        triples.extend(list.construct_triples({}));\n",
                quoted(&field.predicate)
            ));
            if let Some(handle) = spliced(field) {
                for item in ["first_item_options", "tail_item_options"] {
                    code.push_str(&format!(
                        "        triples.extend({}(&list.{}()));\n",
                        handle.routine(TRIPLES),
                        item
                    ));
                }
            }
            code.push_str("    }\n");
        }
        _ => {
            code.push_str(&format!("    triples.push({});\n", value_triple(field)));
            if let Some(handle) = spliced(field) {
                code.push_str(&format!(
                    "    triples.extend({}(&options.nested({})));\n",
                    handle.routine(TRIPLES),
                    quoted(&field.field)
                ));
            }
        }
    }
    code
}

// =============================================================================
// Where Patterns
// =============================================================================

fn field_patterns(field: &FieldRegion) -> String {
    let mut code = String::new();

    if let Cardinality::List { .. } = field.cardinality {
        code.push_str("    {\n");
        code.push_str(&format!(
            "        let list = sparql::ListSkeleton::new(options, {});\n",
            quoted(&field.field)
        ));
        let (first, tail) = match spliced(field) {
            Some(handle) => (
                format!("{}(&list.first_item_options())", handle.routine(PATTERNS)),
                format!("{}(&list.tail_item_options())", handle.routine(PATTERNS)),
            ),
            None => ("Vec::new()".to_string(), "Vec::new()".to_string()),
        };
        code.push_str(&format!(
            "        patterns.push(list.where_pattern({}, {}, {}));\n",
            quoted(&field.predicate),
            first,
            tail
        ));
        code.push_str("    }\n");
    } else {
        let bgp = format!("sparql::Pattern::Bgp(vec![{}])", value_triple(field));
        let filters = filters(field);
        let nested = spliced(field).map(|handle| {
            format!(
                "{}(&options.nested({}))",
                handle.routine(PATTERNS),
                quoted(&field.field)
            )
        });

        if !is_conditional(field) {
            code.push_str(&format!("    patterns.push({});\n", bgp));
            for filter in &filters {
                code.push_str(&format!("    patterns.push({});\n", filter));
            }
            if let Some(nested) = &nested {
                code.push_str(&format!("    patterns.extend({});\n", nested));
            }
        } else if filters.is_empty() && nested.is_none() {
            code.push_str(&format!("    patterns.push(sparql::Pattern::Optional(vec![{}]));\n", bgp));
        } else {
            code.push_str("    patterns.push(sparql::Pattern::Optional({\n");
            code.push_str(&format!("        let mut group = vec![{}];\n", bgp));
            for filter in &filters {
                code.push_str(&format!("        group.push({});\n", filter));
            }
            if let Some(nested) = &nested {
                code.push_str(&format!("        group.extend({});\n", nested));
            }
            code.push_str("        group\n");
            code.push_str("    }));\n");
        }
    }

    // A pinned value must be present whatever the cardinality
    if let Some(value) = &field.required_value {
        code.push_str(&format!(
            "    patterns.push(sparql::Pattern::Bgp(vec![sparql::Triple::new(options.subject.clone(), {}, sparql::SparqlTerm::from({}))]));\n",
            quoted(&field.predicate),
            constant_term(value)
        ));
    }
    code
}

// =============================================================================
// Objects
// =============================================================================

pub fn emit_object(region: &ObjectRegion) -> String {
    let mut output = String::new();
    let prefix = &region.names.prefix;

    output.push_str(&format!(
        "pub fn {}_properties_{}(options: &SparqlOptions) -> Vec<sparql::Triple> {{\n",
        prefix, TRIPLES
    ));
    output.push_str("    let mut triples = Vec::new();\n");
    for parent in &region.parents {
        output.push_str(&format!(
            "    triples.extend({}(&options.delegated()));\n",
            parent.properties_routine(TRIPLES)
        ));
    }
    if let Some(rdf_type) = &region.rdf_type_validation {
        output.push_str("    if !options.ignore_rdf_type {\n");
        output.push_str(&format!("        triples.push({});\n", type_triple(rdf_type)));
        output.push_str("    }\n");
    }
    for field in region.own_fields() {
        output.push_str(&field_triples(field));
    }
    output.push_str("    triples\n");
    output.push_str("}\n\n");

    output.push_str(&format!(
        "pub fn {}_properties_{}(options: &SparqlOptions) -> Vec<sparql::Pattern> {{\n",
        prefix, PATTERNS
    ));
    output.push_str("    let mut patterns = Vec::new();\n");
    for parent in &region.parents {
        output.push_str(&format!(
            "    patterns.extend({}(&options.delegated()));\n",
            parent.properties_routine(PATTERNS)
        ));
    }
    if let Some(rdf_type) = &region.rdf_type_validation {
        output.push_str("    if !options.ignore_rdf_type {\n");
        output.push_str(&format!(
            "        patterns.push(sparql::Pattern::Bgp(vec![{}]));\n",
            type_triple(rdf_type)
        ));
        output.push_str("    }\n");
    }
    for field in region.own_fields() {
        output.push_str(&field_patterns(field));
    }
    output.push_str("    patterns\n");
    output.push_str("}\n\n");

    if region.is_abstract {
        return output;
    }

    let routine = Routine::new(region.style, &region.names);
    let indent = routine.indent();
    routine.begin(&mut output);
    routine.open(&mut output, TRIPLES, "options: &SparqlOptions", "Vec<sparql::Triple>");
    output.push_str(&format!("{}{}_properties_{}(options)\n", indent, prefix, TRIPLES));
    routine.close(&mut output);
    output.push('\n');
    routine.open(&mut output, PATTERNS, "options: &SparqlOptions", "Vec<sparql::Pattern>");
    output.push_str(&format!("{}{}_properties_{}(options)\n", indent, prefix, PATTERNS));
    routine.close(&mut output);
    output.push('\n');
    emit_construct_query(&mut output, &routine);
    routine.end(&mut output);
    output
}

fn emit_construct_query(output: &mut String, routine: &Routine<'_>) {
    routine.open(output, "sparql_construct_query", "options: &SparqlOptions", "String");
    output.push_str(&format!(
        "{}sparql::construct_query(&{}(options), &{}(options))\n",
        routine.indent(),
        routine.call(TRIPLES),
        routine.call(PATTERNS)
    ));
    routine.close(output);
}

// =============================================================================
// Unions
// =============================================================================

pub fn emit_union(region: &UnionRegion) -> String {
    let mut output = String::new();
    let routine = Routine::new(region.style, &region.names);
    let indent = routine.indent();

    routine.begin(&mut output);

    routine.open(&mut output, TRIPLES, "options: &SparqlOptions", "Vec<sparql::Triple>");
    output.push_str(&format!("{}let mut triples = Vec::new();\n", indent));
    for member in &region.members {
        output.push_str(&format!(
            "{}triples.extend({}(&options.member({})));\n",
            indent,
            member.handle.routine(TRIPLES),
            quoted(member.handle.rust_name())
        ));
    }
    output.push_str(&format!("{}triples\n", indent));
    routine.close(&mut output);
    output.push('\n');

    routine.open(&mut output, PATTERNS, "options: &SparqlOptions", "Vec<sparql::Pattern>");
    output.push_str(&format!("{}vec![sparql::Pattern::Union(vec![\n", indent));
    for member in &region.members {
        output.push_str(&format!(
            "{}    {}(&options.member({})),\n",
            indent,
            member.handle.routine(PATTERNS),
            quoted(member.handle.rust_name())
        ));
    }
    output.push_str(&format!("{}])]\n", indent));
    routine.close(&mut output);
    output.push('\n');

    emit_construct_query(&mut output, &routine);
    routine.end(&mut output);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::tests::{object_region, union_region};

    const SHAPES: &str = r#"{"shapes": [
        {"name": "Thing", "abstract": true, "properties": [
            {"name": "label", "path": "urn:label", "type": "literal", "maxCount": 1, "languageIn": ["en"]}
        ]},
        {"name": "Order", "parents": ["Thing"], "rdfType": "urn:Order", "properties": [
            {"name": "number", "path": "urn:number", "type": "integer", "minCount": 1, "maxCount": 1},
            {"name": "state", "path": "urn:state", "type": "iri", "minCount": 1, "maxCount": 1, "in": ["urn:open", "urn:closed"]},
            {"name": "lines", "path": "urn:lines", "shape": "Line", "list": true},
            {"name": "customer", "path": "urn:customer", "shape": "Customer", "minCount": 1, "maxCount": 1},
            {"name": "previous", "path": "urn:previous", "shape": "Order", "maxCount": 1},
            {"name": "channel", "path": "urn:channel", "type": "string", "hasValue": "web"}
        ]},
        {"name": "Line", "style": "record", "properties": [
            {"name": "sku", "path": "urn:sku", "type": "string", "minCount": 1, "maxCount": 1}
        ]},
        {"name": "Customer"},
        {"kind": "union", "name": "Record", "members": ["Order", "Customer"]}
    ]}"#;

    #[test]
    fn test_construct_template() {
        let code = emit_object(&object_region(SHAPES, "Order"));
        assert!(code.contains("    triples.extend(thing_properties_sparql_construct_template_triples(&options.delegated()));\n"));
        assert!(code.contains("        triples.push(sparql::Triple::new(options.subject.clone(), rdf::TYPE, sparql::SparqlTerm::NamedNode(NamedNode::new(\"urn:Order\"))));\n"));
        assert!(code.contains("        let list = sparql::ListSkeleton::new(options, \"lines\");\n        triples.extend(list.construct_triples(\"urn:lines\"));\n        triples.extend(line_sparql_construct_template_triples(&list.first_item_options()));\n"));
        assert!(code.contains("    triples.push(sparql::Triple::new(options.subject.clone(), \"urn:customer\", options.variable(\"customer\")));\n    triples.extend(Customer::sparql_construct_template_triples(&options.nested(\"customer\")));\n"));
        assert!(!code.contains("Order::sparql_construct_template_triples(&options.nested"));
    }

    #[test]
    fn test_where_patterns() {
        let code = emit_object(&object_region(SHAPES, "Order"));
        assert!(code.contains("    patterns.push(sparql::Pattern::Bgp(vec![sparql::Triple::new(options.subject.clone(), \"urn:number\", options.variable(\"number\"))]));\n"));
        assert!(code.contains("    patterns.push(sparql::Pattern::Filter(sparql::Expression::In { variable: options.variable_name(\"state\"), values: vec![sparql::SparqlTerm::from(NamedNode::new(\"urn:open\").to_term()), sparql::SparqlTerm::from(NamedNode::new(\"urn:closed\").to_term())] }));\n"));
        assert!(code.contains("        patterns.push(list.where_pattern(\"urn:lines\", line_sparql_where_patterns(&list.first_item_options()), line_sparql_where_patterns(&list.tail_item_options())));\n"));
        assert!(code.contains("    patterns.extend(Customer::sparql_where_patterns(&options.nested(\"customer\")));\n"));
        assert!(code.contains("    patterns.push(sparql::Pattern::Optional(vec![sparql::Pattern::Bgp(vec![sparql::Triple::new(options.subject.clone(), \"urn:previous\", options.variable(\"previous\"))])]));\n"));
        assert!(code.contains("    patterns.push(sparql::Pattern::Bgp(vec![sparql::Triple::new(options.subject.clone(), \"urn:channel\", sparql::SparqlTerm::from(\"web\".to_term()))]));\n"));
    }

    #[test]
    fn test_optional_group_with_filter() {
        let code = emit_object(&object_region(SHAPES, "Thing"));
        assert!(code.contains("    patterns.push(sparql::Pattern::Optional({\n        let mut group = vec![sparql::Pattern::Bgp(vec![sparql::Triple::new(options.subject.clone(), \"urn:label\", options.variable(\"label\"))])];\n        group.push(sparql::Pattern::Filter(sparql::Expression::LangIn { variable: options.variable_name(\"label\"), languages: vec![\"en\".to_string()] }));\n        group\n    }));\n"));
        assert!(!code.contains("impl Thing"));
    }

    #[test]
    fn test_top_level() {
        let code = emit_object(&object_region(SHAPES, "Order"));
        assert!(code.contains("impl Order {\n    pub fn sparql_construct_template_triples(options: &SparqlOptions) -> Vec<sparql::Triple> {\n        order_properties_sparql_construct_template_triples(options)\n    }\n"));
        assert!(code.contains("    pub fn sparql_construct_query(options: &SparqlOptions) -> String {\n        sparql::construct_query(&Self::sparql_construct_template_triples(options), &Self::sparql_where_patterns(options))\n    }\n"));

        let code = emit_object(&object_region(SHAPES, "Line"));
        assert!(code.contains("pub fn line_sparql_construct_query(options: &SparqlOptions) -> String {\n    sparql::construct_query(&line_sparql_construct_template_triples(options), &line_sparql_where_patterns(options))\n}\n"));
    }

    #[test]
    fn test_union() {
        let code = emit_union(&union_region(SHAPES, "Record"));
        assert!(code.contains("        triples.extend(Order::sparql_construct_template_triples(&options.member(\"Order\")));\n"));
        assert!(code.contains("        vec![sparql::Pattern::Union(vec![\n            Order::sparql_where_patterns(&options.member(\"Order\")),\n            Customer::sparql_where_patterns(&options.member(\"Customer\")),\n        ])]\n"));
    }
}
