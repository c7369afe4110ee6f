//! Model Builder
//!
//! Converts shape descriptors into a [`TypeModel`] and runs the resolvers
//! in order. A type with a model error stays in the model, is marked failed
//! and takes every type that depends on it down with it. Unrelated types
//! keep compiling.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use super::analysis::{propagate_features, RecursionAnalysis};
use super::identifier::resolve_identifier;
use super::inheritance::{assign_descendant_values, check_object, check_parents, check_union, descendants, RESERVED_PROPERTY_NAMES};
use super::{
    Cardinality, Constant, DiagnosticCode, Diagnostics, DiscriminatorProperty, IdentifierSpec, ModelError,
    ObjectType, Property, ScalarType, ShapeType, TypeModel, UnionType, ValueShape, ValueType,
};
use crate::config::GeneratorConfig;
use crate::descriptor::{PropertyDescriptor, ShapeDescriptor, ShapeKind};

/// Everything code generation needs from the model phase
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub model: TypeModel,
    pub diagnostics: Diagnostics,
    pub recursion: RecursionAnalysis,
}

impl BuildOutput {
    /// True when no type failed
    pub fn is_clean(&self) -> bool {
        self.model.failed().is_empty()
    }
}

type DescriptorIndex<'a> = HashMap<&'a str, &'a ShapeDescriptor>;

// =============================================================================
// Build
// =============================================================================

/// Build and resolve the model for one set of shapes
pub fn build_model(shapes: &[ShapeDescriptor], config: &GeneratorConfig) -> BuildOutput {
    let mut model = TypeModel::new();
    let mut diagnostics = Diagnostics::new();

    let mut index: DescriptorIndex = HashMap::new();
    for descriptor in shapes {
        index.entry(descriptor.name.as_str()).or_insert(descriptor);
    }

    for descriptor in shapes {
        if model.contains(&descriptor.name) {
            let error = ModelError::DuplicateTypeName {
                type_name: descriptor.name.clone(),
            };
            fail(&mut model, &mut diagnostics, [error]);
            continue;
        }
        let (shape, errors) = convert_shape(descriptor, &index, config);
        model.insert(shape);
        fail(&mut model, &mut diagnostics, errors);
    }

    let parent_errors = check_parents(&model);
    fail(&mut model, &mut diagnostics, parent_errors);
    propagate_failures(&mut model, &mut diagnostics);

    let object_errors: Vec<ModelError> = model
        .objects()
        .filter(|object| !model.is_failed(&object.name))
        .filter_map(|object| check_object(&model, object).err())
        .collect();
    fail(&mut model, &mut diagnostics, object_errors);
    propagate_failures(&mut model, &mut diagnostics);

    assign_descendant_values(&mut model);

    let unions: Vec<String> = model
        .unions()
        .filter(|union| !model.is_failed(&union.name))
        .map(|union| union.name.clone())
        .collect();
    let mut union_errors = Vec::new();
    for union in unions {
        if let Err(error) = check_union(&model, &union, &mut diagnostics) {
            union_errors.push(error);
        }
    }
    fail(&mut model, &mut diagnostics, union_errors);

    for object in model.objects() {
        if object.is_abstract && !model.is_failed(&object.name) && descendants(&model, &object.name).is_empty() {
            diagnostics.report(
                object.name.as_str(),
                DiagnosticCode::AbstractLeaf,
                "abstract shape has no concrete descendant; only its traits and property routines are generated",
            );
        }
    }
    propagate_failures(&mut model, &mut diagnostics);

    propagate_features(&mut model, &mut diagnostics);

    let recursion = RecursionAnalysis::compute(&model);
    for group in &recursion.groups {
        for member in &group.members {
            diagnostics.report(
                member.as_str(),
                DiagnosticCode::RecursiveReference,
                format!("recursive through {}", group.members.join(", ")),
            );
        }
    }

    info!(
        types = model.len(),
        failed = model.failed().len(),
        recursive_groups = recursion.groups.len(),
        errors = diagnostics.error_count(),
        warnings = diagnostics.warning_count(),
        "built shape model"
    );

    BuildOutput {
        model,
        diagnostics,
        recursion,
    }
}

pub(crate) fn fail(model: &mut TypeModel, diagnostics: &mut Diagnostics, errors: impl IntoIterator<Item = ModelError>) {
    for error in errors {
        debug!(type_name = error.type_name(), %error, "type failed");
        diagnostics.model_error(&error);
        model.mark_failed(error.type_name());
    }
}

/// Fail every type that depends on a failed type, until nothing changes
pub(crate) fn propagate_failures(model: &mut TypeModel, diagnostics: &mut Diagnostics) {
    loop {
        let errors: Vec<ModelError> = model
            .iter()
            .filter(|shape| !model.is_failed(shape.name()))
            .filter_map(|shape| {
                shape
                    .dependencies()
                    .into_iter()
                    .find(|dep| model.is_failed(dep))
                    .map(|dep| ModelError::DependencyFailed {
                        type_name: shape.name().to_string(),
                        dependency: dep.to_string(),
                    })
            })
            .collect();
        if errors.is_empty() {
            break;
        }
        fail(model, diagnostics, errors);
    }
}

// =============================================================================
// Shapes
// =============================================================================

fn convert_shape(
    descriptor: &ShapeDescriptor,
    index: &DescriptorIndex,
    config: &GeneratorConfig,
) -> (ShapeType, Vec<ModelError>) {
    let features = descriptor.features.clone().unwrap_or_else(|| config.features.clone());
    let style = descriptor.style.unwrap_or(config.declaration_style);
    let discriminator_name = descriptor
        .discriminator
        .as_ref()
        .and_then(|d| d.property.clone())
        .unwrap_or_else(|| config.discriminator_property.clone());

    match descriptor.kind {
        ShapeKind::Value => (
            ShapeType::Value(ValueShape {
                name: descriptor.name.clone(),
                scalar: descriptor.datatype.unwrap_or(ScalarType::String),
            }),
            Vec::new(),
        ),
        ShapeKind::Union => (
            ShapeType::Union(UnionType {
                name: descriptor.name.clone(),
                comment: descriptor.comment.clone(),
                members: descriptor.members.clone(),
                style,
                discriminator_property: discriminator_name,
                features,
            }),
            Vec::new(),
        ),
        ShapeKind::Object => {
            let mut errors = Vec::new();

            let mut properties = Vec::new();
            for property in &descriptor.properties {
                match convert_property(&descriptor.name, property, index) {
                    Ok(property) => properties.push(property),
                    Err(error) => errors.push(error),
                }
            }

            let mut own_values = match descriptor.discriminator.as_ref().and_then(|d| d.values.clone()) {
                Some(values) => values,
                None if descriptor.is_abstract => Vec::new(),
                None => vec![descriptor.name.clone()],
            };
            let mut seen = std::collections::HashSet::new();
            own_values.retain(|value| seen.insert(value.clone()));

            let identifier = resolve_identifier(&descriptor.name, &descriptor.identifier, config).unwrap_or_else(|error| {
                errors.push(error);
                IdentifierSpec::default()
            });

            let rdf_type_assertions = match &descriptor.to_rdf_types {
                Some(types) => types.clone(),
                None => descriptor.rdf_type.iter().cloned().collect(),
            };
            let rdf_type_validation = if descriptor.validate_rdf_type {
                descriptor.from_rdf_type.clone().or_else(|| descriptor.rdf_type.clone())
            } else {
                None
            };

            let object = ObjectType {
                name: descriptor.name.clone(),
                comment: descriptor.comment.clone(),
                properties,
                parents: descriptor.parents.clone(),
                is_abstract: descriptor.is_abstract,
                style,
                discriminator: DiscriminatorProperty {
                    name: discriminator_name,
                    own_values,
                    descendant_values: Vec::new(),
                },
                identifier,
                rdf_type_assertions,
                rdf_type_validation,
                features,
            };
            (ShapeType::Object(object), errors)
        }
    }
}

// =============================================================================
// Properties
// =============================================================================

fn convert_property(owner: &str, descriptor: &PropertyDescriptor, index: &DescriptorIndex) -> Result<Property, ModelError> {
    let invalid = |reason: String| ModelError::InvalidConstant {
        type_name: owner.to_string(),
        property: descriptor.name.clone(),
        reason,
    };

    if RESERVED_PROPERTY_NAMES.contains(&descriptor.name.as_str()) {
        return Err(ModelError::ReservedPropertyName {
            type_name: owner.to_string(),
            property: descriptor.name.clone(),
        });
    }
    if !is_property_name(&descriptor.name) {
        return Err(invalid("property names start with a letter and use letters, digits, '_' or '-'".to_string()));
    }

    let value_type = match (descriptor.datatype, &descriptor.shape) {
        (Some(scalar), _) => ValueType::Scalar(scalar),
        (None, Some(target)) => match index.get(target.as_str()) {
            None => {
                return Err(ModelError::UnresolvedReference {
                    type_name: owner.to_string(),
                    reference: target.clone(),
                })
            }
            Some(shape) if shape.kind == ShapeKind::Value => {
                ValueType::Scalar(shape.datatype.unwrap_or(ScalarType::String))
            }
            Some(shape) if shape.kind == ShapeKind::Object && shape.is_abstract => {
                return Err(ModelError::AbstractPropertyValue {
                    type_name: owner.to_string(),
                    property: descriptor.name.clone(),
                    target: target.clone(),
                })
            }
            Some(_) => ValueType::Shape(target.clone()),
        },
        (None, None) => return Err(invalid("property has neither a type nor a shape".to_string())),
    };

    let min = descriptor.min_count.unwrap_or(0);
    if let Some(max) = descriptor.max_count {
        if min > max {
            return Err(ModelError::InvalidCardinality {
                type_name: owner.to_string(),
                property: descriptor.name.clone(),
                min,
                max,
            });
        }
    }

    let cardinality = if descriptor.list {
        Cardinality::List { allow_empty: min == 0 }
    } else if descriptor.max_count == Some(1) {
        if min >= 1 || descriptor.default_value.is_some() {
            Cardinality::Required
        } else {
            Cardinality::Optional
        }
    } else {
        Cardinality::Set { allow_empty: min == 0 }
    };

    if descriptor.default_value.is_some() && cardinality != Cardinality::Required {
        return Err(ModelError::DefaultOnNonRequired {
            type_name: owner.to_string(),
            property: descriptor.name.clone(),
        });
    }

    let scalar = match &value_type {
        ValueType::Scalar(scalar) => Some(*scalar),
        ValueType::Shape(_) => None,
    };
    let convert = |value: &Value| match scalar {
        Some(scalar) => constant(value, scalar).map_err(&invalid),
        None => Err(invalid("constants need a scalar value type".to_string())),
    };

    let default_value = descriptor.default_value.as_ref().map(convert).transpose()?;
    let allowed_values = descriptor.allowed.iter().map(convert).collect::<Result<Vec<_>, _>>()?;
    let required_value = descriptor.has_value.as_ref().map(convert).transpose()?;

    let mut language_in = Vec::new();
    if !descriptor.language_in.is_empty() {
        if !scalar.map(|s| s.accepts_language()).unwrap_or(false) {
            return Err(invalid("languageIn needs a literal or term value type".to_string()));
        }
        for tag in &descriptor.language_in {
            if !is_language_tag(tag) {
                return Err(invalid(format!("'{}' is not a language tag", tag)));
            }
            language_in.push(tag.to_lowercase());
        }
    }

    Ok(Property {
        name: descriptor.name.clone(),
        owner: owner.to_string(),
        predicate: descriptor.path.clone(),
        cardinality,
        value_type,
        mutable: descriptor.mutable,
        visibility: descriptor.visibility,
        default_value,
        language_in,
        allowed_values,
        required_value,
        comment: descriptor.comment.clone(),
    })
}

/// Convert a descriptor constant for a scalar value type
fn constant(value: &Value, scalar: ScalarType) -> Result<Constant, String> {
    let iri = |value: &Value| -> Option<String> {
        value
            .as_object()
            .and_then(|object| object.get("@id"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    match (scalar, value) {
        (ScalarType::String | ScalarType::Literal | ScalarType::Term, Value::String(s)) => {
            Ok(Constant::String(s.clone()))
        }
        (ScalarType::NamedNode | ScalarType::Identifier, Value::String(s)) => Ok(Constant::Iri(s.clone())),
        (ScalarType::NamedNode | ScalarType::Identifier | ScalarType::Term, Value::Object(_)) => {
            iri(value).map(Constant::Iri).ok_or_else(|| "IRI constants are {\"@id\": ...}".to_string())
        }
        (ScalarType::Boolean, Value::Bool(b)) => Ok(Constant::Boolean(*b)),
        (ScalarType::Integer, Value::Number(n)) => n
            .as_i64()
            .map(Constant::Integer)
            .ok_or_else(|| format!("{} is not an integer", n)),
        (ScalarType::Double, Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .map(Constant::Double)
            .ok_or_else(|| format!("{} is not a finite double", n)),
        (ScalarType::Date, Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Constant::Date)
            .map_err(|e| format!("'{}' is not a date: {}", s, e)),
        (ScalarType::DateTime, Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Constant::DateTime(dt.with_timezone(&Utc)))
            .map_err(|e| format!("'{}' is not an RFC 3339 timestamp: {}", s, e)),
        (scalar, value) => Err(format!("{} is not a valid {:?} constant", value, scalar)),
    }
}

// =============================================================================
// Name Checks
// =============================================================================

static LANGUAGE_TAG: OnceLock<Option<Regex>> = OnceLock::new();
static PROPERTY_NAME: OnceLock<Option<Regex>> = OnceLock::new();

fn matches(cell: &'static OnceLock<Option<Regex>>, pattern: &str, text: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .map(|regex| regex.is_match(text))
        .unwrap_or(false)
}

fn is_language_tag(tag: &str) -> bool {
    matches(&LANGUAGE_TAG, r"^[A-Za-z]{1,8}(-[A-Za-z0-9]{1,8})*$", tag)
}

fn is_property_name(name: &str) -> bool {
    matches(&PROPERTY_NAME, r"^[A-Za-z][A-Za-z0-9_\-]*$", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::parse_str;
    use crate::model::Severity;

    fn build(json: &str) -> BuildOutput {
        let set = parse_str(json).unwrap();
        build_model(&set.shapes, &GeneratorConfig::default())
    }

    #[test]
    fn test_cardinality_mapping() {
        let output = build(
            r#"{"name": "Person", "properties": [
                {"name": "name", "path": "urn:name", "type": "string", "minCount": 1, "maxCount": 1},
                {"name": "nickname", "path": "urn:nick", "type": "string", "maxCount": 1},
                {"name": "active", "path": "urn:active", "type": "boolean", "maxCount": 1, "defaultValue": true},
                {"name": "emails", "path": "urn:email", "type": "string"},
                {"name": "steps", "path": "urn:step", "type": "string", "list": true, "minCount": 1}
            ]}"#,
        );
        assert!(output.is_clean(), "{}", output.diagnostics);
        let person = output.model.object("Person").unwrap();
        let cardinalities: Vec<Cardinality> = person.properties.iter().map(|p| p.cardinality).collect();
        assert_eq!(
            cardinalities,
            vec![
                Cardinality::Required,
                Cardinality::Optional,
                Cardinality::Required,
                Cardinality::Set { allow_empty: true },
                Cardinality::List { allow_empty: false },
            ]
        );
        assert_eq!(person.properties[2].default_value, Some(Constant::Boolean(true)));
        assert_eq!(person.discriminator.own_values, vec!["Person"]);
    }

    #[test]
    fn test_default_on_set_rejected() {
        let output = build(
            r#"{"name": "Thing", "properties": [
                {"name": "tags", "path": "urn:tag", "type": "string", "defaultValue": "x"}
            ]}"#,
        );
        assert!(output.model.is_failed("Thing"));
        assert!(output
            .diagnostics
            .errors()
            .any(|d| d.code == DiagnosticCode::DefaultOnNonRequired));
    }

    #[test]
    fn test_constants_and_languages() {
        let output = build(
            r#"{"name": "Event", "properties": [
                {"name": "day", "path": "urn:day", "type": "date", "maxCount": 1, "defaultValue": "2024-02-29"},
                {"name": "label", "path": "urn:label", "type": "literal", "maxCount": 1, "languageIn": ["EN", "de-AT"]},
                {"name": "kind", "path": "urn:kind", "type": "iri", "maxCount": 1, "in": ["urn:a", {"@id": "urn:b"}]}
            ]}"#,
        );
        assert!(output.is_clean(), "{}", output.diagnostics);
        let event = output.model.object("Event").unwrap();
        assert_eq!(
            event.properties[0].default_value,
            Some(Constant::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
        );
        assert_eq!(event.properties[1].language_in, vec!["en", "de-at"]);
        assert_eq!(
            event.properties[2].allowed_values,
            vec![Constant::Iri("urn:a".to_string()), Constant::Iri("urn:b".to_string())]
        );
    }

    #[test]
    fn test_language_filter_on_plain_string_rejected() {
        let output = build(
            r#"{"name": "Event", "properties": [
                {"name": "label", "path": "urn:label", "type": "string", "maxCount": 1, "languageIn": ["en"]}
            ]}"#,
        );
        assert!(output.model.is_failed("Event"));
        assert!(output
            .diagnostics
            .for_type("Event")
            .any(|d| d.code == DiagnosticCode::InvalidConstraint && d.message.contains("languageIn")));
    }

    #[test]
    fn test_bad_constant() {
        let output = build(
            r#"{"name": "Event", "properties": [
                {"name": "day", "path": "urn:day", "type": "date", "maxCount": 1, "defaultValue": "yesterday"}
            ]}"#,
        );
        assert!(output.diagnostics.errors().any(|d| d.code == DiagnosticCode::InvalidConstraint));
    }

    #[test]
    fn test_value_shape_reference_resolves_to_scalar() {
        let output = build(
            r#"{"shapes": [
                {"name": "Email", "kind": "value", "datatype": "string"},
                {"name": "Contact", "properties": [{"name": "email", "path": "urn:email", "shape": "Email", "maxCount": 1}]}
            ]}"#,
        );
        let contact = output.model.object("Contact").unwrap();
        assert_eq!(contact.properties[0].value_type, ValueType::Scalar(ScalarType::String));
    }

    #[test]
    fn test_failure_propagates_to_dependents_only() {
        let output = build(
            r#"{"shapes": [
                {"name": "Broken", "properties": [{"name": "x", "path": "urn:x", "shape": "Missing", "maxCount": 1}]},
                {"name": "User", "properties": [{"name": "b", "path": "urn:b", "shape": "Broken", "maxCount": 1}]},
                {"name": "Unrelated"}
            ]}"#,
        );
        assert!(output.model.is_failed("Broken"));
        assert!(output.model.is_failed("User"));
        assert!(!output.model.is_failed("Unrelated"));
        assert!(output
            .diagnostics
            .for_type("User")
            .any(|d| d.code == DiagnosticCode::DependencyFailed));
    }

    #[test]
    fn test_duplicate_shape_name() {
        let output = build(r#"{"shapes": [{"name": "Twice"}, {"name": "Twice"}]}"#);
        assert!(output.model.is_failed("Twice"));
        assert_eq!(output.model.len(), 1);
    }

    #[test]
    fn test_abstract_leaf_warning() {
        let output = build(r#"{"name": "Lonely", "abstract": true}"#);
        assert!(output.is_clean());
        let warning = output.diagnostics.warnings().next().unwrap();
        assert_eq!(warning.code, DiagnosticCode::AbstractLeaf);
        assert_eq!(warning.severity(), Severity::Warning);
    }

    #[test]
    fn test_rdf_type_overrides() {
        let output = build(
            r#"{"shapes": [
                {"name": "A", "rdfType": "urn:A"},
                {"name": "B", "rdfType": "urn:B", "toRdfTypes": ["urn:B", "urn:Thing"], "validateRdfType": false}
            ]}"#,
        );
        let a = output.model.object("A").unwrap();
        assert_eq!(a.rdf_type_assertions, vec!["urn:A"]);
        assert_eq!(a.rdf_type_validation.as_deref(), Some("urn:A"));
        let b = output.model.object("B").unwrap();
        assert_eq!(b.rdf_type_assertions.len(), 2);
        assert_eq!(b.rdf_type_validation, None);
    }
}
