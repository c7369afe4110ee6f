//! Code Generation
//!
//! Generates Rust modules from the shape type model.
//!
//! Architecture:
//! - CodegenContext: immutable after build(), holds the model, analysis
//!   results and resolved names
//! - Region: pure projection of the analysis for a single type
//! - Emitters: one per routine family, each consumes Regions only
//!
//! The key constraint: emitters NEVER read the model or descriptors, only
//! Region fields. Every decision (boxing, recursion, inherited field
//! sources, dispatch values) is made before Region extraction.

pub mod declaration;
pub mod equals;
pub mod hash;
pub mod json;
pub mod names;
pub mod rdf;
pub mod sparql;
pub mod types;

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::checksum::Checksum;
use crate::config::{OutputConfig, ShapegenConfig};
use crate::error::Result;
use crate::model::build::{fail, propagate_failures};
use crate::model::inheritance::{accepted_values, ancestors, effective_properties, union_dispatch};
use crate::model::{
    BuildOutput, Cardinality, Constant, DeclarationStyle, Diagnostics, Feature, IdentifierSpec, ModelError,
    ObjectType, Property, RecursionAnalysis, ScalarType, ShapeType, TypeModel, TypeName, UnionType, ValueType,
    Visibility,
};

use names::{field_name, NameResolver, TypeNames};

// =============================================================================
// Region
// =============================================================================

/// A reference from generated code to another generated type
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeHandle {
    pub shape: TypeName,
    pub names: TypeNames,
    pub style: DeclarationStyle,
    pub is_union: bool,
}

impl ShapeHandle {
    /// Path of a type-level routine: `T::routine` for classes and unions
    /// declared as classes, `t_routine` for records
    pub fn routine(&self, routine: &str) -> String {
        match self.style {
            DeclarationStyle::Class => format!("{}::{}", self.names.rust_name, routine),
            DeclarationStyle::Record => format!("{}_{}", self.names.prefix, routine),
        }
    }

    /// Path of a property-level routine of an object type
    pub fn properties_routine(&self, routine: &str) -> String {
        format!("{}_properties_{}", self.names.prefix, routine)
    }

    pub fn rust_name(&self) -> &str {
        &self.names.rust_name
    }
}

/// What a field holds
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(ScalarType),
    Shape(ShapeHandle),
}

/// One effective property, as the emitters see it
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRegion {
    /// Property name; document key
    pub key: String,
    /// Struct field, accessor and query variable suffix
    pub field: String,
    /// Declaring type
    pub owner: TypeName,
    pub predicate: String,
    pub cardinality: Cardinality,
    pub value: FieldValue,
    /// Single-valued edge inside a recursive group; stored boxed
    pub boxed: bool,
    /// Edge inside a recursive group: open document schema, no query splice
    pub recursive: bool,
    pub mutable: bool,
    pub visibility: Visibility,
    pub default_value: Option<Constant>,
    pub language_in: Vec<String>,
    pub allowed_values: Vec<Constant>,
    pub required_value: Option<Constant>,
    pub comment: Option<String>,
}

impl FieldRegion {
    pub fn shape(&self) -> Option<&ShapeHandle> {
        match &self.value {
            FieldValue::Shape(handle) => Some(handle),
            FieldValue::Scalar(_) => None,
        }
    }

    pub fn scalar(&self) -> Option<ScalarType> {
        match &self.value {
            FieldValue::Scalar(scalar) => Some(*scalar),
            FieldValue::Shape(_) => None,
        }
    }

    /// Rust type of one value
    pub fn item_type(&self) -> &str {
        match &self.value {
            FieldValue::Scalar(scalar) => scalar.rust_type(),
            FieldValue::Shape(handle) => handle.rust_name(),
        }
    }

    pub fn has_constraints(&self) -> bool {
        !self.language_in.is_empty() || !self.allowed_values.is_empty() || self.required_value.is_some()
    }
}

/// A direct parent and the fields its property record carries
#[derive(Debug, Clone, PartialEq)]
pub struct ParentRegion {
    pub names: TypeNames,
    pub fields: Vec<String>,
}

impl ParentRegion {
    /// Property-level routines are free functions whatever the style
    pub fn properties_routine(&self, routine: &str) -> String {
        format!("{}_properties_{}", self.names.prefix, routine)
    }
}

#[derive(Debug, Clone)]
pub struct ObjectRegion {
    pub shape: TypeName,
    pub names: TypeNames,
    pub comment: Option<String>,
    pub is_abstract: bool,
    pub style: DeclarationStyle,
    pub features: BTreeSet<Feature>,
    pub parents: Vec<ParentRegion>,
    /// Every ancestor, most-base first; the struct implements their traits
    pub ancestors: Vec<ShapeHandle>,
    /// Effective fields, inherited first
    pub fields: Vec<FieldRegion>,
    pub identifier: IdentifierSpec,
    pub identifier_type: &'static str,
    pub discriminator_key: String,
    pub own_values: Vec<String>,
    /// Own then descendant values
    pub accepted_values: Vec<String>,
    pub rdf_type_assertions: Vec<String>,
    pub rdf_type_validation: Option<String>,
    pub dependencies: Vec<TypeName>,
}

impl ObjectRegion {
    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn own_fields(&self) -> impl Iterator<Item = &FieldRegion> {
        self.fields.iter().filter(move |field| field.owner == self.shape)
    }

    /// Inherited fields with the index of the first direct parent whose
    /// property record carries them
    pub fn inherited_fields(&self) -> Vec<(usize, &FieldRegion)> {
        self.fields
            .iter()
            .filter(|field| field.owner != self.shape)
            .filter_map(|field| {
                self.parents
                    .iter()
                    .position(|parent| parent.fields.contains(&field.field))
                    .map(|index| (index, field))
            })
            .collect()
    }

    /// Value written on encode
    pub fn discriminator(&self) -> Option<&str> {
        self.own_values.first().map(String::as_str)
    }

    pub fn handle(&self) -> ShapeHandle {
        ShapeHandle {
            shape: self.shape.clone(),
            names: self.names.clone(),
            style: self.style,
            is_union: false,
        }
    }
}

/// A direct union member and the values that dispatch to it
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRegion {
    pub handle: ShapeHandle,
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UnionRegion {
    pub shape: TypeName,
    pub names: TypeNames,
    pub comment: Option<String>,
    pub style: DeclarationStyle,
    pub features: BTreeSet<Feature>,
    pub discriminator_key: String,
    pub members: Vec<MemberRegion>,
    pub dependencies: Vec<TypeName>,
}

impl UnionRegion {
    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn handle(&self) -> ShapeHandle {
        ShapeHandle {
            shape: self.shape.clone(),
            names: self.names.clone(),
            style: self.style,
            is_union: true,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Region {
    Object(ObjectRegion),
    Union(UnionRegion),
}

impl Region {
    pub fn shape(&self) -> &str {
        match self {
            Self::Object(object) => &object.shape,
            Self::Union(union) => &union.shape,
        }
    }

    pub fn dependencies(&self) -> &[TypeName] {
        match self {
            Self::Object(object) => &object.dependencies,
            Self::Union(union) => &union.dependencies,
        }
    }

    pub fn features(&self) -> &BTreeSet<Feature> {
        match self {
            Self::Object(object) => &object.features,
            Self::Union(union) => &union.features,
        }
    }
}

/// Renders the top-level routines of one type: inherent methods for
/// classes, `t_`-prefixed free functions for records
pub struct Routine<'a> {
    pub class: bool,
    prefix: &'a str,
    rust_name: &'a str,
}

impl<'a> Routine<'a> {
    pub fn new(style: DeclarationStyle, names: &'a TypeNames) -> Self {
        Self {
            class: style == DeclarationStyle::Class,
            prefix: &names.prefix,
            rust_name: &names.rust_name,
        }
    }

    /// Indent of the body
    pub fn indent(&self) -> &'static str {
        if self.class {
            "        "
        } else {
            "    "
        }
    }

    pub fn open(&self, output: &mut String, name: &str, parameters: &str, returns: &str) {
        if self.class {
            output.push_str(&format!("    pub fn {}({}) -> {} {{\n", name, parameters, returns));
        } else {
            output.push_str(&format!("pub fn {}_{}({}) -> {} {{\n", self.prefix, name, parameters, returns));
        }
    }

    /// Parameter of routines taking the value
    pub fn subject(&self) -> String {
        if self.class {
            "&self".to_string()
        } else {
            format!("value: &{}", self.rust_name)
        }
    }

    /// One doc comment line above a routine
    pub fn doc(&self, output: &mut String, text: &str) {
        let indent = if self.class { "    " } else { "" };
        output.push_str(&format!("{}/// {}\n", indent, text));
    }

    /// Return type of a decoder failing with `error`
    pub fn result(&self, error: &str) -> String {
        format!("Result<{}, {}>", self.own(), error)
    }

    /// Open the inherent impl block of a class
    pub fn begin(&self, output: &mut String) {
        if self.class {
            output.push_str(&format!("impl {} {{\n", self.rust_name));
        }
    }

    pub fn end(&self, output: &mut String) {
        if self.class {
            output.push_str("}\n");
        }
        output.push('\n');
    }

    pub fn close(&self, output: &mut String) {
        if self.class {
            output.push_str("    }\n");
        } else {
            output.push_str("}\n");
        }
    }

    /// `Self` or the type name
    pub fn own(&self) -> &str {
        if self.class {
            "Self"
        } else {
            self.rust_name
        }
    }

    pub fn receiver(&self) -> &'static str {
        if self.class {
            "self"
        } else {
            "value"
        }
    }

    /// Call of a sibling top-level routine
    pub fn call(&self, name: &str) -> String {
        if self.class {
            format!("Self::{}", name)
        } else {
            format!("{}_{}", self.prefix, name)
        }
    }
}

// =============================================================================
// CodegenContext
// =============================================================================

/// Immutable codegen context, frozen after build().
///
/// Regions are projected lazily and memoized per type, so parallel
/// generation never recomputes an inheritance chain.
pub struct CodegenContext {
    model: TypeModel,
    recursion: RecursionAnalysis,
    names: NameResolver,
    diagnostics: Diagnostics,
    threads: usize,
    regions: HashMap<TypeName, OnceLock<Option<Region>>>,
}

impl CodegenContext {
    /// Resolve names, fail colliding types and their dependents, then
    /// freeze.
    #[instrument(skip_all)]
    pub fn build(output: BuildOutput, config: &ShapegenConfig) -> Self {
        let BuildOutput {
            mut model,
            mut diagnostics,
            recursion,
        } = output;

        let (names, collisions) = NameResolver::build(&model);
        fail(&mut model, &mut diagnostics, collisions);

        let field_collisions: Vec<ModelError> = model
            .objects()
            .filter(|object| !model.is_failed(&object.name))
            .filter_map(|object| check_field_names(&model, object).err())
            .collect();
        fail(&mut model, &mut diagnostics, field_collisions);
        propagate_failures(&mut model, &mut diagnostics);

        let regions = model
            .iter()
            .filter(|shape| !matches!(shape, ShapeType::Value(_)) && !model.is_failed(shape.name()))
            .map(|shape| (shape.name().to_string(), OnceLock::new()))
            .collect();

        info!(
            types = model.len(),
            generated = names.len(),
            failed = model.failed().len(),
            "codegen context ready"
        );

        Self {
            model,
            recursion,
            names,
            diagnostics,
            threads: config.parallelism.threads,
            regions,
        }
    }

    /// Region of a generated type
    pub fn region(&self, shape: &str) -> Option<&Region> {
        let cell = self.regions.get(shape)?;
        cell.get_or_init(|| self.project(shape)).as_ref()
    }

    /// Generated types in declaration order
    pub fn generated_types(&self) -> Vec<&str> {
        self.model
            .names()
            .filter(|name| self.regions.contains_key(*name))
            .collect()
    }

    pub fn model(&self) -> &TypeModel {
        &self.model
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn recursion(&self) -> &RecursionAnalysis {
        &self.recursion
    }

    pub fn names(&self) -> &NameResolver {
        &self.names
    }

    fn project(&self, shape: &str) -> Option<Region> {
        match self.model.get(shape)? {
            ShapeType::Object(object) => Some(Region::Object(self.project_object(object)?)),
            ShapeType::Union(union) => Some(Region::Union(self.project_union(union)?)),
            ShapeType::Value(_) => None,
        }
    }

    fn handle(&self, shape: &str) -> Option<ShapeHandle> {
        let target = self.model.get(shape)?;
        let style = match target {
            ShapeType::Object(object) => object.style,
            ShapeType::Union(union) => union.style,
            ShapeType::Value(_) => return None,
        };
        Some(ShapeHandle {
            shape: shape.to_string(),
            names: self.names.get(shape)?.clone(),
            style,
            is_union: matches!(target, ShapeType::Union(_)),
        })
    }

    fn project_field(&self, object: &ObjectType, property: &Property) -> Option<FieldRegion> {
        let (value, recursive) = match &property.value_type {
            ValueType::Scalar(scalar) => (FieldValue::Scalar(*scalar), false),
            ValueType::Shape(target) => (
                FieldValue::Shape(self.handle(target)?),
                self.recursion.is_recursive(&object.name, target),
            ),
        };
        Some(FieldRegion {
            key: property.name.clone(),
            field: field_name(&property.name),
            owner: property.owner.clone(),
            predicate: property.predicate.clone(),
            cardinality: property.cardinality,
            boxed: recursive && !property.cardinality.is_sequence(),
            recursive,
            value,
            mutable: property.mutable,
            visibility: property.visibility,
            default_value: property.default_value.clone(),
            language_in: property.language_in.clone(),
            allowed_values: property.allowed_values.clone(),
            required_value: property.required_value.clone(),
            comment: property.comment.clone(),
        })
    }

    fn project_object(&self, object: &ObjectType) -> Option<ObjectRegion> {
        let properties = effective_properties(&self.model, &object.name).ok()?;
        let fields = properties
            .iter()
            .map(|property| self.project_field(object, property))
            .collect::<Option<Vec<_>>>()?;

        let parents = object
            .parents
            .iter()
            .map(|parent| {
                let fields = effective_properties(&self.model, parent)
                    .ok()?
                    .iter()
                    .map(|property| field_name(&property.name))
                    .collect();
                Some(ParentRegion {
                    names: self.names.get(parent)?.clone(),
                    fields,
                })
            })
            .collect::<Option<Vec<_>>>()?;

        let ancestors = ancestors(&self.model, &object.name)
            .iter()
            .map(|ancestor| self.handle(ancestor))
            .collect::<Option<Vec<_>>>()?;

        let dependencies = self
            .model
            .get(&object.name)?
            .dependencies()
            .into_iter()
            .map(str::to_string)
            .collect();

        debug!(shape = %object.name, fields = fields.len(), "projected object region");
        Some(ObjectRegion {
            shape: object.name.clone(),
            names: self.names.get(&object.name)?.clone(),
            comment: object.comment.clone(),
            is_abstract: object.is_abstract,
            style: object.style,
            features: object.features.clone(),
            parents,
            ancestors,
            fields,
            identifier_type: object.identifier.rust_type(),
            identifier: object.identifier.clone(),
            discriminator_key: object.discriminator.name.clone(),
            own_values: object.discriminator.own_values.clone(),
            accepted_values: accepted_values(object),
            rdf_type_assertions: object.rdf_type_assertions.clone(),
            rdf_type_validation: object.rdf_type_validation.clone(),
            dependencies,
        })
    }

    fn project_union(&self, union: &UnionType) -> Option<UnionRegion> {
        let dispatch = union_dispatch(&self.model, &union.name).ok()?;
        let members = union
            .members
            .iter()
            .map(|member| {
                Some(MemberRegion {
                    handle: self.handle(member)?,
                    values: dispatch.values_of(member).to_vec(),
                })
            })
            .collect::<Option<Vec<_>>>()?;

        debug!(shape = %union.name, members = members.len(), "projected union region");
        Some(UnionRegion {
            shape: union.name.clone(),
            names: self.names.get(&union.name)?.clone(),
            comment: union.comment.clone(),
            style: union.style,
            features: union.features.clone(),
            discriminator_key: union.discriminator_property.clone(),
            members,
            dependencies: union.members.clone(),
        })
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// Generate every type, in parallel. Bundles come back in declaration
    /// order.
    #[instrument(skip(self))]
    pub fn generate(&self) -> Result<Vec<TypeBundle>> {
        let shapes = self.generated_types();
        let run = || {
            shapes
                .par_iter()
                .filter_map(|shape| self.bundle(shape))
                .collect::<Vec<_>>()
        };

        let bundles = if self.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(self.threads).build()?;
            pool.install(run)
        } else {
            run()
        };

        info!(
            bundles = bundles.len(),
            units = bundles.iter().map(|b| b.units.len()).sum::<usize>(),
            "generated types"
        );
        Ok(bundles)
    }

    /// Generate the units of one type
    pub fn bundle(&self, shape: &str) -> Option<TypeBundle> {
        let region = self.region(shape)?;
        let dependencies = region.dependencies().to_vec();

        let mut units = Vec::new();
        let mut push = |kind: UnitKind, code: String| {
            if !code.is_empty() {
                units.push(GeneratedUnit::new(shape, kind, code, dependencies.clone()));
            }
        };

        match region {
            Region::Object(object) => {
                push(UnitKind::Declaration, declaration::emit_object(object));
                for feature in &object.features {
                    let code = match feature {
                        Feature::Equals => equals::emit_object(object),
                        Feature::Hash => hash::emit_object(object),
                        Feature::Json => json::emit_object(object),
                        Feature::Rdf => rdf::emit_object(object),
                        Feature::Sparql => sparql::emit_object(object),
                    };
                    push(UnitKind::Feature(*feature), code);
                }
            }
            Region::Union(union) => {
                push(UnitKind::Declaration, declaration::emit_union(union));
                for feature in &union.features {
                    let code = match feature {
                        Feature::Equals => equals::emit_union(union),
                        Feature::Hash => hash::emit_union(union),
                        Feature::Json => json::emit_union(union),
                        Feature::Rdf => rdf::emit_union(union),
                        Feature::Sparql => sparql::emit_union(union),
                    };
                    push(UnitKind::Feature(*feature), code);
                }
            }
        }

        debug!(shape, units = units.len(), "generated bundle");
        Some(TypeBundle {
            shape: shape.to_string(),
            units,
        })
    }
}

/// Snake-case field names must stay distinct within a type and clear of
/// the identifier field
fn check_field_names(model: &TypeModel, object: &ObjectType) -> std::result::Result<(), ModelError> {
    let mut seen: HashMap<String, String> = HashMap::new();
    seen.insert("identifier".to_string(), "the identifier".to_string());
    for property in effective_properties(model, &object.name)? {
        let field = field_name(&property.name);
        if let Some(other) = seen.get(&field) {
            return Err(ModelError::TypeNameCollision {
                type_name: object.name.clone(),
                generated: field,
                other: other.clone(),
            });
        }
        seen.insert(field, format!("property '{}'", property.name));
    }
    Ok(())
}

// =============================================================================
// Generated Output
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Trait, struct, parameters, properties, constructor, accessors
    Declaration,
    Feature(Feature),
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Declaration => "declaration",
            Self::Feature(feature) => feature.as_str(),
        }
    }
}

/// One emitted piece of code
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedUnit {
    pub shape: TypeName,
    pub kind: UnitKind,
    pub code: String,
    pub dependencies: Vec<TypeName>,
    pub checksum: Checksum,
}

impl GeneratedUnit {
    pub fn new(shape: &str, kind: UnitKind, code: String, dependencies: Vec<TypeName>) -> Self {
        Self {
            checksum: Checksum::from_str(&code),
            shape: shape.to_string(),
            kind,
            code,
            dependencies,
        }
    }
}

/// Every unit generated for one type
#[derive(Debug, Clone, Serialize)]
pub struct TypeBundle {
    pub shape: TypeName,
    pub units: Vec<GeneratedUnit>,
}

impl TypeBundle {
    pub fn unit(&self, kind: UnitKind) -> Option<&GeneratedUnit> {
        self.units.iter().find(|unit| unit.kind == kind)
    }

    /// All units, concatenated
    pub fn code(&self) -> String {
        self.units.iter().map(|unit| unit.code.as_str()).collect::<Vec<_>>().join("\n")
    }
}

/// Render bundles as one Rust module
pub fn render_module(bundles: &[TypeBundle], output: &OutputConfig, runtime_crate: &str) -> String {
    let mut module = String::new();

    if output.header {
        module.push_str("//! Generated by shapegen - DO NOT EDIT\n");
        if output.checksums {
            let fingerprint = Checksum::of_parts(
                bundles
                    .iter()
                    .flat_map(|bundle| bundle.units.iter().map(|unit| unit.checksum.as_str())),
            );
            module.push_str(&format!("//! Fingerprint: {}\n", fingerprint.short()));
        }
        module.push('\n');
    }

    module.push_str("#![allow(dead_code, unused_imports, clippy::all)]\n\n");
    module.push_str(&format!("use {}::prelude::*;\n", runtime_crate));

    for bundle in bundles {
        for unit in &bundle.units {
            module.push('\n');
            if output.checksums {
                module.push_str(&format!(
                    "// {} ({}) checksum {}\n",
                    bundle.shape,
                    unit.kind.as_str(),
                    unit.checksum.short()
                ));
            }
            module.push_str(&unit.code);
        }
    }

    module
}

/// Build the context and render the module in one step
pub fn generate_module(output: BuildOutput, config: &ShapegenConfig) -> Result<(String, Diagnostics)> {
    let context = CodegenContext::build(output, config);
    let bundles = context.generate()?;
    let module = render_module(&bundles, &config.output, &config.generator.runtime_crate);
    Ok((module, context.diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::parse_str;
    use crate::model::build_model;

    pub(crate) fn context(json: &str) -> CodegenContext {
        let config = ShapegenConfig::default();
        let set = parse_str(json).unwrap();
        CodegenContext::build(build_model(&set.shapes, &config.generator), &config)
    }

    pub(crate) fn object_region(json: &str, shape: &str) -> ObjectRegion {
        match context(json).region(shape) {
            Some(Region::Object(object)) => object.clone(),
            other => panic!("expected object region for {}, got {:?}", shape, other),
        }
    }

    pub(crate) fn union_region(json: &str, shape: &str) -> UnionRegion {
        match context(json).region(shape) {
            Some(Region::Union(union)) => union.clone(),
            other => panic!("expected union region for {}, got {:?}", shape, other),
        }
    }

    const HIERARCHY: &str = r#"{"shapes": [
        {"name": "Root", "abstract": true, "properties": [
            {"name": "label", "path": "urn:label", "type": "string", "maxCount": 1}
        ]},
        {"name": "Left", "abstract": true, "parents": ["Root"]},
        {"name": "Right", "abstract": true, "parents": ["Root"], "properties": [
            {"name": "weight", "path": "urn:weight", "type": "double", "minCount": 1, "maxCount": 1}
        ]},
        {"name": "Bottom", "parents": ["Left", "Right"], "properties": [
            {"name": "next", "path": "urn:next", "shape": "Bottom", "maxCount": 1}
        ]}
    ]}"#;

    #[test]
    fn test_inherited_fields_come_from_first_carrying_parent() {
        let region = object_region(HIERARCHY, "Bottom");
        let inherited: Vec<(usize, &str)> = region
            .inherited_fields()
            .into_iter()
            .map(|(index, field)| (index, field.field.as_str()))
            .collect();
        assert_eq!(inherited, vec![(0, "label"), (1, "weight")]);
        assert_eq!(region.own_fields().count(), 1);
        assert_eq!(region.ancestors.len(), 3);
    }

    #[test]
    fn test_recursive_single_value_is_boxed() {
        let region = object_region(HIERARCHY, "Bottom");
        let next = region.fields.iter().find(|f| f.key == "next").unwrap();
        assert!(next.recursive);
        assert!(next.boxed);
    }

    #[test]
    fn test_field_name_collision_fails_type() {
        let context = context(
            r#"{"name": "Thing", "properties": [
                {"name": "firstName", "path": "urn:a", "type": "string", "maxCount": 1},
                {"name": "first_name", "path": "urn:b", "type": "string", "maxCount": 1}
            ]}"#,
        );
        assert!(context.region("Thing").is_none());
        assert!(context.model().is_failed("Thing"));
    }

    #[test]
    fn test_collision_propagates_to_dependents() {
        let context = context(
            r#"{"shapes": [
                {"name": "Box"},
                {"name": "Crate", "properties": [{"name": "inner", "path": "urn:inner", "shape": "Box", "maxCount": 1}]}
            ]}"#,
        );
        assert!(context.model().is_failed("Box"));
        assert!(context.model().is_failed("Crate"));
        assert!(context.generated_types().is_empty());
    }

    #[test]
    fn test_generate_preserves_declaration_order() {
        let context = context(HIERARCHY);
        let bundles = context.generate().unwrap();
        let shapes: Vec<&str> = bundles.iter().map(|b| b.shape.as_str()).collect();
        assert_eq!(shapes, vec!["Root", "Left", "Right", "Bottom"]);
        assert!(bundles[3].unit(UnitKind::Feature(Feature::Sparql)).is_some());
    }

    #[test]
    fn test_render_module_header() {
        let context = context(HIERARCHY);
        let bundles = context.generate().unwrap();
        let module = render_module(&bundles, &OutputConfig::default(), "shapegen_runtime");
        assert!(module.starts_with("//! Generated by shapegen - DO NOT EDIT\n//! Fingerprint: "));
        assert!(module.contains("use shapegen_runtime::prelude::*;"));
        assert!(module.contains("// Bottom (declaration) checksum "));
    }
}
