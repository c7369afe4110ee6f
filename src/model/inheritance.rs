//! Inheritance Resolver
//!
//! Linearizes parent chains and computes:
//! - effective property lists (ancestors most-base first, then own)
//! - descendant discriminator values, written into the model
//! - union dispatch: which discriminator values each member claims
//!
//! Parent cycles are found with an SCC pass over the parent graph before
//! anything walks a chain.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use super::{Diagnostics, ModelError, ObjectType, Property, ShapeType, TypeModel, TypeName};

/// Document key reserved for identifiers
pub const ID_KEY: &str = "@id";

/// Property names that would clash with generated fields
pub const RESERVED_PROPERTY_NAMES: &[&str] = &[ID_KEY, "identifier"];

// =============================================================================
// Parent Graph
// =============================================================================

/// Check parent references and report parent cycles
pub fn check_parents(model: &TypeModel) -> Vec<ModelError> {
    let mut errors = Vec::new();
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

    for object in model.objects() {
        nodes.insert(&object.name, graph.add_node(&object.name));
    }

    for object in model.objects() {
        for parent in &object.parents {
            match model.get(parent) {
                None => errors.push(ModelError::UnresolvedReference {
                    type_name: object.name.clone(),
                    reference: parent.clone(),
                }),
                Some(ShapeType::Object(_)) => {
                    graph.add_edge(nodes[object.name.as_str()], nodes[parent.as_str()], ());
                }
                Some(_) => errors.push(ModelError::ParentNotObject {
                    type_name: object.name.clone(),
                    parent: parent.clone(),
                }),
            }
        }
    }

    for component in kosaraju_scc(&graph) {
        let cyclic = component.len() > 1 || graph.contains_edge(component[0], component[0]);
        if !cyclic {
            continue;
        }
        let mut cycle: Vec<TypeName> = component.iter().map(|&i| graph[i].to_string()).collect();
        cycle.sort();
        for name in &cycle {
            errors.push(ModelError::InheritanceCycle {
                type_name: name.clone(),
                cycle: cycle.clone(),
            });
        }
    }

    errors
}

// =============================================================================
// Chains
// =============================================================================

/// Every ancestor of `name`, most-base first, each once. Requires an acyclic
/// parent graph.
pub fn ancestors(model: &TypeModel, name: &str) -> Vec<TypeName> {
    fn visit(model: &TypeModel, name: &str, seen: &mut HashSet<TypeName>, out: &mut Vec<TypeName>) {
        let Some(object) = model.object(name) else {
            return;
        };
        for parent in &object.parents {
            if seen.insert(parent.clone()) {
                visit(model, parent, seen, out);
                out.push(parent.clone());
            }
        }
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    visit(model, name, &mut seen, &mut out);
    out
}

/// Transitive descendants of `name` in model order
pub fn descendants<'a>(model: &'a TypeModel, name: &str) -> Vec<&'a ObjectType> {
    let mut found: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::from([name]);
    while let Some(current) = queue.pop_front() {
        for child in model.children(current) {
            if found.insert(&child.name) {
                queue.push_back(&child.name);
            }
        }
    }
    model.objects().filter(|o| found.contains(o.name.as_str())).collect()
}

/// Inherited properties (parents in declaration order, most-base first)
/// followed by own properties. A name declared twice is an error.
pub fn effective_properties(model: &TypeModel, name: &str) -> Result<Vec<Property>, ModelError> {
    let object = model.object(name).ok_or_else(|| ModelError::UnresolvedReference {
        type_name: name.to_string(),
        reference: name.to_string(),
    })?;

    let mut properties: Vec<Property> = Vec::new();
    let push = |property: &Property, properties: &mut Vec<Property>| {
        if let Some(existing) = properties.iter().find(|p| p.name == property.name) {
            return Err(ModelError::DuplicateProperty {
                type_name: name.to_string(),
                property: property.name.clone(),
                first_owner: existing.owner.clone(),
            });
        }
        properties.push(property.clone());
        Ok(())
    };

    for ancestor in ancestors(model, name) {
        if let Some(ancestor) = model.object(&ancestor) {
            for property in &ancestor.properties {
                push(property, &mut properties)?;
            }
        }
    }
    for property in &object.properties {
        push(property, &mut properties)?;
    }
    Ok(properties)
}

/// Check one object type once its chain is known to be acyclic
pub fn check_object(model: &TypeModel, object: &ObjectType) -> Result<(), ModelError> {
    for parent in &object.parents {
        if let Some(parent) = model.object(parent) {
            if parent.discriminator.name != object.discriminator.name {
                return Err(ModelError::DiscriminatorConflict {
                    type_name: object.name.clone(),
                    expected: parent.discriminator.name.clone(),
                    found: object.discriminator.name.clone(),
                    related: parent.name.clone(),
                });
            }
        }
    }

    for property in effective_properties(model, &object.name)? {
        if RESERVED_PROPERTY_NAMES.contains(&property.name.as_str()) || property.name == object.discriminator.name {
            return Err(ModelError::ReservedPropertyName {
                type_name: object.name.clone(),
                property: property.name,
            });
        }
    }

    if !object.is_abstract && object.discriminator.own_values.is_empty() {
        return Err(ModelError::EmptyDiscriminatorSet {
            type_name: object.name.clone(),
            union: object.name.clone(),
        });
    }
    Ok(())
}

/// Fill every object's descendant discriminator values
pub fn assign_descendant_values(model: &mut TypeModel) {
    let assignments: Vec<(TypeName, Vec<String>)> = model
        .objects()
        .map(|object| {
            let mut values: Vec<String> = Vec::new();
            for descendant in descendants(model, &object.name) {
                for value in &descendant.discriminator.own_values {
                    if !values.contains(value) && !object.discriminator.own_values.contains(value) {
                        values.push(value.clone());
                    }
                }
            }
            (object.name.clone(), values)
        })
        .collect();

    for (name, values) in assignments {
        if let Some(ShapeType::Object(object)) = model.get_mut(&name) {
            debug!(type_name = %name, descendants = values.len(), "assigned descendant discriminator values");
            object.discriminator.descendant_values = values;
        }
    }
}

/// Values an object's own document schema accepts: own then descendants
pub fn accepted_values(object: &ObjectType) -> Vec<String> {
    let mut values = object.discriminator.own_values.clone();
    for value in &object.discriminator.descendant_values {
        if !values.contains(value) {
            values.push(value.clone());
        }
    }
    values
}

// =============================================================================
// Union Dispatch
// =============================================================================

/// Discriminator values a direct union member dispatches on
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDispatch {
    pub member: TypeName,
    pub values: Vec<String>,
}

/// A value claimed by more than one member; the first declared keeps it
#[derive(Debug, Clone, PartialEq)]
pub struct Ambiguity {
    pub value: String,
    pub kept_by: TypeName,
    pub dropped_by: TypeName,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnionDispatch {
    pub members: Vec<MemberDispatch>,
    pub ambiguities: Vec<Ambiguity>,
}

impl UnionDispatch {
    pub fn values_of(&self, member: &str) -> &[String] {
        self.members
            .iter()
            .find(|m| m.member == member)
            .map(|m| m.values.as_slice())
            .unwrap_or(&[])
    }
}

/// Object types reachable through a union, with the direct member each
/// came through. Nested unions are flattened.
fn flatten_members<'a>(
    model: &'a TypeModel,
    union_name: &str,
) -> Result<Vec<(TypeName, &'a ObjectType)>, ModelError> {
    let mut leaves = Vec::new();
    let mut visiting = BTreeSet::new();

    fn walk<'a>(
        model: &'a TypeModel,
        root: &str,
        current: &str,
        direct: Option<&str>,
        visiting: &mut BTreeSet<TypeName>,
        leaves: &mut Vec<(TypeName, &'a ObjectType)>,
    ) -> Result<(), ModelError> {
        if !visiting.insert(current.to_string()) {
            return Err(ModelError::InvalidUnionMember {
                type_name: root.to_string(),
                member: current.to_string(),
            });
        }
        let union = model.union(current).ok_or_else(|| ModelError::UnresolvedReference {
            type_name: root.to_string(),
            reference: current.to_string(),
        })?;
        if union.members.is_empty() {
            return Err(ModelError::EmptyUnion {
                type_name: current.to_string(),
            });
        }
        for member in &union.members {
            let via = direct.unwrap_or(member).to_string();
            match model.get(member) {
                None => {
                    return Err(ModelError::UnresolvedReference {
                        type_name: root.to_string(),
                        reference: member.clone(),
                    })
                }
                Some(ShapeType::Object(object)) if object.is_abstract => {
                    return Err(ModelError::AbstractUnionMember {
                        type_name: root.to_string(),
                        member: member.clone(),
                    })
                }
                Some(ShapeType::Object(object)) => {
                    if object.discriminator.name != model.union(root).map(|u| u.discriminator_property.as_str()).unwrap_or("") {
                        return Err(ModelError::DiscriminatorConflict {
                            type_name: root.to_string(),
                            expected: model
                                .union(root)
                                .map(|u| u.discriminator_property.clone())
                                .unwrap_or_default(),
                            found: object.discriminator.name.clone(),
                            related: object.name.clone(),
                        });
                    }
                    leaves.push((via, object));
                }
                Some(ShapeType::Union(_)) => walk(model, root, member, Some(&via), visiting, leaves)?,
                Some(ShapeType::Value(_)) => {
                    return Err(ModelError::InvalidUnionMember {
                        type_name: root.to_string(),
                        member: member.clone(),
                    })
                }
            }
        }
        visiting.remove(current);
        Ok(())
    }

    walk(model, union_name, union_name, None, &mut visiting, &mut leaves)?;
    Ok(leaves)
}

/// Compute which values each direct member of a union dispatches on.
///
/// Each leaf object claims its own values plus descendant values that no
/// other leaf owns. Claims are made in declaration order and a value
/// already claimed stays with the earlier leaf.
pub fn union_dispatch(model: &TypeModel, union_name: &str) -> Result<UnionDispatch, ModelError> {
    let leaves = flatten_members(model, union_name)?;

    let owned_by_leaf: HashMap<&str, &str> = leaves
        .iter()
        .flat_map(|(_, leaf)| {
            leaf.discriminator
                .own_values
                .iter()
                .map(move |value| (value.as_str(), leaf.name.as_str()))
        })
        .collect();

    let mut claimed: HashMap<String, TypeName> = HashMap::new();
    let mut dispatch = UnionDispatch::default();

    for (direct, leaf) in &leaves {
        let mut candidates: Vec<&String> = leaf.discriminator.own_values.iter().collect();
        for value in &leaf.discriminator.descendant_values {
            let owned_elsewhere = owned_by_leaf
                .get(value.as_str())
                .map(|owner| *owner != leaf.name)
                .unwrap_or(false);
            if !owned_elsewhere {
                candidates.push(value);
            }
        }

        let mut leaf_values = Vec::new();
        for value in candidates {
            match claimed.get(value) {
                Some(owner) if owner != &leaf.name => dispatch.ambiguities.push(Ambiguity {
                    value: value.clone(),
                    kept_by: owner.clone(),
                    dropped_by: leaf.name.clone(),
                }),
                Some(_) => {}
                None => {
                    claimed.insert(value.clone(), leaf.name.clone());
                    leaf_values.push(value.clone());
                }
            }
        }

        if leaf_values.is_empty() {
            return Err(ModelError::EmptyDiscriminatorSet {
                type_name: leaf.name.clone(),
                union: union_name.to_string(),
            });
        }

        match dispatch.members.iter_mut().find(|m| &m.member == direct) {
            Some(member) => member.values.extend(leaf_values),
            None => dispatch.members.push(MemberDispatch {
                member: direct.clone(),
                values: leaf_values,
            }),
        }
    }

    Ok(dispatch)
}

/// Run the union checks and report ambiguities
pub fn check_union(model: &TypeModel, union_name: &str, diagnostics: &mut Diagnostics) -> Result<(), ModelError> {
    let dispatch = union_dispatch(model, union_name)?;
    for ambiguity in &dispatch.ambiguities {
        diagnostics.ambiguous_discriminator(union_name, &ambiguity.value, &ambiguity.kept_by, &ambiguity.dropped_by);
    }
    Ok(())
}
