//! Model Analysis
//!
//! Runs after the resolvers:
//! - recursion: strongly connected components over the type reference
//!   graph. Recursive single-valued fields are boxed, recursive document
//!   schemas stay open and recursive query fragments are not spliced.
//! - features: content-hash identifiers force `hash` on a type and its
//!   dependencies, then a type keeps a feature only if every dependency
//!   has it too.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use tracing::debug;

use super::inheritance::effective_properties;
use super::{DiagnosticCode, Diagnostics, Feature, IdentityStrategy, ShapeType, TypeModel, TypeName};

// =============================================================================
// Recursion
// =============================================================================

/// How a reference from one type to another behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recursion {
    Acyclic,
    /// Both ends are in the same strongly connected component
    Recursive,
}

/// A group of mutually recursive types
#[derive(Debug, Clone, Serialize)]
pub struct RecursiveGroup {
    pub id: usize,
    pub members: Vec<TypeName>,
    pub is_self_referential: bool,
}

/// SCC analysis over references between object and union types.
///
/// Edges: object to parent, object to the shape of each effective
/// property, union to member.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecursionAnalysis {
    pub groups: Vec<RecursiveGroup>,
    membership: HashMap<TypeName, usize>,
}

impl RecursionAnalysis {
    pub fn compute(model: &TypeModel) -> Self {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

        for shape in model.iter() {
            if matches!(shape, ShapeType::Value(_)) || model.is_failed(shape.name()) {
                continue;
            }
            nodes.insert(shape.name(), graph.add_node(shape.name()));
        }

        for shape in model.iter() {
            let Some(&from) = nodes.get(shape.name()) else {
                continue;
            };
            let mut targets: Vec<&str> = Vec::new();
            match shape {
                ShapeType::Object(object) => {
                    targets.extend(object.parents.iter().map(String::as_str));
                    if let Ok(properties) = effective_properties(model, &object.name) {
                        for property in properties {
                            if let Some(target) = property.value_type.shape_name() {
                                if let Some((name, _)) = nodes.get_key_value(target) {
                                    targets.push(name);
                                }
                            }
                        }
                    }
                }
                ShapeType::Union(union) => targets.extend(union.members.iter().map(String::as_str)),
                ShapeType::Value(_) => {}
            }
            for target in targets {
                if let Some(&to) = nodes.get(target) {
                    graph.update_edge(from, to, ());
                }
            }
        }

        let mut analysis = Self::default();
        for component in kosaraju_scc(&graph) {
            let is_self_referential = component.len() == 1 && graph.contains_edge(component[0], component[0]);
            if component.len() == 1 && !is_self_referential {
                continue;
            }
            let id = analysis.groups.len();
            let mut members: Vec<TypeName> = component.iter().map(|&i| graph[i].to_string()).collect();
            members.sort();
            for member in &members {
                analysis.membership.insert(member.clone(), id);
            }
            debug!(id, members = ?members, "recursive group");
            analysis.groups.push(RecursiveGroup {
                id,
                members,
                is_self_referential,
            });
        }
        analysis
    }

    /// Classify the reference `from -> to`
    pub fn edge(&self, from: &str, to: &str) -> Recursion {
        match (self.membership.get(from), self.membership.get(to)) {
            (Some(a), Some(b)) if a == b => Recursion::Recursive,
            _ => Recursion::Acyclic,
        }
    }

    pub fn is_recursive(&self, from: &str, to: &str) -> bool {
        self.edge(from, to) == Recursion::Recursive
    }

    pub fn group_of(&self, name: &str) -> Option<&RecursiveGroup> {
        self.membership.get(name).and_then(|&id| self.groups.get(id))
    }
}

// =============================================================================
// Features
// =============================================================================

/// Every object or union reachable from `name` through dependencies
fn transitive_dependencies(model: &TypeModel, name: &str) -> Vec<TypeName> {
    let mut seen: HashSet<TypeName> = HashSet::new();
    let mut stack = vec![name.to_string()];
    let mut out = Vec::new();
    while let Some(current) = stack.pop() {
        let Some(shape) = model.get(&current) else {
            continue;
        };
        for dep in shape.dependencies() {
            if matches!(model.get(dep), Some(ShapeType::Object(_) | ShapeType::Union(_))) && seen.insert(dep.to_string()) {
                out.push(dep.to_string());
                stack.push(dep.to_string());
            }
        }
    }
    out
}

fn features_mut<'a>(model: &'a mut TypeModel, name: &str) -> Option<&'a mut BTreeSet<Feature>> {
    match model.get_mut(name)? {
        ShapeType::Object(object) => Some(&mut object.features),
        ShapeType::Union(union) => Some(&mut union.features),
        ShapeType::Value(_) => None,
    }
}

/// Force and narrow feature sets until they agree along every dependency
pub fn propagate_features(model: &mut TypeModel, diagnostics: &mut Diagnostics) {
    let content_hashed: Vec<TypeName> = model
        .objects()
        .filter(|o| o.identifier.strategy == IdentityStrategy::ContentHashMint)
        .map(|o| o.name.clone())
        .collect();
    for name in content_hashed {
        let mut forced = transitive_dependencies(model, &name);
        forced.push(name);
        for target in forced {
            if let Some(features) = features_mut(model, &target) {
                features.insert(Feature::Hash);
            }
        }
    }

    let names: Vec<TypeName> = model.names().map(str::to_string).collect();
    loop {
        let mut narrowed: Vec<(TypeName, Feature, TypeName)> = Vec::new();
        for name in &names {
            let Some(shape) = model.get(name) else {
                continue;
            };
            let Some(features) = shape.features() else {
                continue;
            };
            for feature in features {
                let missing = shape.dependencies().into_iter().find(|dep| {
                    model
                        .get(dep)
                        .and_then(ShapeType::features)
                        .map(|dep_features| !dep_features.contains(feature))
                        .unwrap_or(false)
                });
                if let Some(dep) = missing {
                    narrowed.push((name.clone(), *feature, dep.to_string()));
                }
            }
        }

        if narrowed.is_empty() {
            break;
        }
        for (name, feature, dep) in narrowed {
            if let Some(features) = features_mut(model, &name) {
                if features.remove(&feature) {
                    diagnostics.report(
                        name.as_str(),
                        DiagnosticCode::FeatureNarrowed,
                        format!("'{}' dropped because '{}' does not generate it", feature, dep),
                    );
                }
            }
        }
    }
}
