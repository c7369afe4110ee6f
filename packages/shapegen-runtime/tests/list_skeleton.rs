//! List Query Skeleton
//!
//! Evaluates the fixed list skeleton against encoded lists of several
//! lengths with a small pattern matcher, and checks that the CONSTRUCT
//! template rebuilds every list statement.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use shapegen_runtime::prelude::*;
use shapegen_runtime::sparql::{ListSkeleton, Pattern, Predicate, SparqlTerm, Triple};

const ITEMS: &str = "http://example.com/items";
const NAME: &str = "http://example.com/name";

type Binding = BTreeMap<String, Term>;
type Statement = (Term, String, Term);

// =============================================================================
// Test Evaluator
// =============================================================================

fn resolve(term: &SparqlTerm, binding: &Binding) -> Option<Term> {
    match term {
        SparqlTerm::Variable(name) => binding.get(name).cloned(),
        SparqlTerm::NamedNode(node) => Some(Term::from(node.clone())),
        SparqlTerm::Literal(literal) => Some(Term::from(literal.clone())),
    }
}

fn unify(binding: &Binding, term: &SparqlTerm, value: &Term) -> Option<Binding> {
    match term {
        SparqlTerm::Variable(name) => match binding.get(name) {
            Some(bound) if bound == value => Some(binding.clone()),
            Some(_) => None,
            None => {
                let mut extended = binding.clone();
                extended.insert(name.clone(), value.clone());
                Some(extended)
            }
        },
        fixed => (resolve(fixed, binding).as_ref() == Some(value)).then(|| binding.clone()),
    }
}

/// Nodes reachable from `start` over zero or more `predicate` edges
fn reachable(dataset: &Dataset, start: &Term, predicate: &str) -> Vec<Term> {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([start.clone()]);
    let mut found = Vec::new();
    while let Some(node) = queue.pop_front() {
        if !seen.insert(node.to_string()) {
            continue;
        }
        if let Some(identifier) = node.as_identifier() {
            queue.extend(dataset.objects(&identifier, predicate).cloned());
        }
        found.push(node);
    }
    found
}

fn match_triple(dataset: &Dataset, triple: &Triple, binding: &Binding) -> Vec<Binding> {
    match &triple.predicate {
        Predicate::Iri(predicate) => dataset
            .iter()
            .filter(|quad| quad.predicate == *predicate)
            .filter_map(|quad| {
                let bound = unify(binding, &triple.subject, &Term::from(quad.subject.clone()))?;
                unify(&bound, &triple.object, &quad.object)
            })
            .collect(),
        Predicate::ZeroOrMore(predicate) => {
            let start = resolve(&triple.subject, binding).expect("path start must be bound");
            reachable(dataset, &start, predicate.as_str())
                .iter()
                .filter_map(|node| unify(binding, &triple.object, node))
                .collect()
        }
    }
}

fn evaluate(dataset: &Dataset, patterns: &[Pattern], input: Vec<Binding>) -> Vec<Binding> {
    patterns.iter().fold(input, |solutions, pattern| match pattern {
        Pattern::Bgp(triples) => triples.iter().fold(solutions, |solutions, triple| {
            solutions
                .iter()
                .flat_map(|binding| match_triple(dataset, triple, binding))
                .collect()
        }),
        Pattern::Optional(inner) => solutions
            .into_iter()
            .flat_map(|binding| {
                let extended = evaluate(dataset, inner, vec![binding.clone()]);
                if extended.is_empty() {
                    vec![binding]
                } else {
                    extended
                }
            })
            .collect(),
        Pattern::Union(groups) => solutions
            .iter()
            .flat_map(|binding| {
                groups
                    .iter()
                    .flat_map(|group| evaluate(dataset, group, vec![binding.clone()]))
                    .collect::<Vec<_>>()
            })
            .collect(),
        Pattern::Filter(_) => solutions,
    })
}

fn construct(dataset: &Dataset, template: &[Triple], patterns: &[Pattern]) -> BTreeSet<Statement> {
    let mut statements = BTreeSet::new();
    for binding in evaluate(dataset, patterns, vec![Binding::new()]) {
        for triple in template {
            let (Some(subject), Some(object)) = (resolve(&triple.subject, &binding), resolve(&triple.object, &binding))
            else {
                continue;
            };
            if let Predicate::Iri(predicate) = &triple.predicate {
                statements.insert((subject, predicate.as_str().to_string(), object));
            }
        }
    }
    statements
}

/// Every statement except the optional `rdf:List` tags on list links
fn list_statements(dataset: &Dataset) -> BTreeSet<Statement> {
    dataset
        .iter()
        .filter(|quad| !(quad.predicate.as_str() == rdf::TYPE && quad.object == Term::from(NamedNode::new(rdf::LIST))))
        .map(|quad| {
            (
                Term::from(quad.subject.clone()),
                quad.predicate.as_str().to_string(),
                quad.object.clone(),
            )
        })
        .collect()
}

fn subject() -> Identifier {
    Identifier::from(NamedNode::new("http://example.com/s"))
}

fn encode(items: &[String]) -> Dataset {
    let mut dataset = Dataset::new();
    let mut resource = MutableResource::new(&mut dataset, subject(), None);
    resource.add_list(ITEMS, items, |item, _dataset| item.to_term());
    dataset
}

fn rebuilt(dataset: &Dataset) -> BTreeSet<Statement> {
    let options = SparqlOptions::for_subject(SparqlTerm::NamedNode(NamedNode::new("http://example.com/s")), "s");
    let list = ListSkeleton::new(&options, "items");
    construct(
        dataset,
        &list.construct_triples(ITEMS),
        &[list.where_pattern(ITEMS, Vec::new(), Vec::new())],
    )
}

fn strings(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("item {}", i)).collect()
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_empty_list() {
    let dataset = encode(&[]);
    let statements = rebuilt(&dataset);
    assert_eq!(statements, list_statements(&dataset));
    assert_eq!(statements.len(), 1);
}

#[test]
fn test_single_item_list() {
    let dataset = encode(&strings(1));
    assert_eq!(rebuilt(&dataset), list_statements(&dataset));
}

#[test]
fn test_five_item_list() {
    let dataset = encode(&strings(5));
    let statements = rebuilt(&dataset);
    assert_eq!(statements, list_statements(&dataset));
    // head statement plus first and rest per link
    assert_eq!(statements.len(), 1 + 5 * 2);
}

#[test]
fn test_rebuilt_graph_decodes_in_order() {
    let items = strings(5);
    let dataset = encode(&items);
    let rebuilt: Dataset = rebuilt(&dataset)
        .into_iter()
        .map(|(subject, predicate, object)| {
            let subject = subject.as_identifier().expect("subjects are identifiers");
            Quad::new(subject, NamedNode::new(predicate), object, None)
        })
        .collect();

    let resource = Resource::new(&rebuilt, subject());
    let decoded = resource.values(ITEMS).list(true, |v| v.to::<String>()).unwrap();
    assert_eq!(decoded, items);
}

#[test]
fn test_nested_item_patterns() {
    let names = ["north", "south", "east"];
    let mut dataset = Dataset::new();
    let mut resource = MutableResource::new(&mut dataset, subject(), None);
    resource.add_list(ITEMS, &names, |name, dataset| {
        let item = Identifier::from(mint_blank());
        let mut child = MutableResource::new(dataset, item.clone(), None);
        child.add(NAME, *name);
        Term::from(item)
    });

    let options = SparqlOptions::for_subject(SparqlTerm::NamedNode(NamedNode::new("http://example.com/s")), "s");
    let list = ListSkeleton::new(&options, "items");
    let item_pattern = |item: SparqlOptions| {
        vec![Pattern::Bgp(vec![Triple::new(item.subject.clone(), NAME, item.variable("name"))])]
    };
    let item_triple = |item: SparqlOptions| Triple::new(item.subject.clone(), NAME, item.variable("name"));

    let mut template = list.construct_triples(ITEMS);
    template.push(item_triple(list.first_item_options()));
    template.push(item_triple(list.tail_item_options()));
    let patterns = [list.where_pattern(
        ITEMS,
        item_pattern(list.first_item_options()),
        item_pattern(list.tail_item_options()),
    )];

    let statements = construct(&dataset, &template, &patterns);
    let found: BTreeSet<String> = statements
        .iter()
        .filter(|(_, predicate, _)| predicate == NAME)
        .filter_map(|(_, _, object)| object.as_literal().map(|l| l.value().to_string()))
        .collect();
    assert_eq!(found, names.iter().map(|n| n.to_string()).collect());
    assert_eq!(statements, list_statements(&dataset));
}

#[test]
fn test_skeleton_variables_are_scoped() {
    let options = SparqlOptions::new("order");
    let first = ListSkeleton::new(&options, "lines");
    let second = ListSkeleton::new(&options.nested("customer"), "lines");
    assert_eq!(first.head, SparqlTerm::variable("order_lines_head"));
    assert_eq!(second.head, SparqlTerm::variable("order_customer_lines_head"));
    assert_eq!(first.first_item_options().variable("sku"), SparqlTerm::variable("order_lines_item0_sku"));
    assert_eq!(first.tail_item_options().variable("sku"), SparqlTerm::variable("order_lines_itemN_sku"));

    let mut names: BTreeSet<&str> = first.variables().into_iter().filter_map(SparqlTerm::as_variable).collect();
    assert_eq!(names.len(), 5);
    names.extend(second.variables().into_iter().filter_map(SparqlTerm::as_variable));
    assert_eq!(names.len(), 10);
}
