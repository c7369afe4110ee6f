//! Recursive Round Trips

use shapegen_conformance::recursive::*;
use shapegen_runtime::prelude::*;

fn category(name: &str, broader: Option<Category>, narrower: Vec<Category>) -> Category {
    Category::new(CategoryParameters {
        identifier: None,
        name: name.to_string(),
        broader,
        narrower,
    })
}

fn tree() -> Category {
    let root = category("Science", None, Vec::new());
    category(
        "Physics",
        Some(root),
        vec![category("Optics", None, Vec::new()), category("Acoustics", None, Vec::new())],
    )
}

#[test]
fn test_tree_graph_roundtrip() {
    let original = tree();
    let mut dataset = Dataset::new();
    let identifier = original.to_rdf(&mut dataset, &ToRdfOptions::default());

    let decoded = Category::from_rdf(&Resource::new(&dataset, identifier), FromRdfOptions::default()).unwrap();
    assert_eq!(decoded.equals(&original), Ok(()));
    assert_eq!(decoded.broader().map(|c| c.name()), Some("Science"));
    assert_eq!(decoded.narrower().len(), 2);
}

#[test]
fn test_tree_document_roundtrip() {
    let original = tree();
    let document = original.to_json();
    assert_eq!(document["broader"]["name"], "Science");

    let decoded = Category::from_json(&document).unwrap();
    assert_eq!(decoded.equals(&original), Ok(()));

    // Nested levels are validated as they are decoded
    let mut broken = document.clone();
    broken["broader"] = json::json!({"type": "Category"});
    assert!(matches!(Category::from_json(&broken), Err(DocumentError::Validation(_))));
}

#[test]
fn test_recursive_edge_has_open_schema() {
    let schema = Category::json_schema();
    assert_eq!(schema["properties"]["broader"], json::json!({"type": "object"}));
}
