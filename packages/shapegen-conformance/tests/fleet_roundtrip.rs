//! Fleet Round Trips
//!
//! The fleet module chains `Asset` -> `Vehicle` -> `Truck`/`Trailer` with a
//! type tag declared on every level, holds a required nested `Cab` record,
//! and stores `Rolling` union values on `Depot`.

use std::collections::BTreeSet;

use shapegen_conformance::fleet::*;
use shapegen_runtime::prelude::*;

const FLEET: &str = "http://example.org/fleet/";

fn iri(local: &str) -> String {
    format!("{}{}", FLEET, local)
}

// =============================================================================
// Fixtures
// =============================================================================

fn cab() -> Cab {
    Cab::from(CabParameters {
        identifier: None,
        seats: 2,
        color: Some("red".to_string()),
    })
}

fn truck() -> Truck {
    Truck::new(TruckParameters {
        identifier: None,
        serial: "TR-100".to_string(),
        wheels: 6,
        registered: NaiveDate::from_ymd_opt(2021, 3, 14),
        payload: Some(12.5),
        cab: cab(),
    })
}

fn trailer() -> Trailer {
    Trailer::new(TrailerParameters {
        identifier: None,
        serial: "TL-7".to_string(),
        wheels: 4,
        registered: None,
        last_inspection: DateTime::from_timestamp(1_700_000_000, 0),
    })
}

fn depot() -> Depot {
    Depot::new(DepotParameters {
        identifier: NamedNode::new("http://example.org/depots/north"),
        name: "North".to_string(),
        vehicles: vec![Rolling::from(truck()), Rolling::from(trailer())],
        flagship: Some(Rolling::from(truck())),
    })
}

fn encode_truck(truck: &Truck) -> (Dataset, Identifier) {
    let mut dataset = Dataset::new();
    let identifier = truck.to_rdf(&mut dataset, &ToRdfOptions::default());
    (dataset, identifier)
}

// =============================================================================
// Type Tags
// =============================================================================

#[test]
fn test_only_the_leaf_type_is_written() {
    let (dataset, identifier) = encode_truck(&truck());

    let tags: Vec<&Term> = dataset.objects(&identifier, rdf::TYPE).collect();
    assert_eq!(tags, vec![&Term::from(NamedNode::new(iri("Truck")))]);
    assert!(dataset.subjects_with_type(&iri("Vehicle")).is_empty());
    assert!(dataset.subjects_with_type(&iri("Asset")).is_empty());
}

#[test]
fn test_parent_tag_alone_does_not_decode() {
    let (dataset, identifier) = encode_truck(&truck());
    let retagged: Dataset = dataset
        .iter()
        .map(|quad| {
            if quad.predicate.as_str() == rdf::TYPE {
                Quad::new(
                    quad.subject.clone(),
                    quad.predicate.clone(),
                    Term::from(NamedNode::new(iri("Vehicle"))),
                    None,
                )
            } else {
                quad.clone()
            }
        })
        .collect();

    match Truck::from_rdf(&Resource::new(&retagged, identifier), FromRdfOptions::default()) {
        Err(DecodeError::MistypedValue { predicate, .. }) => assert_eq!(predicate, rdf::TYPE),
        other => panic!("expected a type mismatch, got {:?}", other),
    }
}

// =============================================================================
// Nested Record
// =============================================================================

#[test]
fn test_truck_graph_roundtrip() {
    let original = truck();
    let (dataset, identifier) = encode_truck(&original);

    let decoded = Truck::from_rdf(&Resource::new(&dataset, identifier.clone()), FromRdfOptions::default()).unwrap();
    assert_eq!(decoded.equals(&original), Ok(()));
    assert_eq!(decoded.identifier(), &identifier);
    assert_eq!(decoded.serial(), "TR-100");
    assert_eq!(decoded.registered(), NaiveDate::from_ymd_opt(2021, 3, 14));
    assert_eq!(decoded.cab().seats(), 2);
    assert_eq!(decoded.cab().color(), Some("red"));
}

#[test]
fn test_truck_document_roundtrip() {
    let original = truck();
    let document = original.to_json();
    assert_eq!(document["type"], "Truck");
    assert_eq!(document["registered"], "2021-03-14");
    assert_eq!(document["cab"]["seats"], 2);

    let decoded = Truck::from_json(&document).unwrap();
    assert_eq!(decoded.equals(&original), Ok(()));
    assert_eq!(decoded.payload(), Some(12.5));
}

#[test]
fn test_missing_cab_is_reported() {
    let (dataset, identifier) = encode_truck(&truck());
    let cab = iri("cab");
    let without_cab: Dataset = dataset
        .iter()
        .filter(|quad| quad.predicate.as_str() != cab)
        .cloned()
        .collect();

    match Truck::from_rdf(&Resource::new(&without_cab, identifier), FromRdfOptions::default()) {
        Err(DecodeError::MissingValue { predicate, .. }) => assert_eq!(predicate, cab),
        other => panic!("expected a missing cab, got {:?}", other),
    }

    let mut document = truck().to_json();
    document.as_object_mut().unwrap().remove("cab");
    assert!(matches!(Truck::from_json(&document), Err(DocumentError::Validation(_))));
}

#[test]
fn test_cab_color_outside_the_allowed_set() {
    let (dataset, identifier) = encode_truck(&truck());
    let color = iri("color");
    let repainted: Dataset = dataset
        .iter()
        .map(|quad| {
            if quad.predicate.as_str() == color {
                Quad::new(
                    quad.subject.clone(),
                    quad.predicate.clone(),
                    Term::from(Literal::new_simple("blue")),
                    None,
                )
            } else {
                quad.clone()
            }
        })
        .collect();

    match Truck::from_rdf(&Resource::new(&repainted, identifier), FromRdfOptions::default()) {
        Err(DecodeError::MistypedValue { predicate, .. }) => assert_eq!(predicate, color),
        other => panic!("expected a rejected color, got {:?}", other),
    }

    let mut document = truck().to_json();
    document["cab"]["color"] = json::json!("blue");
    assert!(matches!(Truck::from_json(&document), Err(DocumentError::Validation(_))));
}

// =============================================================================
// Union Properties
// =============================================================================

fn discriminators(vehicles: &[Rolling]) -> BTreeSet<&'static str> {
    vehicles.iter().map(Rolling::discriminator).collect()
}

#[test]
fn test_depot_graph_roundtrip() {
    let original = depot();
    let mut dataset = Dataset::new();
    let identifier = original.to_rdf(&mut dataset, &ToRdfOptions::default());
    assert_eq!(identifier, Identifier::from(NamedNode::new("http://example.org/depots/north")));
    assert_eq!(dataset.subjects_with_type(&iri("Truck")).len(), 2);
    assert_eq!(dataset.subjects_with_type(&iri("Trailer")).len(), 1);

    let decoded = Depot::from_rdf(&Resource::new(&dataset, identifier), FromRdfOptions::default()).unwrap();
    assert_eq!(decoded.equals(&original), Ok(()));
    assert_eq!(decoded.name(), "North");
    assert_eq!(discriminators(decoded.vehicles()), BTreeSet::from(["Trailer", "Truck"]));
    assert!(matches!(decoded.flagship(), Some(Rolling::Truck(_))));

    let trailer = decoded
        .vehicles()
        .iter()
        .find_map(|vehicle| match vehicle {
            Rolling::Trailer(trailer) => Some(trailer),
            Rolling::Truck(_) => None,
        })
        .unwrap();
    assert_eq!(trailer.last_inspection(), DateTime::from_timestamp(1_700_000_000, 0));
    assert_eq!(trailer.registered(), None);
}

#[test]
fn test_depot_document_roundtrip() {
    let original = depot();
    let document = original.to_json();
    assert_eq!(document["@id"], "http://example.org/depots/north");
    assert_eq!(document["flagship"]["type"], "Truck");

    let decoded = Depot::from_json(&document).unwrap();
    assert_eq!(decoded.equals(&original), Ok(()));
    assert_eq!(discriminators(decoded.vehicles()), BTreeSet::from(["Trailer", "Truck"]));

    let mut foreign = document.clone();
    foreign["flagship"] = json::json!({"type": "Cab", "seats": 3});
    assert!(matches!(Depot::from_json(&foreign), Err(DocumentError::Validation(_))));
}

#[test]
fn test_rolling_rejects_a_cab_node() {
    let mut dataset = Dataset::new();
    let identifier = cab_to_rdf(&cab(), &mut dataset, &ToRdfOptions::default());

    match Rolling::from_rdf(&Resource::new(&dataset, identifier), FromRdfOptions::default()) {
        Err(DecodeError::UnionExhausted { union, .. }) => assert_eq!(union, "Rolling"),
        other => panic!("expected an exhausted union, got {:?}", other),
    }
}

// =============================================================================
// Query Templates
// =============================================================================

#[test]
fn test_truck_query_tags_only_the_leaf() {
    let query = Truck::sparql_construct_query(&SparqlOptions::new("truck"));

    assert!(query.contains(&format!("?truck <{}> <{}> .", rdf::TYPE, iri("Truck"))));
    assert!(!query.contains(&format!("<{}>", iri("Vehicle"))));
    assert!(!query.contains(&format!("<{}>", iri("Asset"))));
    assert!(query.contains(&format!("?truck <{}> ?truck_serial .", iri("serial"))));
    assert!(query.contains(&format!("?truck_cab <{}> ?truck_cab_seats .", iri("seats"))));
}
