#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::fixtures::{fixture_path, write_description};
use sdkgen::spec::{
    load_description, load_source_graph, parse_description, DescriptionError, SourceGraph,
    SourceType, TypeRef,
};

const JSON_DESCRIPTION: &str = r#"{
  "namespace": "Demo",
  "enums": [
    { "name": "Shade", "values": [ { "name": "dark", "value": "dark" } ] }
  ],
  "models": [
    {
      "name": "Lamp",
      "properties": [
        { "name": "shade", "type": { "kind": "enum", "ref": "Demo.Shade" }, "required": true },
        { "name": "watts", "type": { "kind": "nullable", "type": { "kind": "int32" } } }
      ]
    }
  ]
}"#;

#[test]
fn test_load_yaml_fixture() {
    let desc = load_description(&fixture_path("storage.yaml")).unwrap();
    assert_eq!(desc.namespace, "Contoso.Storage");
    let info = desc.crate_info.as_ref().unwrap();
    assert_eq!(info.name.as_deref(), Some("contoso_storage"));
    assert_eq!(info.version.as_deref(), Some("1.2.0"));
    assert_eq!(desc.enums.len(), 2);
    assert_eq!(desc.clients.len(), 2);
    assert!(!desc.clients[1].constructable);
}

#[test]
fn test_fixture_resolves_namespaces() {
    let graph = load_source_graph(&fixture_path("storage.yaml")).unwrap();
    let blob_client = graph
        .clients
        .iter()
        .find(|c| c.name == "BlobClient")
        .unwrap();
    assert_eq!(blob_client.namespace, vec!["Blobs".to_string()]);
    let container = graph.models.iter().find(|m| m.name == "Container").unwrap();
    assert!(container.namespace.is_empty());
}

#[test]
fn test_load_json_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_description(dir.path(), "lamps.json", JSON_DESCRIPTION);
    let graph = load_source_graph(&path).unwrap();
    assert_eq!(graph.enums.len(), 1);
    let lamp = &graph.models[0];
    assert!(matches!(lamp.properties[0].ty, SourceType::Enum(_)));
    assert!(matches!(lamp.properties[1].ty, SourceType::Nullable(_)));
}

#[test]
fn test_type_ref_tags() {
    let desc = parse_description(JSON_DESCRIPTION, false).unwrap();
    assert_eq!(
        desc.models[0].properties[0].ty,
        TypeRef::Enum {
            target: "Demo.Shade".to_string()
        }
    );
}

#[test]
fn test_unknown_fields_are_rejected() {
    let err = parse_description("namespace: Demo\nschemas: []\n", true).unwrap_err();
    assert!(format!("{:#}", err).contains("schemas"));
}

#[test]
fn test_unknown_reference_is_reported() {
    let desc = parse_description(
        r#"
namespace: Demo
models:
  - name: Lamp
    properties:
      - name: bulb
        type: { kind: model, ref: Demo.Bulb }
"#,
        true,
    )
    .unwrap();
    let err = SourceGraph::from_description(&desc).unwrap_err();
    assert!(matches!(
        err,
        DescriptionError::UnknownReference { ref target, .. } if target == "Demo.Bulb"
    ));
}

#[test]
fn test_duplicate_ids_are_reported() {
    let desc = parse_description(
        r#"
namespace: Demo
models:
  - name: Lamp
  - name: Lamp
"#,
        true,
    )
    .unwrap();
    let err = SourceGraph::from_description(&desc).unwrap_err();
    assert!(matches!(err, DescriptionError::DuplicateId { kind: "model", .. }));
}

#[test]
fn test_pageable_without_paging_is_reported() {
    let desc = parse_description(
        r#"
namespace: Demo
clients:
  - name: LampClient
    methods:
      - name: listLamps
        kind: pageable
        http: { method: GET, path: /lamps }
"#,
        true,
    )
    .unwrap();
    let err = SourceGraph::from_description(&desc).unwrap_err();
    assert!(matches!(err, DescriptionError::MissingPaging { .. }));
}

#[test]
fn test_missing_file_has_context() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_source_graph(&dir.path().join("missing.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read service description"));
}
