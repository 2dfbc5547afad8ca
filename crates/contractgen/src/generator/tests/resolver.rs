use serde_json::json;

use super::{named, resolve_document, with_schemas};
use crate::{
  generator::{
    diagnostics::Diagnostics,
    errors::SpecError,
    resolver::resolve,
    schema_graph::{PrimitiveKind, SchemaKind},
  },
  utils::spec::DocumentSet,
};

#[test]
fn test_self_reference_points_back_at_its_own_node() {
  let (resolved, diagnostics) = resolve_document(with_schemas(json!({
    "Node": {
      "type": "object",
      "properties": {
        "next": { "$ref": "#/components/schemas/Node" },
        "children": { "type": "array", "items": { "$ref": "#/components/schemas/Node" } },
      },
    },
  })));

  assert!(!diagnostics.has_errors());
  let graph = &resolved.graph;
  let node_id = named(&resolved, graph, "Node");
  let node = graph.node(node_id);
  assert_eq!(node.properties["next"], node_id);

  let children = graph.node(node.properties["children"]);
  assert_eq!(children.kind, SchemaKind::Array { items: Some(node_id) });
  assert_eq!(graph.detect_cycles(), [vec![node_id, node.properties["children"]]]);
}

#[test]
fn test_references_share_one_node() {
  let (resolved, _) = resolve_document(with_schemas(json!({
    "Pet": { "type": "object", "properties": { "name": { "type": "string" } } },
    "Owner": {
      "type": "object",
      "properties": {
        "first": { "$ref": "#/components/schemas/Pet" },
        "second": { "$ref": "#/components/schemas/Pet" },
      },
    },
  })));

  let graph = &resolved.graph;
  let pet = named(&resolved, graph, "Pet");
  let owner = graph.node(named(&resolved, graph, "Owner"));
  assert_eq!(owner.properties["first"], pet);
  assert_eq!(owner.properties["second"], pet);
  assert!(graph.detect_cycles().is_empty());
}

#[test]
fn test_unresolved_reference_halts() {
  let documents = DocumentSet::new(
    "api.json",
    with_schemas(json!({
      "Pet": {
        "type": "object",
        "properties": { "owner": { "$ref": "#/components/schemas/Missing" } },
      },
    })),
  );
  let mut diagnostics = Diagnostics::new();

  let err = resolve(&documents, &mut diagnostics).unwrap_err();
  assert_eq!(
    err,
    SpecError::UnresolvedReference {
      reference: "#/components/schemas/Missing".to_string(),
      declared_at: "api.json#/components/schemas/Pet/properties/owner".into(),
      cause: None,
    }
  );
}

#[test]
fn test_circular_alias_halts() {
  let documents = DocumentSet::new(
    "api.json",
    with_schemas(json!({
      "A": { "$ref": "#/components/schemas/B" },
      "B": { "$ref": "#/components/schemas/A" },
    })),
  );
  let mut diagnostics = Diagnostics::new();

  let err = resolve(&documents, &mut diagnostics).unwrap_err();
  assert!(matches!(err, SpecError::CircularAlias { .. }), "got {err}");
}

#[test]
fn test_external_documents() {
  let mut documents = DocumentSet::new(
    "api.json",
    with_schemas(json!({
      "Problem": { "$ref": "common.json#/Error" },
      "Gone": {
        "type": "object",
        "properties": { "detail": { "$ref": "missing.json#/Detail" } },
      },
    })),
  );
  documents.insert(
    "common.json",
    json!({
      "Error": {
        "type": "object",
        "properties": { "code": { "$ref": "#/Code" } },
      },
      "Code": { "type": "integer", "format": "int32" },
    }),
  );
  documents.mark_unavailable("missing.json", "opening missing.json: No such file or directory");
  let mut diagnostics = Diagnostics::new();

  let err = resolve(&documents, &mut diagnostics).unwrap_err();
  assert_eq!(
    err,
    SpecError::UnresolvedReference {
      reference: "missing.json#/Detail".to_string(),
      declared_at: "api.json#/components/schemas/Gone/properties/detail".into(),
      cause: Some("document 'missing.json' could not be loaded: opening missing.json: No such file or directory".to_string()),
    }
  );
  assert!(err.to_string().ends_with("could not be loaded: opening missing.json: No such file or directory"));

  documents = DocumentSet::new("api.json", with_schemas(json!({ "Problem": { "$ref": "common.json#/Error" } })));
  documents.insert(
    "common.json",
    json!({
      "Error": { "type": "object", "properties": { "code": { "$ref": "#/Code" } } },
      "Code": { "type": "integer", "format": "int32" },
    }),
  );
  let resolved = resolve(&documents, &mut diagnostics).unwrap();
  let graph = &resolved.graph;
  let error = graph.node(resolved.named[0]);
  assert_eq!(error.name.as_deref(), Some("Error"));
  assert_eq!(error.location.as_str(), "common.json#/Error");

  let code = graph.node(error.properties["code"]);
  assert_eq!(code.name.as_deref(), Some("Code"));
  assert_eq!(code.kind, SchemaKind::Primitive(PrimitiveKind::Integer));
  assert_eq!(code.format.as_deref(), Some("int32"));
}

#[test]
fn test_schema_keywords() {
  let (resolved, diagnostics) = resolve_document(with_schemas(json!({
    "Legacy": { "type": "integer", "minimum": 1, "exclusiveMinimum": true, "maximum": 9 },
    "Modern": { "type": "number", "exclusiveMinimum": 5 },
    "Maybe": { "type": ["string", "null"] },
    "Anything": false,
    "Constant": { "const": "fixed" },
  })));

  let graph = &resolved.graph;
  let legacy = graph.node(named(&resolved, graph, "Legacy"));
  assert_eq!(legacy.constraints.minimum, None);
  assert_eq!(legacy.constraints.exclusive_minimum, Some(1.into()));
  assert_eq!(legacy.constraints.maximum, Some(9.into()));

  let modern = graph.node(named(&resolved, graph, "Modern"));
  assert_eq!(modern.constraints.exclusive_minimum, Some(5.into()));

  let maybe = graph.node(named(&resolved, graph, "Maybe"));
  assert!(maybe.nullable);
  assert_eq!(maybe.kind, SchemaKind::Primitive(PrimitiveKind::String));

  let anything = graph.node(named(&resolved, graph, "Anything"));
  assert_eq!(anything.kind, SchemaKind::Primitive(PrimitiveKind::Any));
  assert_eq!(diagnostics.warnings().count(), 1);

  let constant = graph.node(named(&resolved, graph, "Constant"));
  assert!(matches!(&constant.kind, SchemaKind::Enum { literals } if literals.len() == 1));
}

#[test]
fn test_invalid_fragment_is_skipped() {
  let (resolved, diagnostics) = resolve_document(with_schemas(json!({
    "Broken": { "type": 5 },
    "Fine": { "type": "string" },
  })));

  assert_eq!(resolved.named.len(), 1);
  assert_eq!(diagnostics.errors().count(), 1);
  let error = diagnostics.errors().next().unwrap();
  assert_eq!(error.source_path.as_str(), "api.json#/components/schemas/Broken");
}

#[test]
fn test_operations_resolve_component_references() {
  let (resolved, diagnostics) = resolve_document(json!({
    "openapi": "3.0.3",
    "info": { "title": "Pets", "version": "2" },
    "paths": {
      "/pets/{petId}": {
        "parameters": [{ "$ref": "#/components/parameters/PetId" }],
        "get": {
          "operationId": "showPet",
          "tags": ["pets"],
          "responses": { "404": { "$ref": "#/components/responses/NotFound" } },
        },
        "delete": { "responses": { "204": { "description": "deleted" } } },
      },
    },
    "components": {
      "parameters": {
        "PetId": { "name": "petId", "in": "path", "required": true, "schema": { "type": "string" } },
      },
      "responses": {
        "NotFound": {
          "description": "missing",
          "content": { "application/json": { "schema": { "type": "object" } } },
        },
      },
    },
  }));

  assert!(!diagnostics.has_errors());
  assert_eq!(resolved.info.title, "Pets");

  let summary: Vec<(String, &str, usize)> = resolved
    .operations
    .iter()
    .map(|op| (op.method.to_string(), op.path.as_str(), op.parameters.len()))
    .collect();
  assert_eq!(
    summary,
    [("GET".to_string(), "/pets/{petId}", 1), ("DELETE".to_string(), "/pets/{petId}", 1)]
  );

  let show = &resolved.operations[0];
  assert_eq!(show.parameters[0].name, "petId");
  assert_eq!(show.responses[0].description.as_deref(), Some("missing"));
  assert_eq!(show.source.as_str(), "api.json#/paths/~1pets~1{petId}/get");
}
