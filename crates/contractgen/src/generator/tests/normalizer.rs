use serde_json::json;

use super::{named, resolve_document, with_schemas};
use crate::generator::{
  normalizer::normalize,
  schema_graph::{PrimitiveKind, SchemaKind},
};

#[test]
fn test_all_of_members_merge_into_one_object() {
  let (resolved, mut diagnostics) = resolve_document(with_schemas(json!({
    "Pet": {
      "type": "object",
      "required": ["name"],
      "properties": { "name": { "type": "string" }, "age": { "type": "integer" } },
    },
    "Dog": {
      "allOf": [
        { "$ref": "#/components/schemas/Pet" },
        { "type": "object", "required": ["bark"], "properties": { "bark": { "type": "boolean" } } },
      ],
      "properties": { "age": { "type": "integer" } },
    },
  })));
  let graph = normalize(&resolved.graph, &mut diagnostics);

  assert!(!diagnostics.has_errors());
  let dog = graph.node(named(&resolved, &graph, "Dog"));
  assert_eq!(dog.kind, SchemaKind::Object);
  assert_eq!(dog.properties.keys().collect::<Vec<_>>(), ["name", "age", "bark"]);
  assert_eq!(dog.required.iter().collect::<Vec<_>>(), ["name", "bark"]);
}

#[test]
fn test_all_of_conflict_is_reported() {
  let (resolved, mut diagnostics) = resolve_document(with_schemas(json!({
    "Mixed": {
      "allOf": [
        { "type": "object", "properties": { "id": { "type": "string" } } },
        { "type": "object", "properties": { "id": { "type": "integer" } } },
      ],
    },
  })));
  normalize(&resolved.graph, &mut diagnostics);

  let errors: Vec<String> = diagnostics.errors().map(|d| d.message.clone()).collect();
  assert_eq!(errors.len(), 1);
  assert!(
    errors[0].starts_with("allOf members disagree on property 'id'"),
    "unexpected message {}",
    errors[0]
  );
}

#[test]
fn test_all_of_rejects_unsupported_members() {
  let cases = [
    (
      json!({ "Tagged": { "allOf": [{ "type": "string" }, { "properties": { "tag": { "type": "string" } } }] } }),
      "unsupported schema shape: allOf member is not an object schema",
    ),
    (
      json!({
        "Loop": {
          "allOf": [
            { "$ref": "#/components/schemas/Loop" },
            { "properties": { "tag": { "type": "string" } } },
          ],
        },
      }),
      "unsupported schema shape: allOf composition includes itself",
    ),
  ];
  for (schemas, expected) in cases {
    let (resolved, mut diagnostics) = resolve_document(with_schemas(schemas));
    normalize(&resolved.graph, &mut diagnostics);
    let errors: Vec<String> = diagnostics.errors().map(|d| d.message.clone()).collect();
    assert_eq!(errors, [expected]);
  }
}

#[test]
fn test_null_union_members_become_nullability() {
  let (resolved, mut diagnostics) = resolve_document(with_schemas(json!({
    "Pet": { "type": "object", "properties": { "name": { "type": "string" } } },
    "MaybePet": { "oneOf": [{ "$ref": "#/components/schemas/Pet" }, { "type": "null" }] },
    "Nothing": { "anyOf": [{ "type": "null" }] },
  })));
  let graph = normalize(&resolved.graph, &mut diagnostics);

  let pet = named(&resolved, &graph, "Pet");
  let maybe = graph.node(named(&resolved, &graph, "MaybePet"));
  assert!(maybe.nullable);
  let SchemaKind::Union { members, .. } = &maybe.kind else {
    panic!("MaybePet should stay a union");
  };
  assert_eq!(members.len(), 1);
  assert_eq!(members[0].schema, pet);

  let nothing = graph.node(named(&resolved, &graph, "Nothing"));
  assert_eq!(nothing.kind, SchemaKind::Primitive(PrimitiveKind::Null));
}

#[test]
fn test_discriminator_tags() {
  let (resolved, mut diagnostics) = resolve_document(with_schemas(json!({
    "Circle": { "type": "object", "properties": { "kind": { "type": "string" } } },
    "Shape": {
      "oneOf": [
        { "$ref": "#/components/schemas/Circle" },
        { "type": "object", "properties": { "kind": { "enum": ["square"] } } },
      ],
      "discriminator": { "propertyName": "kind", "mapping": { "round": "#/components/schemas/Circle", "disc": "Circle" } },
    },
  })));
  let graph = normalize(&resolved.graph, &mut diagnostics);

  assert!(!diagnostics.has_errors());
  let shape = graph.node(named(&resolved, &graph, "Shape"));
  let SchemaKind::Union { members, .. } = &shape.kind else {
    panic!("Shape should be a union");
  };
  let tags: Vec<Vec<String>> = members.iter().map(|member| member.tags.clone()).collect();
  assert_eq!(
    tags,
    [
      vec!["round".to_string(), "disc".to_string()],
      vec!["square".to_string()],
    ]
  );
}

#[test]
fn test_untaggable_member_is_reported() {
  let (resolved, mut diagnostics) = resolve_document(with_schemas(json!({
    "Shape": {
      "oneOf": [{ "type": "object", "properties": { "kind": { "type": "string" } } }],
      "discriminator": { "propertyName": "kind" },
    },
  })));
  normalize(&resolved.graph, &mut diagnostics);

  let errors: Vec<String> = diagnostics.errors().map(|d| d.message.clone()).collect();
  assert_eq!(
    errors,
    ["unsupported schema shape: union member has no value for discriminator 'kind'"]
  );
}

#[test]
fn test_stray_discriminator_is_dropped() {
  let (resolved, mut diagnostics) = resolve_document(with_schemas(json!({
    "Pet": {
      "type": "object",
      "properties": { "kind": { "type": "string" } },
      "discriminator": { "propertyName": "kind" },
    },
  })));
  let graph = normalize(&resolved.graph, &mut diagnostics);

  assert_eq!(diagnostics.warnings().count(), 1);
  assert!(graph.node(named(&resolved, &graph, "Pet")).discriminator.is_none());
}

#[test]
fn test_normalization_is_idempotent() {
  let (resolved, mut diagnostics) = resolve_document(with_schemas(json!({
    "Pet": { "type": "object", "properties": { "kind": { "type": "string" } } },
    "Dog": { "allOf": [{ "$ref": "#/components/schemas/Pet" }] },
    "Cat": {
      "allOf": [
        { "$ref": "#/components/schemas/Pet" },
        { "type": "object", "properties": { "lives": { "type": "integer" } } },
      ],
    },
    "Animal": {
      "oneOf": [{ "$ref": "#/components/schemas/Dog" }, { "$ref": "#/components/schemas/Cat" }, { "type": "null" }],
      "discriminator": { "propertyName": "kind" },
    },
    "Color": { "enum": ["red", "Red", 3] },
  })));

  let once = normalize(&resolved.graph, &mut diagnostics);
  let twice = normalize(&once, &mut diagnostics);

  assert!(!diagnostics.has_errors());
  assert_eq!(once, twice);

  let color = once.node(named(&resolved, &once, "Color"));
  let SchemaKind::Enum { literals } = &color.kind else {
    panic!("Color should be an enum");
  };
  let idents: Vec<Option<&str>> = literals.iter().map(|literal| literal.ident.as_deref()).collect();
  assert_eq!(idents, [Some("Red"), Some("Red1"), Some("Value3")]);
}
