use std::collections::HashSet;

use serde_json::{Value, json};

use super::orchestrator;
use crate::generator::{
  config::{GenerationTarget, GeneratorConfig, OperationFilter, SchemaScope},
  diagnostics::Stage,
  render::{JsonIrRenderer, Renderer, YamlIrRenderer},
};

fn petstore() -> Value {
  json!({
    "openapi": "3.1.0",
    "info": { "title": "Petstore", "version": "1.0.0" },
    "paths": {
      "/pets": {
        "get": {
          "operationId": "listPets",
          "parameters": [{ "name": "limit", "in": "query", "schema": { "type": "integer", "maximum": 100 } }],
          "responses": {
            "200": {
              "description": "pets",
              "content": {
                "application/json": { "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Pet" } } },
              },
            },
          },
        },
        "post": {
          "operationId": "createPet",
          "requestBody": {
            "required": true,
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/NewPet" } } },
          },
          "responses": { "201": { "description": "created" } },
        },
      },
      "/pets/{petId}": {
        "get": {
          "parameters": [{ "name": "petId", "in": "path", "schema": { "type": "string" } }],
          "responses": {
            "200": {
              "description": "pet",
              "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } },
            },
          },
        },
      },
    },
    "components": {
      "schemas": {
        "Pet": {
          "type": "object",
          "required": ["id", "name"],
          "properties": {
            "id": { "type": "integer", "format": "int64" },
            "name": { "type": "string" },
            "owner": { "$ref": "#/components/schemas/Owner" },
          },
        },
        "Owner": {
          "type": "object",
          "properties": { "pets": { "type": "array", "items": { "$ref": "#/components/schemas/Pet" } } },
        },
        "NewPet": { "type": "object", "properties": { "name": { "type": "string" } } },
        "Unused": { "type": "object", "properties": { "note": { "type": "string" } } },
      },
    },
  })
}

fn type_names(config: GeneratorConfig) -> Vec<String> {
  let output = orchestrator(petstore(), config).generate().unwrap();
  output.ir.types().iter().map(|decl| decl.qualified_name.clone()).collect()
}

fn operation_names(config: GeneratorConfig) -> Vec<String> {
  let output = orchestrator(petstore(), config).generate().unwrap();
  output.ir.operations().iter().map(|op| op.name.clone()).collect()
}

#[test]
fn test_generation_is_deterministic() {
  let first = orchestrator(petstore(), GeneratorConfig::default()).generate().unwrap();
  let second = orchestrator(petstore(), GeneratorConfig::default()).generate().unwrap();

  assert_eq!(first.ir, second.ir);
  assert_eq!(first.ir.fingerprint().unwrap(), second.ir.fingerprint().unwrap());
  assert_eq!(first.ir.fingerprint().unwrap().len(), 64);
}

#[test]
fn test_fingerprint_tracks_the_document() {
  let mut changed = petstore();
  changed["info"]["version"] = json!("1.0.1");

  let original = orchestrator(petstore(), GeneratorConfig::default()).generate().unwrap();
  let changed = orchestrator(changed, GeneratorConfig::default()).generate().unwrap();
  assert_ne!(original.ir.fingerprint().unwrap(), changed.ir.fingerprint().unwrap());
}

#[test]
fn test_schema_scope() {
  let all = type_names(GeneratorConfig::default());
  assert_eq!(all, ["Pet", "Owner", "NewPet", "Unused"]);

  let referenced = type_names(GeneratorConfig::builder().schema_scope(SchemaScope::ReferencedOnly).build());
  assert_eq!(referenced, ["Pet", "Owner", "NewPet"]);
}

#[test]
fn test_component_schemas_claim_names_before_operations() {
  let document = json!({
    "openapi": "3.1.0",
    "info": { "title": "Petstore", "version": "1.0.0" },
    "paths": {
      "/pets": {
        "post": {
          "operationId": "createPet",
          "requestBody": {
            "content": {
              "application/json": {
                "schema": { "type": "object", "properties": { "name": { "type": "string" } } },
              },
            },
          },
          "responses": { "204": { "description": "Created." } },
        },
      },
    },
    "components": {
      "schemas": {
        "CreatePet": {
          "type": "object",
          "properties": {
            "requestBody": { "type": "object", "properties": { "raw": { "type": "string" } } },
          },
        },
      },
    },
  });

  let output = orchestrator(document, GeneratorConfig::default()).generate().unwrap();
  let types = output.ir.types();
  assert_eq!(
    types.by_name("CreatePetRequestBody").unwrap().source_schema_path.as_str(),
    "api.json#/components/schemas/CreatePet/properties/requestBody"
  );

  let operation = output.ir.operations().iter().next().unwrap();
  let body = operation.request_body_variants[0].ty.as_ref().unwrap();
  assert_eq!(body.to_string(), "CreatePetRequestBody2");
}

#[test]
fn test_operation_filter() {
  let cases = [
    (OperationFilter::default(), vec!["list_pets", "create_pet", "get_pets_by_pet_id"]),
    (
      OperationFilter::new(Some(HashSet::from(["list_pets".to_string()])), None),
      vec!["list_pets"],
    ),
    (
      OperationFilter::new(None, Some(HashSet::from(["list_pets".to_string()]))),
      vec!["create_pet", "get_pets_by_pet_id"],
    ),
    (
      OperationFilter::new(
        Some(HashSet::from(["list_pets".to_string()])),
        Some(HashSet::from(["list_pets".to_string()])),
      ),
      vec![],
    ),
  ];
  for (filter, expected) in cases {
    let names = operation_names(GeneratorConfig::builder().filter(filter.clone()).build());
    assert_eq!(names, expected, "failed for filter {filter:?}");
  }
}

#[test]
fn test_operation_summaries_ignore_the_filter() {
  let config = GeneratorConfig::builder()
    .filter(OperationFilter::new(Some(HashSet::new()), None))
    .build();
  let summaries = orchestrator(petstore(), config).operation_summaries().unwrap();

  let ids: Vec<(&str, &str, &str)> = summaries
    .iter()
    .map(|s| (s.stable_id.as_str(), s.method.as_str(), s.path.as_str()))
    .collect();
  assert_eq!(
    ids,
    [
      ("list_pets", "GET", "/pets"),
      ("create_pet", "POST", "/pets"),
      ("get_pets_by_pet_id", "GET", "/pets/{petId}"),
    ]
  );
}

#[test]
fn test_stats_and_warnings() {
  let output = orchestrator(petstore(), GeneratorConfig::default()).generate().unwrap();

  assert_eq!(output.stats.types_generated, 4);
  assert_eq!(output.stats.objects_generated, 4);
  assert_eq!(output.stats.operations_converted, 3);
  assert_eq!(output.stats.parameters_converted, 2);
  assert_eq!(output.stats.request_body_variants, 1);
  assert_eq!(output.stats.response_variants, 3);
  assert_eq!(output.stats.back_references, 1);
  assert_eq!(output.stats.cycles_detected, 1);
  assert!(output.stats.cycle_details[0].contains(&"Pet".to_string()));
  assert!(output.stats.cycle_details[0].contains(&"Owner".to_string()));

  let warnings: Vec<&str> = output.warnings.iter().map(|w| w.message.as_str()).collect();
  assert_eq!(warnings, ["path parameter 'petId' is always required"]);
  assert_eq!(output.stats.warnings_recorded, 1);
  assert!(output.warnings.iter().all(|w| w.stage == Stage::OperationModel));
}

#[test]
fn test_failures_name_their_stage() {
  let mut unresolved = petstore();
  unresolved["components"]["schemas"]["Pet"]["properties"]["owner"] = json!({ "$ref": "#/components/schemas/Nobody" });

  let mut conflicting = petstore();
  conflicting["components"]["schemas"]["Unused"] = json!({
    "allOf": [
      { "properties": { "id": { "type": "string" } } },
      { "properties": { "id": { "type": "boolean" } } },
    ],
  });

  let mut rejected = petstore();
  rejected["components"]["schemas"]["Unused"] = json!({
    "oneOf": [{ "$ref": "#/components/schemas/Pet" }, { "type": "string" }],
    "discriminator": { "propertyName": "kind", "mapping": { "text": "#/components/schemas/Text" } },
  });
  rejected["components"]["schemas"]["Text"] = json!({ "type": "string" });

  let mut missing_parameter = petstore();
  missing_parameter["paths"]["/pets/{petId}"]["get"]["parameters"] = json!([]);

  let cases = [
    (unresolved, Stage::Resolve),
    (conflicting, Stage::Normalize),
    (rejected, Stage::Normalize),
    (missing_parameter, Stage::OperationModel),
  ];
  for (document, stage) in cases {
    let failure = orchestrator(document, GeneratorConfig::default()).generate().unwrap_err();
    assert_eq!(failure.stage, stage);
    assert_eq!(failure.errors().count(), 1, "failed for stage {stage}: {:?}", failure.diagnostics);
  }
}

#[test]
fn test_ir_json_and_renderers() {
  let config = GeneratorConfig::builder()
    .target(GenerationTarget::Server)
    .package("petstore".to_string())
    .build();
  let output = orchestrator(petstore(), config).generate().unwrap();
  let ir = output.ir.to_json().unwrap();

  assert_eq!(ir["info"]["title"], "Petstore");
  assert_eq!(ir["package"], "petstore");
  assert_eq!(ir["target"], "server");
  assert_eq!(ir["types"][0]["qualifiedName"], "Pet");
  assert_eq!(ir["types"][0]["shape"], "object");
  assert_eq!(ir["types"][0]["fields"][2]["backReference"], false);
  assert_eq!(ir["types"][1]["fields"][0]["backReference"], true);
  assert_eq!(ir["operations"][0]["name"], "list_pets");
  assert_eq!(ir["operations"][0]["responseVariants"][0]["status"], "200");
  assert_eq!(
    ir["operations"][0]["runtime"],
    json!([{ "kind": "responseWrapper", "binding": "server" }, { "kind": "validationFailure" }])
  );

  let json_files = JsonIrRenderer.render(&output.ir).unwrap();
  assert_eq!(json_files.len(), 1);
  assert_eq!(json_files[0].path.to_str(), Some("ir.json"));
  assert!(json_files[0].contents.ends_with('\n'));
  let parsed: Value = serde_json::from_str(&json_files[0].contents).unwrap();
  assert_eq!(parsed, ir);

  let yaml_files = YamlIrRenderer.render(&output.ir).unwrap();
  assert_eq!(yaml_files[0].path.to_str(), Some("ir.yaml"));
  assert!(yaml_files[0].contents.contains("qualifiedName: Pet"));
}
