use serde_json::json;

use super::build_operations;
use crate::generator::{config::GenerationTarget, operations::ContentCategory};

#[test]
fn test_form_fields_follow_declaration_order() {
  let built = build_operations(
    json!({
      "/pets": {
        "post": {
          "operationId": "createPet",
          "requestBody": {
            "required": true,
            "content": {
              "multipart/form-data": {
                "schema": {
                  "type": "object",
                  "required": ["name"],
                  "properties": {
                    "name": { "type": "string" },
                    "age": { "type": "integer" },
                    "photo": { "type": "string", "format": "binary" },
                  },
                },
                "encoding": { "photo": { "contentType": "image/png" } },
              },
            },
          },
          "responses": { "201": { "description": "created" } },
        },
      },
    }),
    GenerationTarget::Server,
  );

  assert!(!built.diagnostics.has_errors());
  let operation = built.operations.get("create_pet").unwrap();
  let [body] = operation.request_body_variants.as_slice() else {
    panic!("expected one request body variant");
  };
  assert_eq!(body.category, ContentCategory::Multipart);
  assert!(body.required);
  assert_eq!(body.ty.as_ref().map(ToString::to_string).as_deref(), Some("CreatePetRequestBody"));

  let fields: Vec<(&str, bool, Option<&str>)> = body
    .form_fields
    .iter()
    .map(|f| (f.name.as_str(), f.required, f.content_type.as_deref()))
    .collect();
  assert_eq!(
    fields,
    [("name", true, None), ("age", false, None), ("photo", false, Some("image/png"))]
  );
  assert!(built.types.by_name("CreatePetRequestBody").is_some());
}

#[test]
fn test_several_inline_bodies_are_named_by_category() {
  let built = build_operations(
    json!({
      "/pets": {
        "post": {
          "operationId": "createPet",
          "requestBody": {
            "content": {
              "application/json": {
                "schema": { "type": "object", "properties": { "name": { "type": "string" } } },
              },
              "application/x-www-form-urlencoded": {
                "schema": { "type": "object", "properties": { "name": { "type": "string" } } },
              },
              "application/json; charset=utf-8": {
                "schema": { "$ref": "#/components/schemas/Pet" },
              },
            },
          },
          "responses": { "201": { "description": "created" } },
        },
      },
    }),
    GenerationTarget::Client,
  );

  assert!(!built.diagnostics.has_errors());
  assert_eq!(built.diagnostics.warnings().count(), 1);

  let operation = built.operations.get("create_pet").unwrap();
  let bodies: Vec<(&str, String)> = operation
    .request_body_variants
    .iter()
    .map(|body| (body.content_type.as_str(), body.ty.as_ref().unwrap().to_string()))
    .collect();
  assert_eq!(
    bodies,
    [
      ("application/json", "CreatePetRequestBodyJson".to_string()),
      ("application/x-www-form-urlencoded", "CreatePetRequestBodyForm".to_string()),
    ]
  );
}
