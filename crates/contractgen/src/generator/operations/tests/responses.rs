use serde_json::json;

use super::build_operations;
use crate::generator::{
  config::GenerationTarget,
  operations::{ContentCategory, StatusCode},
};

#[test]
fn test_one_variant_per_status_and_content_type() {
  let built = build_operations(
    json!({
      "/pets/{petId}": {
        "get": {
          "operationId": "showPet",
          "parameters": [{ "name": "petId", "in": "path", "required": true, "schema": { "type": "string" } }],
          "responses": {
            "200": {
              "description": "the pet",
              "headers": { "X-Rate-Limit": { "schema": { "type": "integer" } } },
              "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } },
                "application/xml": { "schema": { "$ref": "#/components/schemas/Pet" } },
              },
            },
            "404": { "description": "not found" },
            "default": {
              "description": "error",
              "content": {
                "application/json": {
                  "schema": { "type": "object", "properties": { "message": { "type": "string" } } },
                },
              },
            },
          },
        },
      },
    }),
    GenerationTarget::Client,
  );

  assert!(!built.diagnostics.has_errors());
  let operation = built.operations.get("show_pet").unwrap();
  let summary: Vec<(&str, StatusCode, Option<&str>, Option<ContentCategory>, Option<String>, bool)> = operation
    .response_variants
    .iter()
    .map(|v| {
      (
        v.ident.as_str(),
        v.status,
        v.content_type.as_deref(),
        v.category,
        v.ty.as_ref().map(ToString::to_string),
        v.has_no_content,
      )
    })
    .collect();
  assert_eq!(
    summary,
    [
      (
        "Ok",
        StatusCode::Code(200),
        Some("application/json"),
        Some(ContentCategory::Json),
        Some("Pet".to_string()),
        false,
      ),
      (
        "OkXml",
        StatusCode::Code(200),
        Some("application/xml"),
        Some(ContentCategory::Xml),
        Some("Pet".to_string()),
        false,
      ),
      ("NotFound", StatusCode::Code(404), None, None, None, true),
      (
        "Default",
        StatusCode::Default,
        Some("application/json"),
        Some(ContentCategory::Json),
        Some("ShowPetDefaultResponse".to_string()),
        false,
      ),
    ]
  );

  let headers = &operation.response_variants[0].headers;
  assert_eq!(headers.len(), 1);
  assert_eq!(headers[0].ident, "x_rate_limit");
  assert_eq!(headers[0].ty.to_string(), "integer");
}

#[test]
fn test_duplicate_response_variant_skips_operation() {
  let built = build_operations(
    json!({
      "/pets": {
        "get": {
          "responses": {
            "200": {
              "description": "ok",
              "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } },
                "application/json; charset=utf-8": { "schema": { "$ref": "#/components/schemas/Pet" } },
              },
            },
          },
        },
      },
    }),
    GenerationTarget::Client,
  );

  assert!(built.operations.is_empty());
  let errors: Vec<String> = built.diagnostics.errors().map(|d| d.message.clone()).collect();
  assert_eq!(
    errors,
    ["operation 'get_pets' declares response (200, application/json) more than once"]
  );
}

#[test]
fn test_invalid_status_key_is_reported() {
  let built = build_operations(
    json!({
      "/pets": {
        "get": { "responses": { "ok": { "description": "ok" } } },
      },
    }),
    GenerationTarget::Client,
  );

  assert!(built.operations.is_empty());
  assert_eq!(built.diagnostics.errors().count(), 1);
}
