use std::collections::BTreeSet;

use serde_json::json;

use super::build_types;
use crate::generator::{config::UnionOverlapPolicy, types::RuntimeSupport};

#[test]
fn test_runtime_needs_propagate_through_references() {
  let (types, _) = build_types(
    json!({
      "components": {
        "schemas": {
          "Event": {
            "type": "object",
            "properties": { "at": { "type": "string", "format": "date-time" } },
          },
          "Log": {
            "type": "object",
            "properties": { "events": { "type": "array", "items": { "$ref": "#/components/schemas/Event" } } },
          },
          "Page": {
            "type": "object",
            "properties": {
              "size": { "type": "integer", "minimum": 1, "maximum": 100 },
              "log": { "$ref": "#/components/schemas/Log" },
            },
          },
          "Plain": { "type": "object", "properties": { "name": { "type": "string" } } },
        },
      },
    }),
    UnionOverlapPolicy::default(),
  );

  let cases = [
    ("Event", BTreeSet::from([RuntimeSupport::DateTimeCodec])),
    ("Log", BTreeSet::from([RuntimeSupport::DateTimeCodec])),
    (
      "Page",
      BTreeSet::from([RuntimeSupport::DateTimeCodec, RuntimeSupport::ValidationFailure]),
    ),
    ("Plain", BTreeSet::new()),
  ];
  for (name, expected) in cases {
    assert_eq!(types.by_name(name).unwrap().runtime, expected, "failed for type {name}");
  }
}

#[test]
fn test_field_constraints_stay_on_the_field() {
  let (types, _) = build_types(
    json!({
      "components": {
        "schemas": {
          "Size": { "type": "integer", "minimum": 0 },
          "Box": {
            "type": "object",
            "properties": {
              "width": { "$ref": "#/components/schemas/Size" },
              "label": { "type": "string", "maxLength": 20 },
            },
          },
        },
      },
    }),
    UnionOverlapPolicy::default(),
  );

  let fields = types.by_name("Box").unwrap().fields();
  assert!(fields[0].constraints.is_empty());
  assert_eq!(fields[1].constraints.max_length, Some(20));
  assert!(types.by_name("Size").unwrap().runtime.contains(&RuntimeSupport::ValidationFailure));
}
