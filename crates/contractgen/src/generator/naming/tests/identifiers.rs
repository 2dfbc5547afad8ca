use std::collections::BTreeSet;

use crate::generator::naming::identifiers::{ensure_unique, sanitize, to_field_name, to_type_name};

#[test]
fn test_field_names() {
  let cases = [
    ("foo-bar", "foo_bar"),
    ("theParameter", "the_parameter"),
    ("petId", "pet_id"),
    ("123name", "_123name"),
    ("", "_"),
    ("  ", "_"),
    ("-created-date", "negative_created_date"),
    ("-id", "negative_id"),
    ("-", "_"),
  ];
  for (input, expected) in cases {
    assert_eq!(to_field_name(input), expected, "failed for input {input:?}");
  }
}

#[test]
fn test_type_names() {
  let cases = [
    ("oAuth", "OAuth"),
    ("-INF", "NegativeInf"),
    ("123Response", "T123Response"),
    ("", "Unnamed"),
    ("  ", "Unnamed"),
    ("XMLHttpRequest", "XMLHttpRequest"),
    ("pet_store", "PetStore"),
    ("NOT_FORCED", "NotForced"),
    ("application/json", "ApplicationJson"),
    ("Pet", "Pet"),
  ];
  for (input, expected) in cases {
    assert_eq!(to_type_name(input), expected, "failed for input {input:?}");
  }
}

#[test]
fn test_sanitize() {
  let cases = [
    ("café", "cafe"),
    ("a--b", "a_b"),
    ("__x__", "x"),
    ("", ""),
  ];
  for (input, expected) in cases {
    assert_eq!(sanitize(input), expected, "failed for input {input:?}");
  }
}

#[test]
fn test_ensure_unique() {
  let used: BTreeSet<String> = ["Pet", "Pet2", "x"].into_iter().map(String::from).collect();
  let cases = [
    ("Owner", "", "Owner"),
    ("Pet", "", "Pet3"),
    ("x", "_", "x_2"),
  ];
  for (base, separator, expected) in cases {
    assert_eq!(
      ensure_unique(base, separator, &used).as_deref(),
      Some(expected),
      "failed for base {base:?}"
    );
  }
}
