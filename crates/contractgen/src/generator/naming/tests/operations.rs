use crate::generator::naming::operations::{compute_stable_id, generate_operation_id};

#[test]
fn test_generate_operation_id() {
  let cases = [
    ("GET", "/pets", "get_pets"),
    ("GET", "/pets/{petId}/toys", "get_pets_by_pet_id_toys"),
    ("delete", "/pets/{id}", "delete_pets_by_id"),
    ("GET", "/", "get"),
  ];
  for (method, path, expected) in cases {
    assert_eq!(generate_operation_id(method, path), expected, "failed for {method} {path}");
  }
}

#[test]
fn test_compute_stable_id_prefers_operation_id() {
  assert_eq!(compute_stable_id("GET", "/pets", Some("listPets")), "list_pets");
  assert_eq!(compute_stable_id("POST", "/pets", None), "post_pets");
}
