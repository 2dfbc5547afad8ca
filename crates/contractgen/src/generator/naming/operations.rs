use crate::generator::naming::identifiers::to_field_name;

/// The identifier an operation is known by before collision handling: its
/// `operationId` when present, otherwise one derived from method and path.
pub fn compute_stable_id<S>(method: S, path: S, operation_id: Option<S>) -> String
where
  S: AsRef<str>,
{
  to_field_name(&operation_id.map_or_else(|| generate_operation_id(method, path), |s| s.as_ref().to_string()))
}

/// `GET /pets/{petId}/toys` becomes `get_pets_by_pet_id_toys`.
pub(crate) fn generate_operation_id<S>(method: S, path: S) -> String
where
  S: AsRef<str>,
{
  let path_parts = path
    .as_ref()
    .split('/')
    .filter(|s| !s.is_empty())
    .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
      Some(param) => format!("by_{}", to_field_name(param)),
      None => s.to_string(),
    })
    .collect::<Vec<_>>();

  if path_parts.is_empty() {
    method.as_ref().to_lowercase()
  } else {
    format!("{}_{}", method.as_ref(), path_parts.join("_")).to_lowercase()
  }
}
