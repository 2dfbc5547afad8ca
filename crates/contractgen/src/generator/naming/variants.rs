use std::collections::BTreeSet;

use serde_json::Value;

use crate::generator::naming::identifiers::{ensure_unique, to_type_name};

/// Identifier for one enum literal.
///
/// Strings are case-normalized, numbers become `Value{n}` (`ValueMinus{n}` when
/// negative, with `.` replaced by `_`), booleans `True`/`False`. Other literals
/// fall back to their position.
pub fn literal_identifier(value: &Value, index: usize) -> String {
  match value {
    Value::String(text) => to_type_name(text),
    Value::Number(number) => {
      let text = number.to_string();
      match text.strip_prefix('-') {
        Some(magnitude) => format!("ValueMinus{}", magnitude.replace(['.', '+', '-'], "_")),
        None => format!("Value{}", text.replace(['.', '+', '-'], "_")),
      }
    }
    Value::Bool(true) => "True".to_string(),
    Value::Bool(false) => "False".to_string(),
    Value::Null | Value::Array(_) | Value::Object(_) => format!("Value{index}"),
  }
}

/// Identifiers for a whole literal set, in order.
///
/// A literal whose identifier is already taken by an earlier literal gets its own
/// index appended, so the first occurrence keeps the bare name.
pub fn literal_identifiers(values: &[Value]) -> Vec<String> {
  let mut used = BTreeSet::new();
  values
    .iter()
    .enumerate()
    .map(|(index, value)| {
      let base = literal_identifier(value, index);
      let candidate = if used.contains(&base) {
        format!("{base}{index}")
      } else {
        base
      };
      let ident = ensure_unique(&candidate, "_", &used).unwrap_or_else(|| format!("{candidate}_{index}"));
      used.insert(ident.clone());
      ident
    })
    .collect()
}
