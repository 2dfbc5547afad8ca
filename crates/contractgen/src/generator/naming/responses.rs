use http::StatusCode;

use crate::generator::naming::identifiers::to_type_name;

pub const DEFAULT_RESPONSE_VARIANT: &str = "Default";

/// Variant name for a concrete status code, from its canonical reason phrase.
///
/// Codes without a registered reason become `Status{code}`.
pub fn status_code_variant_name(code: u16) -> String {
  StatusCode::from_u16(code)
    .ok()
    .and_then(|status| status.canonical_reason())
    .map_or_else(|| format!("Status{code}"), to_type_name)
}

/// Variant name for an `NXX` status range.
pub fn status_range_variant_name(class: u8) -> String {
  match class {
    1 => "Informational".to_string(),
    2 => "Success".to_string(),
    3 => "Redirection".to_string(),
    4 => "ClientError".to_string(),
    5 => "ServerError".to_string(),
    other => format!("Status{other}XX"),
  }
}
