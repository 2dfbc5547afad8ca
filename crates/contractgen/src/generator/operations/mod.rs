//! Operation declarations: parameters, request body variants, and response
//! variants bound to the type table.

mod builder;
pub mod path;

use std::{collections::BTreeSet, fmt};

use mediatype::MediaType;
use serde::{Serialize, Serializer};
use strum::Display;

pub use builder::OperationModelBuilder;
pub use path::{PathParseError, PathSegment, PathTemplate};

use crate::generator::{
  diagnostics::SourcePath,
  document::RawParameterLocation,
  naming::responses::{DEFAULT_RESPONSE_VARIANT, status_code_variant_name, status_range_variant_name},
  schema_graph::Constraints,
  types::{RuntimeSupport, TypeRef, TypeTable},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
  Path,
  Query,
  Header,
  Cookie,
}

impl From<RawParameterLocation> for ParameterLocation {
  fn from(value: RawParameterLocation) -> Self {
    match value {
      RawParameterLocation::Path => Self::Path,
      RawParameterLocation::Query => Self::Query,
      RawParameterLocation::Header => Self::Header,
      RawParameterLocation::Cookie => Self::Cookie,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDecl {
  /// Name used on the wire; never altered by disambiguation.
  pub spec_name: String,
  pub ident: String,
  pub location: ParameterLocation,
  #[serde(rename = "type")]
  pub ty: TypeRef,
  pub required: bool,
  pub nullable: bool,
  pub deprecated: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub style: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub explode: Option<bool>,
  #[serde(skip_serializing_if = "Constraints::is_empty")]
  pub constraints: Constraints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "camelCase")]
pub enum ContentCategory {
  #[default]
  Json,
  FormUrlEncoded,
  Multipart,
  Text,
  Binary,
  Xml,
  EventStream,
}

impl ContentCategory {
  #[must_use]
  pub fn from_content_type(content_type: &str) -> Self {
    let Ok(media) = MediaType::parse(content_type) else {
      return Self::Json;
    };

    let suffix = media.suffix.as_ref().map(mediatype::Name::as_str);

    match (media.ty.as_str(), media.subty.as_str(), suffix) {
      ("multipart", _, _) => Self::Multipart,
      ("text", "event-stream", _) => Self::EventStream,
      ("text" | "application", "xml", _) | (_, _, Some("xml")) => Self::Xml,
      ("application", "x-www-form-urlencoded", _) => Self::FormUrlEncoded,
      ("application", "json", _) | (_, _, Some("json")) => Self::Json,
      ("image" | "audio" | "video", _, _) | ("application", "pdf" | "octet-stream", _) => Self::Binary,
      ("application" | "text", _, _) => Self::Text,
      _ => Self::Json,
    }
  }

  pub const fn label(self) -> &'static str {
    match self {
      Self::Json => "Json",
      Self::Binary => "Binary",
      Self::Text => "Text",
      Self::Xml => "Xml",
      Self::EventStream => "EventStream",
      Self::FormUrlEncoded => "Form",
      Self::Multipart => "Multipart",
    }
  }

  /// Suffix distinguishing variants of one status; JSON keeps the bare name.
  pub const fn variant_suffix(self) -> &'static str {
    match self {
      Self::Json => "",
      other => other.label(),
    }
  }

  pub const fn is_form(self) -> bool {
    matches!(self, Self::FormUrlEncoded | Self::Multipart)
  }
}

/// Lowercased `type/subtype` of a content type, parameters dropped.
pub fn normalize_content_type(content_type: &str) -> String {
  match MediaType::parse(content_type) {
    Ok(media) => media.essence().to_string().to_ascii_lowercase(),
    Err(_) => content_type
      .split(';')
      .next()
      .unwrap_or_default()
      .trim()
      .to_ascii_lowercase(),
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
  pub name: String,
  pub ident: String,
  #[serde(rename = "type")]
  pub ty: TypeRef,
  pub required: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBodyVariant {
  pub content_type: String,
  pub category: ContentCategory,
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub ty: Option<TypeRef>,
  /// Flattened body properties in declaration order, for form encodings.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub form_fields: Vec<FormField>,
  pub required: bool,
}

/// A response status key: a concrete code, an `NXX` range, or the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusCode {
  Code(u16),
  Range(u8),
  Default,
}

impl StatusCode {
  pub fn parse(key: &str) -> Option<Self> {
    let key = key.trim();
    if key.eq_ignore_ascii_case("default") {
      return Some(Self::Default);
    }
    let bytes = key.as_bytes();
    if bytes.len() != 3 || !(b'1'..=b'5').contains(&bytes[0]) {
      return None;
    }
    if bytes[1..].iter().all(u8::is_ascii_digit) {
      return key.parse().ok().map(Self::Code);
    }
    if bytes[1..].iter().all(|b| b.eq_ignore_ascii_case(&b'x')) {
      return Some(Self::Range(bytes[0] - b'0'));
    }
    None
  }

  pub fn variant_name(self) -> String {
    match self {
      Self::Code(code) => status_code_variant_name(code),
      Self::Range(class) => status_range_variant_name(class),
      Self::Default => DEFAULT_RESPONSE_VARIANT.to_string(),
    }
  }

  pub fn is_default(self) -> bool {
    matches!(self, Self::Default)
  }
}

impl fmt::Display for StatusCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Code(code) => write!(f, "{code}"),
      Self::Range(class) => write!(f, "{class}XX"),
      Self::Default => f.write_str("default"),
    }
  }
}

impl Serialize for StatusCode {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderDecl {
  pub name: String,
  pub ident: String,
  #[serde(rename = "type")]
  pub ty: TypeRef,
  pub required: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseVariant {
  pub ident: String,
  pub status: StatusCode,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub content_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<ContentCategory>,
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub ty: Option<TypeRef>,
  pub has_no_content: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub headers: Vec<HeaderDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDecl {
  /// Identifier unique across the whole run.
  pub name: String,
  /// Identifier before collision handling; what operation filters match.
  pub stable_id: String,
  pub method: String,
  pub path: String,
  pub segments: PathTemplate,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub operation_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub summary: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub tags: Vec<String>,
  pub deprecated: bool,
  pub parameters: Vec<ParameterDecl>,
  pub request_body_variants: Vec<RequestBodyVariant>,
  pub response_variants: Vec<ResponseVariant>,
  #[serde(skip_serializing_if = "BTreeSet::is_empty")]
  pub runtime: BTreeSet<RuntimeSupport>,
  pub source: SourcePath,
}

impl OperationDecl {
  pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &ParameterDecl> {
    self.parameters.iter().filter(move |parameter| parameter.location == location)
  }

  /// Every type use of the operation.
  pub fn type_refs(&self) -> impl Iterator<Item = &TypeRef> {
    self
      .parameters
      .iter()
      .map(|parameter| &parameter.ty)
      .chain(self.request_body_variants.iter().filter_map(|body| body.ty.as_ref()))
      .chain(self.response_variants.iter().flat_map(|response| {
        response
          .ty
          .iter()
          .chain(response.headers.iter().map(|header| &header.ty))
      }))
  }
}

/// Operations in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OperationTable {
  operations: Vec<OperationDecl>,
}

impl OperationTable {
  /// Seals `operations`, adding the runtime needs of every type they use.
  pub fn new(mut operations: Vec<OperationDecl>, types: &TypeTable) -> Self {
    for operation in &mut operations {
      let needs: BTreeSet<RuntimeSupport> = operation.type_refs().flat_map(|ty| types.runtime_of(ty)).collect();
      operation.runtime.extend(needs);
    }
    Self { operations }
  }

  pub fn get(&self, name: &str) -> Option<&OperationDecl> {
    self.operations.iter().find(|operation| operation.name == name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &OperationDecl> {
    self.operations.iter()
  }

  pub fn len(&self) -> usize {
    self.operations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.operations.is_empty()
  }
}

#[cfg(test)]
mod tests;
