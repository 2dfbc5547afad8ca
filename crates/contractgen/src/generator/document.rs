//! Raw serde model of the input document.
//!
//! Only the parts the pipeline reads are modeled; unknown keys (including `x-`
//! extensions) are ignored. Maps are `IndexMap`s because declaration order drives
//! field, parameter, and naming order downstream.

use http::Method;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Number, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawOrRef<T> {
  Ref {
    #[serde(rename = "$ref")]
    reference: String,
  },
  Item(T),
}

/// A schema position: a reference, a boolean schema, or an inline schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawSchemaRef {
  Ref {
    #[serde(rename = "$ref")]
    reference: String,
  },
  Bool(bool),
  Schema(Box<RawSchema>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
  String,
  Number,
  Integer,
  Boolean,
  Array,
  Object,
  Null,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SchemaTypeSet {
  Single(SchemaType),
  Multiple(Vec<SchemaType>),
}

impl SchemaTypeSet {
  pub fn types(&self) -> Vec<SchemaType> {
    match self {
      Self::Single(single) => vec![*single],
      Self::Multiple(many) => many.clone(),
    }
  }
}

/// `exclusiveMinimum`/`exclusiveMaximum` are flags in OpenAPI 3.0 and bounds in 3.1.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExclusiveBound {
  Flag(bool),
  Value(Number),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDiscriminator {
  pub property_name: String,
  #[serde(default)]
  pub mapping: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchema {
  #[serde(rename = "type")]
  pub schema_type: Option<SchemaTypeSet>,
  pub format: Option<String>,
  pub title: Option<String>,
  pub description: Option<String>,
  #[serde(default)]
  pub properties: IndexMap<String, RawSchemaRef>,
  #[serde(default)]
  pub required: Vec<String>,
  pub items: Option<Box<RawSchemaRef>>,
  pub additional_properties: Option<Box<RawSchemaRef>>,
  #[serde(default)]
  pub all_of: Vec<RawSchemaRef>,
  #[serde(default)]
  pub one_of: Vec<RawSchemaRef>,
  #[serde(default)]
  pub any_of: Vec<RawSchemaRef>,
  pub discriminator: Option<RawDiscriminator>,
  #[serde(rename = "enum", default)]
  pub enum_values: Vec<Value>,
  #[serde(rename = "const")]
  pub const_value: Option<Value>,
  #[serde(default)]
  pub nullable: bool,
  pub pattern: Option<String>,
  pub minimum: Option<Number>,
  pub maximum: Option<Number>,
  pub exclusive_minimum: Option<ExclusiveBound>,
  pub exclusive_maximum: Option<ExclusiveBound>,
  pub multiple_of: Option<Number>,
  pub min_length: Option<u64>,
  pub max_length: Option<u64>,
  pub min_items: Option<u64>,
  pub max_items: Option<u64>,
  #[serde(default)]
  pub unique_items: bool,
  pub default: Option<Value>,
  #[serde(default)]
  pub deprecated: bool,
  #[serde(default)]
  pub read_only: bool,
  #[serde(default)]
  pub write_only: bool,
}

impl RawSchema {
  pub fn declared_types(&self) -> Vec<SchemaType> {
    self.schema_type.as_ref().map(SchemaTypeSet::types).unwrap_or_default()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawInfo {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub version: String,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawParameterLocation {
  Query,
  Header,
  Path,
  Cookie,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawParameter {
  pub name: String,
  #[serde(rename = "in")]
  pub location: RawParameterLocation,
  pub description: Option<String>,
  #[serde(default)]
  pub required: bool,
  #[serde(default)]
  pub deprecated: bool,
  pub schema: Option<RawSchemaRef>,
  pub style: Option<String>,
  pub explode: Option<bool>,
  #[serde(default)]
  pub content: IndexMap<String, RawMediaType>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEncoding {
  pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawMediaType {
  pub schema: Option<RawSchemaRef>,
  #[serde(default)]
  pub encoding: IndexMap<String, RawEncoding>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRequestBody {
  pub description: Option<String>,
  #[serde(default)]
  pub required: bool,
  #[serde(default)]
  pub content: IndexMap<String, RawMediaType>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawHeader {
  pub description: Option<String>,
  #[serde(default)]
  pub required: bool,
  pub schema: Option<RawSchemaRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawResponse {
  pub description: Option<String>,
  #[serde(default)]
  pub headers: IndexMap<String, RawOrRef<RawHeader>>,
  #[serde(default)]
  pub content: IndexMap<String, RawMediaType>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOperation {
  pub operation_id: Option<String>,
  pub summary: Option<String>,
  pub description: Option<String>,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub deprecated: bool,
  #[serde(default)]
  pub parameters: Vec<RawOrRef<RawParameter>>,
  pub request_body: Option<RawOrRef<RawRequestBody>>,
  #[serde(default)]
  pub responses: IndexMap<String, RawOrRef<RawResponse>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPathItem {
  #[serde(rename = "$ref")]
  pub reference: Option<String>,
  #[serde(default)]
  pub parameters: Vec<RawOrRef<RawParameter>>,
  pub get: Option<RawOperation>,
  pub put: Option<RawOperation>,
  pub post: Option<RawOperation>,
  pub delete: Option<RawOperation>,
  pub options: Option<RawOperation>,
  pub head: Option<RawOperation>,
  pub patch: Option<RawOperation>,
  pub trace: Option<RawOperation>,
}

impl RawPathItem {
  /// Declared operations in the fixed method order of the path item object.
  pub fn operations(&self) -> impl Iterator<Item = (Method, &RawOperation)> {
    [
      (Method::GET, &self.get),
      (Method::PUT, &self.put),
      (Method::POST, &self.post),
      (Method::DELETE, &self.delete),
      (Method::OPTIONS, &self.options),
      (Method::HEAD, &self.head),
      (Method::PATCH, &self.patch),
      (Method::TRACE, &self.trace),
    ]
    .into_iter()
    .filter_map(|(method, operation)| operation.as_ref().map(|op| (method, op)))
  }
}
