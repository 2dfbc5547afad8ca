//! Named, target-neutral type declarations derived from the canonical schema graph.

mod builder;

use std::{collections::BTreeSet, fmt};

use serde::Serialize;
use serde_json::Value;

pub use builder::{NameHint, TypeModelBuilder};

use crate::generator::{
  config::GenerationTarget,
  diagnostics::SourcePath,
  schema_graph::{Constraints, PrimitiveKind, UnionKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TypeId(usize);

impl TypeId {
  pub fn index(self) -> usize {
    self.0
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveType {
  String,
  Integer,
  Int32,
  Int64,
  Number,
  Float,
  Double,
  Boolean,
  Date,
  DateTime,
  Time,
  Duration,
  Uuid,
  Uri,
  Email,
  Binary,
  Bytes,
  Null,
  Any,
}

impl PrimitiveType {
  pub fn from_schema(kind: PrimitiveKind, format: Option<&str>) -> Self {
    match (kind, format) {
      (PrimitiveKind::String, Some("date")) => Self::Date,
      (PrimitiveKind::String, Some("date-time")) => Self::DateTime,
      (PrimitiveKind::String, Some("time")) => Self::Time,
      (PrimitiveKind::String, Some("duration")) => Self::Duration,
      (PrimitiveKind::String, Some("uuid")) => Self::Uuid,
      (PrimitiveKind::String, Some("uri" | "url" | "uri-reference" | "iri")) => Self::Uri,
      (PrimitiveKind::String, Some("email" | "idn-email")) => Self::Email,
      (PrimitiveKind::String, Some("binary")) => Self::Binary,
      (PrimitiveKind::String, Some("byte")) => Self::Bytes,
      (PrimitiveKind::String, _) => Self::String,
      (PrimitiveKind::Integer, Some("int32")) => Self::Int32,
      (PrimitiveKind::Integer, Some("int64")) => Self::Int64,
      (PrimitiveKind::Integer, _) => Self::Integer,
      (PrimitiveKind::Number, Some("float")) => Self::Float,
      (PrimitiveKind::Number, Some("double")) => Self::Double,
      (PrimitiveKind::Number, _) => Self::Number,
      (PrimitiveKind::Boolean, _) => Self::Boolean,
      (PrimitiveKind::Null, _) => Self::Null,
      (PrimitiveKind::Any, _) => Self::Any,
    }
  }

  pub fn is_temporal(self) -> bool {
    matches!(self, Self::Date | Self::DateTime | Self::Time)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::String => "string",
      Self::Integer => "integer",
      Self::Int32 => "int32",
      Self::Int64 => "int64",
      Self::Number => "number",
      Self::Float => "float",
      Self::Double => "double",
      Self::Boolean => "boolean",
      Self::Date => "date",
      Self::DateTime => "dateTime",
      Self::Time => "time",
      Self::Duration => "duration",
      Self::Uuid => "uuid",
      Self::Uri => "uri",
      Self::Email => "email",
      Self::Binary => "binary",
      Self::Bytes => "bytes",
      Self::Null => "null",
      Self::Any => "any",
    }
  }
}

/// A use of a type: a handle to a declaration, or a structural type built from
/// primitives and other references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeRef {
  Named { id: TypeId, name: String },
  Primitive { primitive: PrimitiveType },
  Array { items: Box<TypeRef>, unique: bool },
  Map { values: Box<TypeRef> },
}

impl TypeRef {
  pub fn primitive(primitive: PrimitiveType) -> Self {
    Self::Primitive { primitive }
  }

  pub fn any() -> Self {
    Self::primitive(PrimitiveType::Any)
  }

  /// The declaration this reference ultimately points at, looking through arrays
  /// and maps.
  pub fn named_target(&self) -> Option<TypeId> {
    match self {
      Self::Named { id, .. } => Some(*id),
      Self::Primitive { .. } => None,
      Self::Array { items, .. } => items.named_target(),
      Self::Map { values } => values.named_target(),
    }
  }

  pub fn primitive_leaf(&self) -> Option<PrimitiveType> {
    match self {
      Self::Primitive { primitive } => Some(*primitive),
      Self::Named { .. } => None,
      Self::Array { items, .. } => items.primitive_leaf(),
      Self::Map { values } => values.primitive_leaf(),
    }
  }
}

impl fmt::Display for TypeRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Named { name, .. } => f.write_str(name),
      Self::Primitive { primitive } => f.write_str(primitive.as_str()),
      Self::Array { items, unique: false } => write!(f, "[{items}]"),
      Self::Array { items, unique: true } => write!(f, "set[{items}]"),
      Self::Map { values } => write!(f, "map[{values}]"),
    }
  }
}

/// An externally supplied construct generated artifacts depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RuntimeSupport {
  ResponseWrapper { binding: GenerationTarget },
  DateTimeCodec,
  ValidationFailure,
}

impl fmt::Display for RuntimeSupport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ResponseWrapper { binding } => write!(f, "response-wrapper({binding})"),
      Self::DateTimeCodec => f.write_str("date-time-codec"),
      Self::ValidationFailure => f.write_str("validation-failure"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct FieldDecl {
  /// Property name as it appears on the wire.
  pub name: String,
  pub ident: String,
  #[serde(rename = "type")]
  pub ty: TypeRef,
  #[builder(default)]
  pub required: bool,
  #[builder(default)]
  pub nullable: bool,
  #[builder(default)]
  #[serde(skip_serializing_if = "Constraints::is_empty")]
  pub constraints: Constraints,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default: Option<Value>,
  #[builder(default)]
  pub deprecated: bool,
  #[builder(default)]
  pub read_only: bool,
  #[builder(default)]
  pub write_only: bool,
  /// The field points back at a declaration enclosing it; renderers must hold it
  /// without ownership (boxed, by reference, lazily).
  #[builder(default)]
  pub back_reference: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValueDecl {
  pub ident: String,
  pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnionVariantDecl {
  pub ident: String,
  #[serde(rename = "type")]
  pub ty: TypeRef,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TypeShape {
  Object {
    fields: Vec<FieldDecl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    additional_properties: Option<TypeRef>,
  },
  Enum {
    values: Vec<EnumValueDecl>,
  },
  Array {
    items: TypeRef,
    unique: bool,
  },
  Alias {
    target: TypeRef,
  },
  Union {
    kind: UnionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    discriminator: Option<String>,
    variants: Vec<UnionVariantDecl>,
  },
}

impl TypeShape {
  pub fn label(&self) -> &'static str {
    match self {
      Self::Object { .. } => "object",
      Self::Enum { .. } => "enum",
      Self::Array { .. } => "array",
      Self::Alias { .. } => "alias",
      Self::Union { .. } => "union",
    }
  }

  pub fn type_refs(&self) -> Vec<&TypeRef> {
    match self {
      Self::Object {
        fields,
        additional_properties,
      } => fields
        .iter()
        .map(|field| &field.ty)
        .chain(additional_properties.as_ref())
        .collect(),
      Self::Enum { .. } => vec![],
      Self::Array { items, .. } => vec![items],
      Self::Alias { target } => vec![target],
      Self::Union { variants, .. } => variants.iter().map(|variant| &variant.ty).collect(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct TypeDecl {
  pub id: TypeId,
  pub qualified_name: String,
  #[serde(flatten)]
  pub shape: TypeShape,
  pub source_schema_path: SourcePath,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[builder(default)]
  pub nullable: bool,
  #[builder(default)]
  pub deprecated: bool,
  /// Validation facts of an alias or array declaration itself.
  #[builder(default)]
  #[serde(skip_serializing_if = "Constraints::is_empty")]
  pub constraints: Constraints,
  #[builder(default)]
  #[serde(skip_serializing_if = "BTreeSet::is_empty")]
  pub runtime: BTreeSet<RuntimeSupport>,
}

impl TypeDecl {
  pub fn fields(&self) -> &[FieldDecl] {
    match &self.shape {
      TypeShape::Object { fields, .. } => fields,
      _ => &[],
    }
  }

  pub fn required_names(&self) -> BTreeSet<&str> {
    self
      .fields()
      .iter()
      .filter(|field| field.required)
      .map(|field| field.name.as_str())
      .collect()
  }
}

/// Declarations ordered by [`TypeId`]: declared schemas first in document order,
/// then inline schemas in the order the build walk met them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TypeTable {
  decls: Vec<TypeDecl>,
}

impl TypeTable {
  pub(crate) fn new(mut decls: Vec<TypeDecl>) -> Self {
    decls.sort_by_key(|decl| decl.id);
    Self { decls }
  }

  pub fn get(&self, id: TypeId) -> Option<&TypeDecl> {
    self
      .decls
      .binary_search_by_key(&id, |decl| decl.id)
      .ok()
      .map(|index| &self.decls[index])
  }

  pub fn by_name(&self, name: &str) -> Option<&TypeDecl> {
    self.decls.iter().find(|decl| decl.qualified_name == name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &TypeDecl> {
    self.decls.iter()
  }

  pub fn len(&self) -> usize {
    self.decls.len()
  }

  pub fn is_empty(&self) -> bool {
    self.decls.is_empty()
  }

  /// Runtime needs of everything `ty` reaches.
  pub fn runtime_of(&self, ty: &TypeRef) -> BTreeSet<RuntimeSupport> {
    let mut needs = BTreeSet::new();
    if ty.primitive_leaf().is_some_and(PrimitiveType::is_temporal) {
      needs.insert(RuntimeSupport::DateTimeCodec);
    }
    if let Some(decl) = ty.named_target().and_then(|id| self.get(id)) {
      needs.extend(decl.runtime.iter().copied());
    }
    needs
  }
}

#[cfg(test)]
mod tests;
