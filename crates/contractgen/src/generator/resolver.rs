//! Reference resolution: turns the raw document set into a [`SchemaGraph`] plus
//! operation skeletons whose schemas are already graph handles.
//!
//! Resolution is memoized by [`Location`]. A schema slot is reserved and memoized
//! before its children are visited, so a reference back into a schema that is
//! still being materialized returns the reserved handle instead of recursing.

use std::collections::{HashMap, HashSet};

use http::Method;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

use crate::{
  generator::{
    diagnostics::{Diagnostics, SourcePath},
    document::{
      ExclusiveBound, RawDiscriminator, RawHeader, RawInfo, RawMediaType, RawOperation, RawOrRef, RawParameter,
      RawParameterLocation, RawPathItem, RawRequestBody, RawResponse, RawSchema, RawSchemaRef, SchemaType,
    },
    errors::SpecError,
    schema_graph::{
      Constraints, Discriminator, EnumLiteral, PrimitiveKind, SchemaGraph, SchemaId, SchemaKind, SchemaNode, UnionKind,
      UnionMember,
    },
  },
  utils::{
    refs::{Location, escape_token, resolve_ref},
    spec::DocumentSource,
  },
};

#[derive(Debug, Clone)]
pub struct ResolvedSpec {
  pub info: RawInfo,
  pub graph: SchemaGraph,
  /// Component schemas in declaration order.
  pub named: Vec<SchemaId>,
  pub operations: Vec<OperationSkeleton>,
}

#[derive(Debug, Clone)]
pub struct OperationSkeleton {
  pub method: Method,
  pub path: String,
  pub source: SourcePath,
  pub operation_id: Option<String>,
  pub summary: Option<String>,
  pub description: Option<String>,
  pub tags: Vec<String>,
  pub deprecated: bool,
  pub parameters: Vec<ParameterSkeleton>,
  pub request_body: Option<RequestBodySkeleton>,
  pub responses: Vec<ResponseSkeleton>,
}

impl OperationSkeleton {
  /// Every schema this operation mentions directly.
  pub fn schemas(&self) -> Vec<SchemaId> {
    let mut schemas: Vec<SchemaId> = self.parameters.iter().filter_map(|p| p.schema).collect();
    if let Some(body) = &self.request_body {
      schemas.extend(body.content.iter().filter_map(|media| media.schema));
    }
    for response in &self.responses {
      schemas.extend(response.headers.iter().filter_map(|header| header.schema));
      schemas.extend(response.content.iter().filter_map(|media| media.schema));
    }
    schemas
  }
}

#[derive(Debug, Clone)]
pub struct ParameterSkeleton {
  pub name: String,
  pub location: RawParameterLocation,
  pub description: Option<String>,
  pub required: bool,
  pub deprecated: bool,
  pub schema: Option<SchemaId>,
  pub style: Option<String>,
  pub explode: Option<bool>,
  pub source: SourcePath,
}

#[derive(Debug, Clone)]
pub struct MediaSkeleton {
  pub content_type: String,
  pub schema: Option<SchemaId>,
  /// Per-property content types declared in the `encoding` map.
  pub encoding: IndexMap<String, Option<String>>,
  pub source: SourcePath,
}

#[derive(Debug, Clone)]
pub struct RequestBodySkeleton {
  pub description: Option<String>,
  pub required: bool,
  pub content: Vec<MediaSkeleton>,
  pub source: SourcePath,
}

#[derive(Debug, Clone)]
pub struct HeaderSkeleton {
  pub name: String,
  pub description: Option<String>,
  pub required: bool,
  pub schema: Option<SchemaId>,
  pub source: SourcePath,
}

#[derive(Debug, Clone)]
pub struct ResponseSkeleton {
  pub status: String,
  pub description: Option<String>,
  pub headers: Vec<HeaderSkeleton>,
  pub content: Vec<MediaSkeleton>,
  pub source: SourcePath,
}

/// Resolves the root document of `documents` and everything it references.
///
/// Unresolvable references halt resolution and are returned as the error; fragments
/// that fail to deserialize are recorded in `diagnostics` and the enclosing schema
/// or operation is skipped.
pub fn resolve(documents: &dyn DocumentSource, diagnostics: &mut Diagnostics) -> Result<ResolvedSpec, SpecError> {
  Resolver::new(documents, diagnostics).run()
}

fn halts(error: &SpecError) -> bool {
  matches!(
    error,
    SpecError::UnresolvedReference { .. } | SpecError::CircularAlias { .. }
  )
}

fn deserialize<T: DeserializeOwned>(value: &Value, at: &Location) -> Result<T, SpecError> {
  serde_path_to_error::deserialize(value).map_err(|err| {
    let path = err.path().to_string();
    let inner = err.into_inner();
    let message = if path == "." {
      inner.to_string()
    } else {
      format!("{path}: {inner}")
    };
    SpecError::invalid(&at.source_path(), message)
  })
}

struct Resolver<'a> {
  documents: &'a dyn DocumentSource,
  diagnostics: &'a mut Diagnostics,
  graph: SchemaGraph,
  memo: HashMap<Location, SchemaId>,
  aliasing: HashSet<Location>,
}

impl<'a> Resolver<'a> {
  fn new(documents: &'a dyn DocumentSource, diagnostics: &'a mut Diagnostics) -> Self {
    Self {
      documents,
      diagnostics,
      graph: SchemaGraph::new(),
      memo: HashMap::new(),
      aliasing: HashSet::new(),
    }
  }

  fn run(mut self) -> Result<ResolvedSpec, SpecError> {
    let documents = self.documents;
    let root_location = Location::root(documents.root());
    let root = documents
      .document(documents.root())
      .ok_or_else(|| SpecError::invalid(&root_location.source_path(), "root document is not loaded"))?;

    let info = match root.get("info") {
      Some(value) => self.recover(deserialize::<RawInfo>(value, &root_location.child(["info"])))?,
      None => None,
    }
    .unwrap_or_default();

    let named = self.named_schemas(root, &root_location)?;
    let operations = self.operations(root, &root_location)?;

    Ok(ResolvedSpec {
      info,
      graph: self.graph,
      named,
      operations,
    })
  }

  /// Records a recoverable error and yields `None`; halting errors propagate.
  fn recover<T>(&mut self, result: Result<T, SpecError>) -> Result<Option<T>, SpecError> {
    match result {
      Ok(value) => Ok(Some(value)),
      Err(err) if halts(&err) => Err(err),
      Err(err) => {
        self.diagnostics.error(&err);
        Ok(None)
      }
    }
  }

  fn named_schemas(&mut self, root: &Value, root_location: &Location) -> Result<Vec<SchemaId>, SpecError> {
    let names: Vec<String> = root
      .pointer("/components/schemas")
      .and_then(Value::as_object)
      .map(|schemas| schemas.keys().cloned().collect())
      .unwrap_or_default();

    let mut named = vec![];
    for name in names {
      let location = root_location.child(["components", "schemas", name.as_str()]);
      let reference = format!("#{}", location.pointer);
      let resolved = self.resolve_location(&location, &reference, &location);
      if let Some(id) = self.recover(resolved)?
        && !named.contains(&id)
      {
        let node = self.graph.node_mut(id);
        if node.name.is_none() {
          node.name = Some(name);
        }
        named.push(id);
      }
    }
    Ok(named)
  }

  fn operations(&mut self, root: &Value, root_location: &Location) -> Result<Vec<OperationSkeleton>, SpecError> {
    let Some(paths) = root.get("paths").and_then(Value::as_object) else {
      return Ok(vec![]);
    };

    let mut operations = vec![];
    for (path, item_value) in paths {
      let declared_at = root_location.child(["paths", path.as_str()]);
      let item = self.path_item(item_value, &declared_at);
      let Some((item, item_at)) = self.recover(item)? else {
        continue;
      };

      let shared = self.parameters(&item.parameters, &item_at.child(["parameters"]), &[]);
      let Some(shared) = self.recover(shared)? else {
        continue;
      };

      for (method, raw) in item.operations() {
        let at = item_at.child([method.as_str().to_ascii_lowercase()]);
        let operation = self.operation(path, method, raw, &at, &shared);
        if let Some(operation) = self.recover(operation)? {
          operations.push(operation);
        }
      }
    }
    Ok(operations)
  }

  fn path_item(&mut self, value: &Value, at: &Location) -> Result<(RawPathItem, Location), SpecError> {
    let item: RawPathItem = deserialize(value, at)?;
    match &item.reference {
      Some(reference) => self.component(&RawOrRef::<RawPathItem>::Ref {
        reference: reference.clone(),
      }, at),
      None => Ok((item, at.clone())),
    }
  }

  fn operation(
    &mut self,
    path: &str,
    method: Method,
    raw: &RawOperation,
    at: &Location,
    shared: &[ParameterSkeleton],
  ) -> Result<OperationSkeleton, SpecError> {
    let parameters = self.parameters(&raw.parameters, &at.child(["parameters"]), shared)?;

    let request_body = match &raw.request_body {
      Some(body) => Some(self.request_body(body, &at.child(["requestBody"]))?),
      None => None,
    };

    let mut responses = vec![];
    for (status, response) in &raw.responses {
      responses.push(self.response(status, response, &at.child(["responses", status.as_str()]))?);
    }

    Ok(OperationSkeleton {
      method,
      path: path.to_string(),
      source: at.source_path(),
      operation_id: raw.operation_id.clone(),
      summary: raw.summary.clone(),
      description: raw.description.clone(),
      tags: raw.tags.clone(),
      deprecated: raw.deprecated,
      parameters,
      request_body,
      responses,
    })
  }

  /// Resolves `raw` and merges it over `inherited`: an entry with the same
  /// (name, location) as an inherited one replaces it and moves to the end.
  fn parameters(
    &mut self,
    raw: &[RawOrRef<RawParameter>],
    at: &Location,
    inherited: &[ParameterSkeleton],
  ) -> Result<Vec<ParameterSkeleton>, SpecError> {
    let mut merged: Vec<(bool, ParameterSkeleton)> = inherited.iter().cloned().map(|p| (true, p)).collect();

    for (index, parameter) in raw.iter().enumerate() {
      let parameter = self.parameter(parameter, &at.child([index.to_string()]))?;
      let existing = merged
        .iter()
        .position(|(_, p)| p.name == parameter.name && p.location == parameter.location);

      match existing {
        Some(position) if merged[position].0 => {
          merged.remove(position);
          merged.push((false, parameter));
        }
        Some(_) => {
          self.diagnostics.warn(
            &parameter.source,
            format!("parameter '{}' is declared twice in the same location, keeping the first", parameter.name),
          );
        }
        None => merged.push((false, parameter)),
      }
    }

    Ok(merged.into_iter().map(|(_, parameter)| parameter).collect())
  }

  fn parameter(&mut self, raw: &RawOrRef<RawParameter>, at: &Location) -> Result<ParameterSkeleton, SpecError> {
    let (parameter, at) = self.component(raw, at)?;

    let schema = if let Some(schema) = &parameter.schema {
      Some(self.materialize(schema, at.child(["schema"]))?)
    } else if let Some((content_type, media)) = parameter.content.first()
      && let Some(schema) = &media.schema
    {
      Some(self.materialize(schema, at.child(["content", content_type.as_str(), "schema"]))?)
    } else {
      None
    };

    Ok(ParameterSkeleton {
      name: parameter.name,
      location: parameter.location,
      description: parameter.description,
      required: parameter.required,
      deprecated: parameter.deprecated,
      schema,
      style: parameter.style,
      explode: parameter.explode,
      source: at.source_path(),
    })
  }

  fn request_body(&mut self, raw: &RawOrRef<RawRequestBody>, at: &Location) -> Result<RequestBodySkeleton, SpecError> {
    let (body, body_at) = self.component(raw, at)?;
    let content = self.media_types(&body.content, &body_at.child(["content"]))?;
    Ok(RequestBodySkeleton {
      description: body.description,
      required: body.required,
      content,
      source: at.source_path(),
    })
  }

  fn response(&mut self, status: &str, raw: &RawOrRef<RawResponse>, at: &Location) -> Result<ResponseSkeleton, SpecError> {
    let (response, response_at) = self.component(raw, at)?;

    let mut headers = vec![];
    for (name, header) in &response.headers {
      let (header, header_at) = self.component::<RawHeader>(header, &response_at.child(["headers", name.as_str()]))?;
      let schema = match &header.schema {
        Some(schema) => Some(self.materialize(schema, header_at.child(["schema"]))?),
        None => None,
      };
      headers.push(HeaderSkeleton {
        name: name.clone(),
        description: header.description,
        required: header.required,
        schema,
        source: header_at.source_path(),
      });
    }

    let content = self.media_types(&response.content, &response_at.child(["content"]))?;

    Ok(ResponseSkeleton {
      status: status.to_string(),
      description: response.description,
      headers,
      content,
      source: at.source_path(),
    })
  }

  fn media_types(&mut self, content: &IndexMap<String, RawMediaType>, at: &Location) -> Result<Vec<MediaSkeleton>, SpecError> {
    let mut media_types = vec![];
    for (content_type, media) in content {
      let media_at = at.child([content_type]);
      let schema = match &media.schema {
        Some(schema) => Some(self.materialize(schema, media_at.child(["schema"]))?),
        None => None,
      };
      media_types.push(MediaSkeleton {
        content_type: content_type.clone(),
        schema,
        encoding: media
          .encoding
          .iter()
          .map(|(property, encoding)| (property.clone(), encoding.content_type.clone()))
          .collect(),
        source: media_at.source_path(),
      });
    }
    Ok(media_types)
  }

  /// Follows a chain of component references to the object it ends at.
  fn component<T: DeserializeOwned + Clone>(&mut self, raw: &RawOrRef<T>, at: &Location) -> Result<(T, Location), SpecError> {
    let mut reference = match raw {
      RawOrRef::Item(item) => return Ok((item.clone(), at.clone())),
      RawOrRef::Ref { reference } => reference.clone(),
    };

    let mut declared_at = at.clone();
    let mut visited = HashSet::new();
    loop {
      let target = Self::locate(&reference, &declared_at)?;
      if !visited.insert(target.clone()) {
        return Err(SpecError::CircularAlias {
          reference,
          declared_at: at.source_path(),
        });
      }

      let value = self.lookup(&target, &reference, &declared_at)?;
      match deserialize::<RawOrRef<T>>(value, &target)? {
        RawOrRef::Item(item) => return Ok((item, target)),
        RawOrRef::Ref { reference: next } => {
          declared_at = target;
          reference = next;
        }
      }
    }
  }

  fn locate(reference: &str, declared_at: &Location) -> Result<Location, SpecError> {
    resolve_ref(reference, declared_at).ok_or_else(|| SpecError::UnresolvedReference {
      reference: reference.to_string(),
      declared_at: declared_at.source_path(),
      cause: None,
    })
  }

  fn lookup(&self, target: &Location, reference: &str, declared_at: &Location) -> Result<&'a Value, SpecError> {
    let documents = self.documents;
    documents
      .document(&target.document)
      .and_then(|document| document.pointer(&target.pointer))
      .ok_or_else(|| SpecError::UnresolvedReference {
        reference: reference.to_string(),
        declared_at: declared_at.source_path(),
        cause: documents
          .unavailable_reason(&target.document)
          .map(|reason| format!("document '{}' could not be loaded: {reason}", target.document)),
      })
  }

  fn resolve_location(&mut self, target: &Location, reference: &str, declared_at: &Location) -> Result<SchemaId, SpecError> {
    if let Some(&id) = self.memo.get(target) {
      return Ok(id);
    }
    let value = self.lookup(target, reference, declared_at)?;
    let raw: RawSchemaRef = deserialize(value, target)?;
    self.materialize(&raw, target.clone())
  }

  fn materialize(&mut self, raw: &RawSchemaRef, at: Location) -> Result<SchemaId, SpecError> {
    if let Some(&id) = self.memo.get(&at) {
      return Ok(id);
    }

    match raw {
      RawSchemaRef::Ref { reference } => {
        let target = Self::locate(reference, &at)?;
        if let Some(&id) = self.memo.get(&target) {
          self.memo.insert(at, id);
          return Ok(id);
        }

        if !self.aliasing.insert(at.clone()) {
          return Err(SpecError::CircularAlias {
            reference: reference.clone(),
            declared_at: at.source_path(),
          });
        }
        let resolved = self.resolve_location(&target, reference, &at);
        self.aliasing.remove(&at);

        let id = resolved?;
        self.memo.insert(at, id);
        Ok(id)
      }
      RawSchemaRef::Bool(accepts) => {
        if !accepts {
          self.diagnostics.warn(
            &at.source_path(),
            "boolean schema `false` is treated as an unconstrained value",
          );
        }
        let mut node = SchemaNode::new(SchemaKind::Primitive(PrimitiveKind::Any), at.source_path());
        node.name = at.declared_name(self.documents.root());
        let id = self.graph.push(node);
        self.memo.insert(at, id);
        Ok(id)
      }
      RawSchemaRef::Schema(schema) => self.materialize_schema(schema, at),
    }
  }

  fn materialize_schema(&mut self, schema: &RawSchema, at: Location) -> Result<SchemaId, SpecError> {
    let source = at.source_path();
    let id = self.graph.reserve(source.clone());
    self.memo.insert(at.clone(), id);

    let types = schema.declared_types();
    let mut node = SchemaNode::new(SchemaKind::Object, source);
    node.name = at.declared_name(self.documents.root());
    node.title.clone_from(&schema.title);
    node.description.clone_from(&schema.description);
    node.default.clone_from(&schema.default);
    node.format.clone_from(&schema.format);
    node.constraints = constraints_of(schema);
    node.unique_items = schema.unique_items;
    node.nullable = schema.nullable || types.contains(&SchemaType::Null);
    node.deprecated = schema.deprecated;
    node.read_only = schema.read_only;
    node.write_only = schema.write_only;

    for (property, raw) in &schema.properties {
      let child = self.materialize(raw, at.child(["properties", property.as_str()]))?;
      node.properties.insert(property.clone(), child);
    }
    node.required = schema.required.iter().cloned().collect();

    node.additional_properties = match schema.additional_properties.as_deref() {
      None | Some(RawSchemaRef::Bool(false)) => None,
      Some(raw) => Some(self.materialize(raw, at.child(["additionalProperties"]))?),
    };

    node.kind = self.kind_of(schema, &types, &at)?;

    if let SchemaKind::Enum { literals } = &mut node.kind
      && literals.iter().any(|literal| literal.value.is_null())
    {
      literals.retain(|literal| !literal.value.is_null());
      node.nullable = true;
    }

    if let Some(discriminator) = &schema.discriminator {
      node.discriminator = Some(self.discriminator(discriminator, &at)?);
    }

    self.graph.fill(id, node);
    Ok(id)
  }

  fn kind_of(&mut self, schema: &RawSchema, types: &[SchemaType], at: &Location) -> Result<SchemaKind, SpecError> {
    if !schema.all_of.is_empty() {
      return Ok(SchemaKind::AllOf {
        members: self.members(&schema.all_of, at, "allOf")?,
      });
    }
    if !schema.one_of.is_empty() {
      return self.union(UnionKind::OneOf, &schema.one_of, at, "oneOf");
    }
    if !schema.any_of.is_empty() {
      return self.union(UnionKind::AnyOf, &schema.any_of, at, "anyOf");
    }
    if let Some(value) = &schema.const_value {
      return Ok(SchemaKind::Enum {
        literals: vec![EnumLiteral {
          value: value.clone(),
          ident: None,
        }],
      });
    }
    if !schema.enum_values.is_empty() {
      return Ok(SchemaKind::Enum {
        literals: schema
          .enum_values
          .iter()
          .map(|value| EnumLiteral {
            value: value.clone(),
            ident: None,
          })
          .collect(),
      });
    }

    let non_null: Vec<SchemaType> = types.iter().copied().filter(|ty| *ty != SchemaType::Null).collect();
    let kind = match non_null.as_slice() {
      [] if types.contains(&SchemaType::Null) => SchemaKind::Primitive(PrimitiveKind::Null),
      [] if schema.items.is_some() => self.array(schema, at)?,
      [] if !schema.properties.is_empty() || schema.additional_properties.is_some() => SchemaKind::Object,
      [] => SchemaKind::Primitive(PrimitiveKind::Any),
      [SchemaType::Array] => self.array(schema, at)?,
      [SchemaType::Object] => SchemaKind::Object,
      [SchemaType::String] => SchemaKind::Primitive(PrimitiveKind::String),
      [SchemaType::Integer] => SchemaKind::Primitive(PrimitiveKind::Integer),
      [SchemaType::Number] => SchemaKind::Primitive(PrimitiveKind::Number),
      [SchemaType::Boolean] => SchemaKind::Primitive(PrimitiveKind::Boolean),
      _ => {
        self.diagnostics.warn(
          &at.source_path(),
          "schema declares several non-null types and is treated as an unconstrained value",
        );
        SchemaKind::Primitive(PrimitiveKind::Any)
      }
    };
    Ok(kind)
  }

  fn array(&mut self, schema: &RawSchema, at: &Location) -> Result<SchemaKind, SpecError> {
    let items = match schema.items.as_deref() {
      Some(raw) => Some(self.materialize(raw, at.child(["items"]))?),
      None => None,
    };
    Ok(SchemaKind::Array { items })
  }

  fn members(&mut self, raw: &[RawSchemaRef], at: &Location, keyword: &str) -> Result<Vec<SchemaId>, SpecError> {
    let mut members = vec![];
    for (index, member) in raw.iter().enumerate() {
      members.push(self.materialize(member, at.child([keyword.to_string(), index.to_string()]))?);
    }
    Ok(members)
  }

  fn union(&mut self, kind: UnionKind, raw: &[RawSchemaRef], at: &Location, keyword: &str) -> Result<SchemaKind, SpecError> {
    let members = self
      .members(raw, at, keyword)?
      .into_iter()
      .map(|schema| UnionMember { schema, tags: vec![] })
      .collect();
    Ok(SchemaKind::Union { kind, members })
  }

  fn discriminator(&mut self, raw: &RawDiscriminator, at: &Location) -> Result<Discriminator, SpecError> {
    let mut mapping = vec![];
    for (tag, target) in &raw.mapping {
      let reference = if target.contains('#') || target.contains('/') {
        target.clone()
      } else {
        format!("#/components/schemas/{}", escape_token(target))
      };
      let declared_at = at.child(["discriminator", "mapping", tag.as_str()]);
      let location = Self::locate(&reference, &declared_at)?;
      let id = self.resolve_location(&location, &reference, &declared_at)?;
      mapping.push((tag.clone(), id));
    }
    Ok(Discriminator {
      property: raw.property_name.clone(),
      mapping,
    })
  }
}

fn constraints_of(schema: &RawSchema) -> Constraints {
  let (minimum, exclusive_minimum) = bound(schema.minimum.as_ref(), schema.exclusive_minimum.as_ref());
  let (maximum, exclusive_maximum) = bound(schema.maximum.as_ref(), schema.exclusive_maximum.as_ref());
  Constraints {
    pattern: schema.pattern.clone(),
    minimum,
    maximum,
    exclusive_minimum,
    exclusive_maximum,
    multiple_of: schema.multiple_of.clone(),
    min_length: schema.min_length,
    max_length: schema.max_length,
    min_items: schema.min_items,
    max_items: schema.max_items,
  }
}

/// Splits a bound into (inclusive, exclusive) for both the 3.0 flag form and the
/// 3.1 numeric form.
fn bound(value: Option<&Number>, exclusive: Option<&ExclusiveBound>) -> (Option<Number>, Option<Number>) {
  match exclusive {
    Some(ExclusiveBound::Flag(true)) => (None, value.cloned()),
    Some(ExclusiveBound::Value(limit)) => (value.cloned(), Some(limit.clone())),
    Some(ExclusiveBound::Flag(false)) | None => (value.cloned(), None),
  }
}
