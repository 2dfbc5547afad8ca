//! Canonicalization of the resolved schema graph.
//!
//! The canonical graph keeps every [`SchemaId`] of its input. `allOf` nodes become
//! objects (or aliases, for a lone member), unions lose their `null` members and
//! gain discriminator tags, and enum literals get identifiers. Running the pass on
//! its own output changes nothing.

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use serde_json::{Value, json};

use crate::generator::{
  diagnostics::Diagnostics,
  errors::SpecError,
  naming::variants::literal_identifiers,
  schema_graph::{PrimitiveKind, SchemaGraph, SchemaId, SchemaKind, SchemaNode, UnionKind, UnionMember},
};

pub fn normalize(graph: &SchemaGraph, diagnostics: &mut Diagnostics) -> SchemaGraph {
  Normalizer::new(graph, diagnostics).run()
}

/// Object view of a node once every `allOf` below it has been folded in.
#[derive(Debug, Clone, Default)]
struct Flattened {
  properties: IndexMap<String, SchemaId>,
  required: IndexSet<String>,
  additional_properties: Option<SchemaId>,
}

struct Normalizer<'a> {
  source: &'a SchemaGraph,
  diagnostics: &'a mut Diagnostics,
  flattened: HashMap<SchemaId, Flattened>,
  in_progress: HashSet<SchemaId>,
}

impl<'a> Normalizer<'a> {
  fn new(source: &'a SchemaGraph, diagnostics: &'a mut Diagnostics) -> Self {
    Self {
      source,
      diagnostics,
      flattened: HashMap::new(),
      in_progress: HashSet::new(),
    }
  }

  fn run(mut self) -> SchemaGraph {
    let mut output = self.source.clone();
    for id in self.source.ids() {
      match self.canonical(id) {
        Ok(node) => *output.node_mut(id) = node,
        Err(err) => self.diagnostics.error(&err),
      }
    }
    output
  }

  fn canonical(&mut self, id: SchemaId) -> Result<SchemaNode, SpecError> {
    let source = self.source;
    let mut node = source.node(id).clone();

    match &node.kind {
      SchemaKind::AllOf { members } => {
        let members = members.clone();
        self.merge_all_of(id, &members, &mut node)?;
      }
      SchemaKind::Union { kind, members } => {
        let (kind, members) = (*kind, members.clone());
        self.canonical_union(kind, &members, &mut node)?;
      }
      SchemaKind::Enum { literals } => {
        let values: Vec<Value> = literals.iter().map(|literal| literal.value.clone()).collect();
        let idents = literal_identifiers(&values);
        if let SchemaKind::Enum { literals } = &mut node.kind {
          for (literal, ident) in literals.iter_mut().zip(idents) {
            literal.ident = Some(ident);
          }
        }
      }
      SchemaKind::Object | SchemaKind::Array { .. } | SchemaKind::Primitive(_) | SchemaKind::Alias { .. } => {}
    }

    if node.discriminator.is_some() && !matches!(node.kind, SchemaKind::Union { .. }) {
      self.diagnostics.warn(
        &node.location,
        "discriminator on a schema without oneOf/anyOf is ignored",
      );
      node.discriminator = None;
    }

    Ok(node)
  }

  fn merge_all_of(&mut self, id: SchemaId, members: &[SchemaId], node: &mut SchemaNode) -> Result<(), SpecError> {
    let source = self.source;
    let (nulls, members): (Vec<SchemaId>, Vec<SchemaId>) =
      members.iter().copied().partition(|member| source.node(*member).is_null());
    if !nulls.is_empty() {
      node.nullable = true;
    }

    if let [target] = members.as_slice()
      && node.properties.is_empty()
      && node.additional_properties.is_none()
    {
      node.kind = SchemaKind::Alias { target: *target };
      return Ok(());
    }

    let flattened = self.flatten(id)?;
    node.kind = SchemaKind::Object;
    node.properties = flattened.properties;
    node.required = flattened.required;
    node.additional_properties = flattened.additional_properties;
    Ok(())
  }

  /// Folds `id` into a single property list, recursing through nested `allOf`.
  fn flatten(&mut self, id: SchemaId) -> Result<Flattened, SpecError> {
    if let Some(flattened) = self.flattened.get(&id) {
      return Ok(flattened.clone());
    }

    let source = self.source;
    let node = source.node(id);
    let flattened = match &node.kind {
      SchemaKind::Object => Flattened {
        properties: node.properties.clone(),
        required: node.required.clone(),
        additional_properties: node.additional_properties,
      },
      SchemaKind::Alias { target } => self.flatten(*target)?,
      SchemaKind::AllOf { members } => {
        if !self.in_progress.insert(id) {
          return Err(SpecError::unsupported(
            &node.location,
            "allOf composition includes itself",
          ));
        }
        let merged = self.merge_members(node, members);
        self.in_progress.remove(&id);
        merged?
      }
      _ => {
        return Err(SpecError::unsupported(
          &node.location,
          "allOf member is not an object schema",
        ));
      }
    };

    self.flattened.insert(id, flattened.clone());
    Ok(flattened)
  }

  fn merge_members(&mut self, node: &SchemaNode, members: &[SchemaId]) -> Result<Flattened, SpecError> {
    let source = self.source;
    let mut merged = Flattened::default();

    for &member in members {
      if source.node(member).is_null() {
        continue;
      }
      let part = self.flatten(member)?;
      self.absorb(&mut merged, &part, node)?;
    }

    let own = Flattened {
      properties: node.properties.clone(),
      required: node.required.clone(),
      additional_properties: node.additional_properties,
    };
    self.absorb(&mut merged, &own, node)?;
    Ok(merged)
  }

  fn absorb(&self, merged: &mut Flattened, part: &Flattened, node: &SchemaNode) -> Result<(), SpecError> {
    for (name, &schema) in &part.properties {
      match merged.properties.get(name) {
        None => {
          merged.properties.insert(name.clone(), schema);
        }
        Some(&existing) if existing == schema => {}
        Some(&existing) => {
          let left = shape_fingerprint(self.source, existing);
          let right = shape_fingerprint(self.source, schema);
          if left != right {
            return Err(SpecError::IncompatibleMerge {
              property: name.clone(),
              reason: format!("{left} conflicts with {right}"),
              path: node.location.clone(),
            });
          }
        }
      }
    }
    merged.required.extend(part.required.iter().cloned());
    if merged.additional_properties.is_none() {
      merged.additional_properties = part.additional_properties;
    }
    Ok(())
  }

  fn canonical_union(
    &mut self,
    kind: UnionKind,
    members: &[UnionMember],
    node: &mut SchemaNode,
  ) -> Result<(), SpecError> {
    let source = self.source;
    let mut kept = vec![];
    for member in members {
      if source.node(member.schema).is_null() {
        node.nullable = true;
      } else {
        kept.push(member.schema);
      }
    }

    if kept.is_empty() {
      node.kind = SchemaKind::Primitive(PrimitiveKind::Null);
      node.nullable = true;
      node.discriminator = None;
      return Ok(());
    }

    let mut canonical = Vec::with_capacity(kept.len());
    for schema in kept {
      let tags = match &node.discriminator {
        Some(discriminator) => {
          let mut tags: Vec<String> = discriminator
            .mapping
            .iter()
            .filter(|(_, target)| *target == schema)
            .map(|(tag, _)| tag.clone())
            .collect();
          if tags.is_empty() {
            tags.extend(self.implicit_tag(schema, &discriminator.property));
          }
          if tags.is_empty() {
            return Err(SpecError::unsupported(
              &source.node(schema).location,
              format!(
                "union member has no value for discriminator '{}'",
                discriminator.property
              ),
            ));
          }
          tags
        }
        None => vec![],
      };
      canonical.push(UnionMember { schema, tags });
    }

    node.kind = SchemaKind::Union {
      kind,
      members: canonical,
    };
    Ok(())
  }

  /// Tag of a member the discriminator mapping does not mention: its declared
  /// name, else the single literal its discriminator property allows.
  fn implicit_tag(&mut self, schema: SchemaId, property: &str) -> Option<String> {
    let source = self.source;
    let member = source.node(schema);
    if let Some(name) = &member.name {
      return Some(name.clone());
    }

    let properties = self.flatten(schema).ok()?.properties;
    let tag_schema = source.node(*properties.get(property)?);
    match &tag_schema.kind {
      SchemaKind::Enum { literals } if literals.len() == 1 => literals[0].value.as_str().map(str::to_string),
      _ => None,
    }
  }
}

/// Structural summary used to decide whether two property schemas are the same
/// declaration. Named nodes compare by name, inline nodes by their shape.
fn shape_fingerprint(graph: &SchemaGraph, id: SchemaId) -> Value {
  fingerprint_inner(graph, id, &mut HashSet::new())
}

fn fingerprint_inner(graph: &SchemaGraph, id: SchemaId, visiting: &mut HashSet<SchemaId>) -> Value {
  let node = graph.node(id);
  if let Some(name) = &node.name {
    return json!({ "ref": name });
  }
  if !visiting.insert(id) {
    return json!({ "cycle": id.index() });
  }

  let constraints = serde_json::to_value(&node.constraints).unwrap_or(Value::Null);
  let shape = match &node.kind {
    SchemaKind::Object | SchemaKind::AllOf { .. } => {
      let properties: serde_json::Map<String, Value> = node
        .properties
        .iter()
        .map(|(name, child)| (name.clone(), fingerprint_inner(graph, *child, visiting)))
        .collect();
      json!({ "object": properties, "required": node.required.iter().collect::<Vec<_>>() })
    }
    SchemaKind::Array { items } => {
      json!({ "array": items.map(|items| fingerprint_inner(graph, items, visiting)) })
    }
    SchemaKind::Enum { literals } => {
      json!({ "enum": literals.iter().map(|literal| literal.value.clone()).collect::<Vec<_>>() })
    }
    SchemaKind::Primitive(kind) => json!({ "primitive": kind.to_string(), "format": node.format }),
    SchemaKind::Union { kind, members } => json!({
      "union": kind.to_string(),
      "members": members.iter().map(|member| fingerprint_inner(graph, member.schema, visiting)).collect::<Vec<_>>(),
    }),
    SchemaKind::Alias { target } => fingerprint_inner(graph, *target, visiting),
  };

  visiting.remove(&id);
  json!({ "shape": shape, "constraints": constraints })
}
