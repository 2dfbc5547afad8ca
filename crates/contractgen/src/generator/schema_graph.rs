//! Arena of resolved schema nodes.
//!
//! Nodes reference each other through [`SchemaId`] handles, so a cyclic schema is
//! a back-edge to a node already in the arena and never a nested copy.

use std::{collections::BTreeSet, ops::Index};

use indexmap::{IndexMap, IndexSet};
use petgraph::{algo::kosaraju_scc, graphmap::DiGraphMap, visit::Dfs};
use serde::Serialize;
use serde_json::{Number, Value};
use strum::Display;

use crate::generator::diagnostics::SourcePath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SchemaId(usize);

impl SchemaId {
  pub fn index(self) -> usize {
    self.0
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
  String,
  Integer,
  Number,
  Boolean,
  Null,
  Any,
}

/// Validation facts carried through unevaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pattern: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub minimum: Option<Number>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub maximum: Option<Number>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub exclusive_minimum: Option<Number>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub exclusive_maximum: Option<Number>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub multiple_of: Option<Number>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub min_length: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_length: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub min_items: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_items: Option<u64>,
}

impl Constraints {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumLiteral {
  pub value: Value,
  /// Identifier assigned by normalization; `None` straight out of resolution.
  pub ident: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnionKind {
  #[strum(serialize = "oneOf")]
  OneOf,
  #[strum(serialize = "anyOf")]
  AnyOf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionMember {
  pub schema: SchemaId,
  /// Discriminator values that select this member, empty for structural unions.
  pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminator {
  pub property: String,
  pub mapping: Vec<(String, SchemaId)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaKind {
  Object,
  Array { items: Option<SchemaId> },
  Enum { literals: Vec<EnumLiteral> },
  Primitive(PrimitiveKind),
  Union { kind: UnionKind, members: Vec<UnionMember> },
  AllOf { members: Vec<SchemaId> },
  /// Stands for another node; produced by normalization for single-member `allOf`.
  Alias { target: SchemaId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
  pub kind: SchemaKind,
  pub location: SourcePath,
  /// Top-level declared name, `None` for inline schemas.
  pub name: Option<String>,
  pub properties: IndexMap<String, SchemaId>,
  pub required: IndexSet<String>,
  pub additional_properties: Option<SchemaId>,
  pub discriminator: Option<Discriminator>,
  pub constraints: Constraints,
  pub format: Option<String>,
  pub unique_items: bool,
  pub nullable: bool,
  pub title: Option<String>,
  pub description: Option<String>,
  pub default: Option<Value>,
  pub deprecated: bool,
  pub read_only: bool,
  pub write_only: bool,
}

impl SchemaNode {
  pub fn new(kind: SchemaKind, location: SourcePath) -> Self {
    Self {
      kind,
      location,
      name: None,
      properties: IndexMap::new(),
      required: IndexSet::new(),
      additional_properties: None,
      discriminator: None,
      constraints: Constraints::default(),
      format: None,
      unique_items: false,
      nullable: false,
      title: None,
      description: None,
      default: None,
      deprecated: false,
      read_only: false,
      write_only: false,
    }
  }

  pub fn is_null(&self) -> bool {
    matches!(self.kind, SchemaKind::Primitive(PrimitiveKind::Null))
  }

  /// Outgoing edges in a stable order.
  pub fn children(&self) -> Vec<SchemaId> {
    let mut children: Vec<SchemaId> = self.properties.values().copied().collect();
    match &self.kind {
      SchemaKind::Array { items: Some(items) } => children.push(*items),
      SchemaKind::Union { members, .. } => children.extend(members.iter().map(|member| member.schema)),
      SchemaKind::AllOf { members } => children.extend(members.iter().copied()),
      SchemaKind::Alias { target } => children.push(*target),
      SchemaKind::Object | SchemaKind::Array { items: None } | SchemaKind::Enum { .. } | SchemaKind::Primitive(_) => {}
    }
    children.extend(self.additional_properties);
    if let Some(discriminator) = &self.discriminator {
      children.extend(discriminator.mapping.iter().map(|(_, target)| *target));
    }
    children
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaGraph {
  nodes: Vec<SchemaNode>,
}

impl SchemaGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Claims a slot for a node whose children are not materialized yet.
  pub(crate) fn reserve(&mut self, location: SourcePath) -> SchemaId {
    self.push(SchemaNode::new(SchemaKind::Primitive(PrimitiveKind::Any), location))
  }

  pub(crate) fn fill(&mut self, id: SchemaId, node: SchemaNode) {
    self.nodes[id.0] = node;
  }

  pub(crate) fn push(&mut self, node: SchemaNode) -> SchemaId {
    let id = SchemaId(self.nodes.len());
    self.nodes.push(node);
    id
  }

  pub fn node(&self, id: SchemaId) -> &SchemaNode {
    &self.nodes[id.0]
  }

  pub(crate) fn node_mut(&mut self, id: SchemaId) -> &mut SchemaNode {
    &mut self.nodes[id.0]
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn ids(&self) -> impl Iterator<Item = SchemaId> + use<> {
    (0..self.nodes.len()).map(SchemaId)
  }

  pub fn iter(&self) -> impl Iterator<Item = (SchemaId, &SchemaNode)> {
    self.nodes.iter().enumerate().map(|(index, node)| (SchemaId(index), node))
  }

  fn dependency_graph(&self) -> DiGraphMap<SchemaId, ()> {
    let mut graph = DiGraphMap::new();
    for (id, node) in self.iter() {
      graph.add_node(id);
      for child in node.children() {
        graph.add_edge(id, child, ());
      }
    }
    graph
  }

  /// Strongly connected groups of nodes that reference themselves, each sorted by
  /// id, ordered by their smallest member.
  pub fn detect_cycles(&self) -> Vec<Vec<SchemaId>> {
    let graph = self.dependency_graph();
    let mut cycles: Vec<Vec<SchemaId>> = kosaraju_scc(&graph)
      .into_iter()
      .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
      .map(|mut scc| {
        scc.sort();
        scc
      })
      .collect();
    cycles.sort();
    cycles
  }

  pub fn reachable_from(&self, roots: impl IntoIterator<Item = SchemaId>) -> BTreeSet<SchemaId> {
    let graph = self.dependency_graph();
    let mut reachable = BTreeSet::new();
    for root in roots {
      if reachable.contains(&root) || !graph.contains_node(root) {
        continue;
      }
      let mut dfs = Dfs::new(&graph, root);
      while let Some(node) = dfs.next(&graph) {
        reachable.insert(node);
      }
    }
    reachable
  }
}

impl Index<SchemaId> for SchemaGraph {
  type Output = SchemaNode;

  fn index(&self, id: SchemaId) -> &Self::Output {
    self.node(id)
  }
}
