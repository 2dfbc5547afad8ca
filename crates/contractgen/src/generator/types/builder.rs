use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use itertools::Itertools;

use super::{
  EnumValueDecl, FieldDecl, PrimitiveType, RuntimeSupport, TypeDecl, TypeId, TypeRef, TypeShape, TypeTable,
  UnionVariantDecl,
};
use crate::generator::{
  config::UnionOverlapPolicy,
  context::BuildContext,
  errors::SpecError,
  naming::{
    Namespace,
    identifiers::to_type_name,
    variants::literal_identifier,
  },
  schema_graph::{Constraints, SchemaGraph, SchemaId, SchemaKind, SchemaNode, UnionMember},
};

/// Base names offered to an inline schema by the place it is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameHint {
  base: String,
  item: String,
}

impl NameHint {
  pub fn new(base: impl Into<String>) -> Self {
    let base = base.into();
    let item = format!("{base}Item");
    Self { base, item }
  }

  /// Hint for a schema declared under `property` of `parent`; array items below
  /// it take the singular form of the property.
  pub fn property(parent: &str, property: &str) -> Self {
    Self {
      base: format!("{parent}{}", to_type_name(property)),
      item: format!("{parent}{}", to_type_name(&cruet::to_singular(property))),
    }
  }

  pub fn base(&self) -> &str {
    &self.base
  }

  fn items(&self) -> Self {
    Self::new(self.item.clone())
  }

  fn values(&self) -> Self {
    Self::new(format!("{}Value", self.base))
  }
}

#[derive(Debug)]
enum SlotState {
  Pending,
  Building,
  Done(Box<TypeDecl>),
  Skipped,
}

#[derive(Debug)]
struct Slot {
  schema: SchemaId,
  name: String,
  state: SlotState,
}

/// Assigns declarations to canonical schema nodes.
///
/// A declaration slot is reserved (and its name claimed) before its body is built,
/// so a cycle reaching the slot again gets a handle instead of recursing. Fields
/// whose target is still being built are marked as back-references.
///
/// Names are claimed in a pass of their own: each declaration claims the inline
/// schemas under it in declaration order, and a `$ref` into another named schema
/// only queues that schema. Build order therefore never decides which inline
/// schema keeps an unsuffixed name.
#[derive(Debug)]
pub struct TypeModelBuilder<'g> {
  graph: &'g SchemaGraph,
  policy: UnionOverlapPolicy,
  slots: Vec<Slot>,
  memo: HashMap<SchemaId, TypeRef>,
  visiting: HashSet<SchemaId>,
  claiming: HashSet<SchemaId>,
  queued: VecDeque<TypeId>,
}

impl<'g> TypeModelBuilder<'g> {
  pub fn new(graph: &'g SchemaGraph, policy: UnionOverlapPolicy) -> Self {
    Self {
      graph,
      policy,
      slots: vec![],
      memo: HashMap::new(),
      visiting: HashSet::new(),
      claiming: HashSet::new(),
      queued: VecDeque::new(),
    }
  }

  pub fn graph(&self) -> &'g SchemaGraph {
    self.graph
  }

  /// Declares every schema in `named`, claiming all of their names before any
  /// inline schema gets one.
  pub fn build_named(&mut self, named: &[SchemaId], ctx: &mut BuildContext) -> Result<(), SpecError> {
    let graph = self.graph;
    let mut reserved = vec![];
    for &schema in named {
      if self.memo.contains_key(&schema) {
        continue;
      }
      let node = graph.node(schema);
      let base = node.name.as_deref().unwrap_or("Unnamed");
      let name = ctx.namespace.claim_type(base, &node.location)?;
      reserved.push(self.reserve(schema, name));
    }

    self.queued.extend(reserved.iter().copied());
    self.claim_queued(ctx)?;

    for slot in reserved {
      self.complete(slot, ctx)?;
    }
    Ok(())
  }

  /// The type of `schema` used at a site described by `hint`.
  pub fn type_ref(&mut self, schema: SchemaId, hint: &NameHint, ctx: &mut BuildContext) -> Result<TypeRef, SpecError> {
    let graph = self.graph;
    let node = graph.node(schema);

    if !self.memo.contains_key(&schema) && self.needs_decl(node) {
      self.claim(schema, hint, ctx)?;
      self.claim_queued(ctx)?;
    }

    if let Some(existing) = self.memo.get(&schema).cloned() {
      if let TypeRef::Named { id, .. } = &existing
        && matches!(self.slots[id.index()].state, SlotState::Pending)
      {
        self.complete(*id, ctx)?;
      }
      return Ok(existing);
    }

    if !self.visiting.insert(schema) {
      return Err(SpecError::unsupported(&node.location, "schema is defined in terms of itself"));
    }
    let resolved = self.structural_ref(node, hint, ctx);
    self.visiting.remove(&schema);

    let ty = resolved?;
    self.memo.insert(schema, ty.clone());
    Ok(ty)
  }

  /// Fields of the object declaration `ty` names, if it names one.
  pub fn object_fields(&self, ty: &TypeRef) -> Option<&[FieldDecl]> {
    let TypeRef::Named { id, .. } = ty else {
      return None;
    };
    match &self.slots.get(id.index())?.state {
      SlotState::Done(decl) => match &decl.shape {
        TypeShape::Object { fields, .. } => Some(fields),
        _ => None,
      },
      _ => None,
    }
  }

  /// Completed declarations with runtime needs propagated through references.
  pub fn finish(self) -> TypeTable {
    let mut decls: Vec<TypeDecl> = self
      .slots
      .into_iter()
      .filter_map(|slot| match slot.state {
        SlotState::Done(decl) => Some(*decl),
        _ => None,
      })
      .collect();

    let edges: BTreeMap<TypeId, Vec<TypeId>> = decls
      .iter()
      .map(|decl| {
        let targets = decl.shape.type_refs().into_iter().filter_map(TypeRef::named_target).collect();
        (decl.id, targets)
      })
      .collect();
    let mut needs: BTreeMap<TypeId, BTreeSet<RuntimeSupport>> =
      decls.iter().map(|decl| (decl.id, decl.runtime.clone())).collect();

    let mut changed = true;
    while changed {
      changed = false;
      for (id, targets) in &edges {
        let inherited: BTreeSet<RuntimeSupport> = targets
          .iter()
          .filter_map(|target| needs.get(target))
          .flatten()
          .copied()
          .collect();
        if let Some(own) = needs.get_mut(id) {
          let before = own.len();
          own.extend(inherited);
          changed |= own.len() != before;
        }
      }
    }

    for decl in &mut decls {
      if let Some(runtime) = needs.remove(&decl.id) {
        decl.runtime = runtime;
      }
    }
    TypeTable::new(decls)
  }

  fn reserve(&mut self, schema: SchemaId, name: String) -> TypeId {
    let id = TypeId(self.slots.len());
    self.memo.insert(schema, TypeRef::Named { id, name: name.clone() });
    self.slots.push(Slot {
      schema,
      name,
      state: SlotState::Pending,
    });
    id
  }

  /// Claims the names of the declarations `schema` introduces at a site described
  /// by `hint`. Named schemas are reserved and queued; inline declarations claim
  /// their own inline children right away.
  fn claim(&mut self, schema: SchemaId, hint: &NameHint, ctx: &mut BuildContext) -> Result<(), SpecError> {
    if self.memo.contains_key(&schema) {
      return Ok(());
    }

    let graph = self.graph;
    let node = graph.node(schema);
    if let Some(declared) = &node.name {
      let name = ctx.namespace.claim_type(declared, &node.location)?;
      let id = self.reserve(schema, name);
      self.queued.push_back(id);
      return Ok(());
    }
    if self.needs_decl(node) {
      let name = ctx.namespace.claim_type(hint.base(), &node.location)?;
      let id = self.reserve(schema, name);
      return self.claim_body(id, ctx);
    }

    if !self.claiming.insert(schema) {
      return Ok(());
    }
    let claimed = match &node.kind {
      SchemaKind::Array { items } => self.claim_optional(*items, &hint.items(), ctx),
      SchemaKind::Object => self.claim_optional(node.additional_properties, &hint.values(), ctx),
      SchemaKind::Alias { target } => self.claim(*target, hint, ctx),
      SchemaKind::Union { members, .. } => match members.as_slice() {
        [member] => self.claim(member.schema, hint, ctx),
        _ => Ok(()),
      },
      SchemaKind::Enum { .. } | SchemaKind::Primitive(_) | SchemaKind::AllOf { .. } => Ok(()),
    };
    self.claiming.remove(&schema);
    claimed
  }

  fn claim_optional(&mut self, schema: Option<SchemaId>, hint: &NameHint, ctx: &mut BuildContext) -> Result<(), SpecError> {
    match schema {
      Some(schema) => self.claim(schema, hint, ctx),
      None => Ok(()),
    }
  }

  /// Claims the inline schemas under the reserved slot `id`, offering each the
  /// hint its body build will use.
  fn claim_body(&mut self, id: TypeId, ctx: &mut BuildContext) -> Result<(), SpecError> {
    let graph = self.graph;
    let slot = &self.slots[id.index()];
    let (node, name) = (graph.node(slot.schema), slot.name.clone());
    let hint = NameHint::new(name.as_str());

    match &node.kind {
      SchemaKind::Object => {
        for (property, &child) in &node.properties {
          self.claim(child, &NameHint::property(&name, property), ctx)?;
        }
        self.claim_optional(node.additional_properties, &hint.values(), ctx)
      }
      SchemaKind::Array { items } => self.claim_optional(*items, &hint.items(), ctx),
      SchemaKind::Alias { target } => self.claim(*target, &hint, ctx),
      SchemaKind::Union { members, .. } => {
        for (index, member) in members.iter().enumerate() {
          let label = variant_label(member, graph.node(member.schema), index);
          self.claim(member.schema, &NameHint::new(format!("{name}{label}")), ctx)?;
        }
        Ok(())
      }
      SchemaKind::Enum { .. } | SchemaKind::Primitive(_) | SchemaKind::AllOf { .. } => Ok(()),
    }
  }

  fn claim_queued(&mut self, ctx: &mut BuildContext) -> Result<(), SpecError> {
    while let Some(id) = self.queued.pop_front() {
      self.claim_body(id, ctx)?;
    }
    Ok(())
  }

  fn needs_decl(&self, node: &SchemaNode) -> bool {
    if node.name.is_some() {
      return true;
    }
    match &node.kind {
      SchemaKind::Object => !node.properties.is_empty(),
      SchemaKind::Enum { .. } => true,
      SchemaKind::Union { members, .. } => members.len() > 1,
      SchemaKind::Array { .. } | SchemaKind::Primitive(_) | SchemaKind::AllOf { .. } | SchemaKind::Alias { .. } => {
        false
      }
    }
  }

  /// Type of an inline node that gets no declaration of its own.
  fn structural_ref(&mut self, node: &SchemaNode, hint: &NameHint, ctx: &mut BuildContext) -> Result<TypeRef, SpecError> {
    match &node.kind {
      SchemaKind::Primitive(kind) => Ok(TypeRef::primitive(PrimitiveType::from_schema(
        *kind,
        node.format.as_deref(),
      ))),
      SchemaKind::Array { items } => Ok(TypeRef::Array {
        items: Box::new(self.items_ref(*items, hint, ctx)?),
        unique: node.unique_items,
      }),
      SchemaKind::Object => Ok(TypeRef::Map {
        values: Box::new(self.values_ref(node.additional_properties, hint, ctx)?),
      }),
      SchemaKind::Alias { target } => self.type_ref(*target, hint, ctx),
      SchemaKind::Union { members, .. } => match members.as_slice() {
        [member] => self.type_ref(member.schema, hint, ctx),
        _ => Ok(TypeRef::any()),
      },
      SchemaKind::Enum { .. } => Ok(TypeRef::any()),
      SchemaKind::AllOf { .. } => Err(SpecError::unsupported(
        &node.location,
        "allOf composition was not merged",
      )),
    }
  }

  fn items_ref(&mut self, items: Option<SchemaId>, hint: &NameHint, ctx: &mut BuildContext) -> Result<TypeRef, SpecError> {
    match items {
      Some(items) => self.type_ref(items, &hint.items(), ctx),
      None => Ok(TypeRef::any()),
    }
  }

  fn values_ref(&mut self, values: Option<SchemaId>, hint: &NameHint, ctx: &mut BuildContext) -> Result<TypeRef, SpecError> {
    match values {
      Some(values) => self.type_ref(values, &hint.values(), ctx),
      None => Ok(TypeRef::any()),
    }
  }

  /// Builds the body of a reserved slot. Shape errors are recorded and leave the
  /// slot empty; only a namespace failure propagates.
  fn complete(&mut self, id: TypeId, ctx: &mut BuildContext) -> Result<(), SpecError> {
    let slot = &mut self.slots[id.index()];
    if !matches!(slot.state, SlotState::Pending) {
      return Ok(());
    }
    slot.state = SlotState::Building;
    let (schema, name) = (slot.schema, slot.name.clone());

    let state = match self.declare(id, schema, &name, ctx) {
      Ok(decl) => SlotState::Done(Box::new(decl)),
      Err(err @ SpecError::NameCollisionExhausted { .. }) => return Err(err),
      Err(err) => {
        ctx.diagnostics.error(&err);
        SlotState::Skipped
      }
    };
    self.slots[id.index()].state = state;
    Ok(())
  }

  fn declare(&mut self, id: TypeId, schema: SchemaId, name: &str, ctx: &mut BuildContext) -> Result<TypeDecl, SpecError> {
    let graph = self.graph;
    let node = graph.node(schema);
    let hint = NameHint::new(name);

    let (shape, constraints) = match &node.kind {
      SchemaKind::Object => (self.object_shape(node, name, ctx)?, Constraints::default()),
      SchemaKind::Enum { literals } => {
        let values = literals
          .iter()
          .enumerate()
          .map(|(index, literal)| EnumValueDecl {
            ident: literal
              .ident
              .clone()
              .unwrap_or_else(|| literal_identifier(&literal.value, index)),
            value: literal.value.clone(),
          })
          .collect();
        (TypeShape::Enum { values }, Constraints::default())
      }
      SchemaKind::Array { items } => (
        TypeShape::Array {
          items: self.items_ref(*items, &hint, ctx)?,
          unique: node.unique_items,
        },
        node.constraints.clone(),
      ),
      SchemaKind::Primitive(kind) => (
        TypeShape::Alias {
          target: TypeRef::primitive(PrimitiveType::from_schema(*kind, node.format.as_deref())),
        },
        node.constraints.clone(),
      ),
      SchemaKind::Alias { target } => (
        TypeShape::Alias {
          target: self.type_ref(*target, &hint, ctx)?,
        },
        node.constraints.clone(),
      ),
      SchemaKind::Union { kind, members } => {
        let discriminator = node.discriminator.as_ref().map(|d| d.property.clone());
        let variants = self.union_variants(node, name, members, discriminator.is_some(), ctx)?;
        (
          TypeShape::Union {
            kind: *kind,
            discriminator,
            variants,
          },
          Constraints::default(),
        )
      }
      SchemaKind::AllOf { .. } => {
        return Err(SpecError::unsupported(&node.location, "allOf composition was not merged"));
      }
    };

    let mut runtime = BTreeSet::new();
    if shape
      .type_refs()
      .iter()
      .any(|ty| ty.primitive_leaf().is_some_and(PrimitiveType::is_temporal))
    {
      runtime.insert(RuntimeSupport::DateTimeCodec);
    }
    let constrained_fields = match &shape {
      TypeShape::Object { fields, .. } => fields.iter().any(|field| !field.constraints.is_empty()),
      _ => false,
    };
    if constrained_fields || !constraints.is_empty() {
      runtime.insert(RuntimeSupport::ValidationFailure);
    }

    Ok(
      TypeDecl::builder()
        .id(id)
        .qualified_name(name.to_string())
        .shape(shape)
        .source_schema_path(node.location.clone())
        .maybe_description(node.description.clone())
        .nullable(node.nullable)
        .deprecated(node.deprecated)
        .constraints(constraints)
        .runtime(runtime)
        .build(),
    )
  }

  fn object_shape(&mut self, node: &SchemaNode, name: &str, ctx: &mut BuildContext) -> Result<TypeShape, SpecError> {
    let graph = self.graph;
    let mut members = Namespace::new();
    let mut fields = Vec::with_capacity(node.properties.len());

    for (property, &child) in &node.properties {
      let ty = self.type_ref(child, &NameHint::property(name, property), ctx)?;
      let child_node = graph.node(child);
      let back_reference = ty
        .named_target()
        .is_some_and(|target| matches!(self.slots[target.index()].state, SlotState::Building));
      let constraints = if matches!(ty, TypeRef::Named { .. }) {
        Constraints::default()
      } else {
        child_node.constraints.clone()
      };

      fields.push(
        FieldDecl::builder()
          .name(property.clone())
          .ident(members.claim_member(property, &child_node.location)?)
          .ty(ty)
          .required(node.required.contains(property))
          .nullable(child_node.nullable)
          .constraints(constraints)
          .maybe_description(child_node.description.clone())
          .maybe_default(child_node.default.clone())
          .deprecated(child_node.deprecated)
          .read_only(child_node.read_only)
          .write_only(child_node.write_only)
          .back_reference(back_reference)
          .build(),
      );
    }

    let additional_properties = match node.additional_properties {
      Some(values) => Some(self.type_ref(values, &NameHint::new(name).values(), ctx)?),
      None => None,
    };

    Ok(TypeShape::Object {
      fields,
      additional_properties,
    })
  }

  fn union_variants(
    &mut self,
    node: &SchemaNode,
    name: &str,
    members: &[UnionMember],
    discriminated: bool,
    ctx: &mut BuildContext,
  ) -> Result<Vec<UnionVariantDecl>, SpecError> {
    let graph = self.graph;
    if discriminated {
      if let Some(member) = members.iter().find(|member| self.object_properties(member.schema).is_none()) {
        return Err(SpecError::unsupported(
          &graph.node(member.schema).location,
          format!("member of discriminated union '{name}' is not an object schema"),
        ));
      }
    } else {
      self.check_overlap(node, name, members, ctx)?;
    }

    let mut idents = Namespace::new();
    let mut variants = Vec::with_capacity(members.len());
    for (index, member) in members.iter().enumerate() {
      let member_node = graph.node(member.schema);
      let label = variant_label(member, member_node, index);

      let ty = self.type_ref(member.schema, &NameHint::new(format!("{name}{label}")), ctx)?;
      let ident_base = match (&ty, member.tags.first(), &member_node.title) {
        (_, Some(tag), _) => to_type_name(tag),
        (TypeRef::Named { name, .. }, None, _) => name.clone(),
        (_, None, Some(title)) => to_type_name(title),
        (TypeRef::Primitive { primitive }, None, None) => to_type_name(primitive.as_str()),
        _ => format!("Variant{}", index + 1),
      };

      variants.push(UnionVariantDecl {
        ident: idents.claim(&ident_base, "", &member_node.location)?,
        ty,
        tags: member.tags.clone(),
      });
    }
    Ok(variants)
  }

  /// Property names of an object-shaped member, looking through aliases.
  fn object_properties(&self, schema: SchemaId) -> Option<BTreeSet<&'g str>> {
    let graph = self.graph;
    let mut current = schema;
    let mut seen = HashSet::new();
    loop {
      let node = graph.node(current);
      match &node.kind {
        SchemaKind::Object => return Some(node.properties.keys().map(String::as_str).collect()),
        SchemaKind::Alias { target } if seen.insert(current) => current = *target,
        _ => return None,
      }
    }
  }

  fn check_overlap(
    &self,
    node: &SchemaNode,
    name: &str,
    members: &[UnionMember],
    ctx: &mut BuildContext,
  ) -> Result<(), SpecError> {
    let shapes: Vec<(usize, BTreeSet<&str>)> = members
      .iter()
      .enumerate()
      .filter_map(|(index, member)| Some((index, self.object_properties(member.schema)?)))
      .filter(|(_, properties)| !properties.is_empty())
      .collect();

    for ((left, left_props), (right, right_props)) in shapes.iter().tuple_combinations() {
      if !(left_props.is_subset(right_props) || right_props.is_subset(left_props)) {
        continue;
      }
      let message = format!(
        "members {} and {} of union '{name}' overlap structurally",
        left + 1,
        right + 1
      );
      match self.policy {
        UnionOverlapPolicy::KeepStructural => ctx.diagnostics.warn(&node.location, message),
        UnionOverlapPolicy::Reject => return Err(SpecError::unsupported(&node.location, message)),
      }
    }
    Ok(())
  }
}

/// Name suffix of an inline union member: its tag, else its title, else its
/// position.
fn variant_label(member: &UnionMember, node: &SchemaNode, index: usize) -> String {
  member
    .tags
    .first()
    .or(node.title.as_ref())
    .map_or_else(|| format!("Variant{}", index + 1), |label| to_type_name(label))
}
