use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::{
  ContentCategory, FormField, HeaderDecl, OperationDecl, ParameterDecl, ParameterLocation, PathTemplate,
  RequestBodyVariant, ResponseVariant, StatusCode, normalize_content_type,
};
use crate::generator::{
  config::GenerationTarget,
  context::BuildContext,
  errors::SpecError,
  naming::{Namespace, identifiers::to_type_name, operations::compute_stable_id},
  resolver::{MediaSkeleton, OperationSkeleton, ParameterSkeleton, RequestBodySkeleton, ResponseSkeleton},
  schema_graph::{Constraints, SchemaId},
  types::{NameHint, PrimitiveType, RuntimeSupport, TypeModelBuilder, TypeRef},
};

/// Binds operation skeletons to types, building the inline types they declare
/// through the same [`TypeModelBuilder`] (and so the same namespace) as the
/// component schemas.
pub struct OperationModelBuilder<'b, 'g> {
  types: &'b mut TypeModelBuilder<'g>,
  target: GenerationTarget,
}

impl<'b, 'g> OperationModelBuilder<'b, 'g> {
  pub fn new(types: &'b mut TypeModelBuilder<'g>, target: GenerationTarget) -> Self {
    Self { types, target }
  }

  /// Builds every operation in order. An operation with a recoverable error is
  /// recorded and left out; a namespace failure halts.
  pub fn build(mut self, operations: &[OperationSkeleton], ctx: &mut BuildContext) -> Result<Vec<OperationDecl>, SpecError> {
    let mut built = vec![];
    for operation in operations {
      match self.operation(operation, ctx) {
        Ok(decl) => built.push(decl),
        Err(err @ SpecError::NameCollisionExhausted { .. }) => return Err(err),
        Err(err) => ctx.diagnostics.error(&err),
      }
    }
    Ok(built)
  }

  fn operation(&mut self, skeleton: &OperationSkeleton, ctx: &mut BuildContext) -> Result<OperationDecl, SpecError> {
    let method = skeleton.method.as_str();
    let stable_id = compute_stable_id(method, skeleton.path.as_str(), skeleton.operation_id.as_deref());
    let segments = PathTemplate::parse(&skeleton.path)
      .map_err(|err| SpecError::invalid(&skeleton.source, format!("path template '{}': {err}", skeleton.path)))?;
    Self::check_path_parameters(&stable_id, skeleton, &segments, ctx)?;

    let name = ctx.namespace.claim_member(&stable_id, &skeleton.source)?;
    let type_base = to_type_name(&name);

    let parameters = self.parameters(&type_base, &skeleton.parameters, ctx)?;
    let request_body_variants = match &skeleton.request_body {
      Some(body) => self.request_body(&type_base, body, ctx)?,
      None => vec![],
    };
    let response_variants = self.responses(&name, &type_base, &skeleton.responses, ctx)?;

    let mut runtime = BTreeSet::new();
    if !response_variants.is_empty() {
      runtime.insert(RuntimeSupport::ResponseWrapper { binding: self.target });
    }
    if parameters.iter().any(|parameter| !parameter.constraints.is_empty()) {
      runtime.insert(RuntimeSupport::ValidationFailure);
    }

    Ok(OperationDecl {
      name,
      stable_id,
      method: method.to_string(),
      path: skeleton.path.clone(),
      segments,
      operation_id: skeleton.operation_id.clone(),
      summary: skeleton.summary.clone(),
      description: skeleton.description.clone(),
      tags: skeleton.tags.clone(),
      deprecated: skeleton.deprecated,
      parameters,
      request_body_variants,
      response_variants,
      runtime,
      source: skeleton.source.clone(),
    })
  }

  fn check_path_parameters(
    stable_id: &str,
    skeleton: &OperationSkeleton,
    segments: &PathTemplate,
    ctx: &mut BuildContext,
  ) -> Result<(), SpecError> {
    let template: Vec<&str> = segments.params();
    let declared: HashSet<&str> = skeleton
      .parameters
      .iter()
      .filter(|parameter| ParameterLocation::from(parameter.location) == ParameterLocation::Path)
      .map(|parameter| parameter.name.as_str())
      .collect();

    if let Some(missing) = template.iter().find(|param| !declared.contains(*param)) {
      return Err(SpecError::MissingPathParameter {
        operation: stable_id.to_string(),
        parameter: (*missing).to_string(),
        path: skeleton.source.clone(),
      });
    }

    for parameter in &skeleton.parameters {
      if ParameterLocation::from(parameter.location) == ParameterLocation::Path
        && !template.contains(&parameter.name.as_str())
      {
        ctx.diagnostics.warn(
          &parameter.source,
          format!("path parameter '{}' does not appear in '{}'", parameter.name, skeleton.path),
        );
      }
    }
    Ok(())
  }

  fn parameters(
    &mut self,
    type_base: &str,
    skeletons: &[ParameterSkeleton],
    ctx: &mut BuildContext,
  ) -> Result<Vec<ParameterDecl>, SpecError> {
    let mut locations_by_name: BTreeMap<&str, BTreeSet<ParameterLocation>> = BTreeMap::new();
    for parameter in skeletons {
      locations_by_name
        .entry(parameter.name.as_str())
        .or_default()
        .insert(parameter.location.into());
    }

    let mut idents = Namespace::new();
    let mut parameters = Vec::with_capacity(skeletons.len());
    for skeleton in skeletons {
      let location = ParameterLocation::from(skeleton.location);
      let repeated = locations_by_name
        .get(skeleton.name.as_str())
        .is_some_and(|locations| locations.len() > 1);
      let base = if repeated {
        format!("{}_in_{location}", skeleton.name)
      } else {
        skeleton.name.clone()
      };

      let required = if location == ParameterLocation::Path {
        if !skeleton.required {
          ctx.diagnostics.warn(
            &skeleton.source,
            format!("path parameter '{}' is always required", skeleton.name),
          );
        }
        true
      } else {
        skeleton.required
      };

      let hint = NameHint::new(format!("{type_base}{}", to_type_name(&skeleton.name)));
      let (ty, nullable, constraints) = match skeleton.schema {
        Some(schema) => self.schema_use(schema, &hint, ctx)?,
        None => {
          ctx.diagnostics.warn(
            &skeleton.source,
            format!("parameter '{}' declares no schema and is treated as a string", skeleton.name),
          );
          (TypeRef::primitive(PrimitiveType::String), false, Constraints::default())
        }
      };

      parameters.push(ParameterDecl {
        spec_name: skeleton.name.clone(),
        ident: idents.claim_member(&base, &skeleton.source)?,
        location,
        ty,
        required,
        nullable,
        deprecated: skeleton.deprecated,
        description: skeleton.description.clone(),
        style: skeleton.style.clone(),
        explode: skeleton.explode,
        constraints,
      });
    }

    parameters.sort_by_key(|parameter| parameter.location);
    Ok(parameters)
  }

  /// Type, nullability and inline constraints of a schema at a use site.
  fn schema_use(
    &mut self,
    schema: SchemaId,
    hint: &NameHint,
    ctx: &mut BuildContext,
  ) -> Result<(TypeRef, bool, Constraints), SpecError> {
    let ty = self.types.type_ref(schema, hint, ctx)?;
    let node = self.types.graph().node(schema);
    let constraints = if matches!(ty, TypeRef::Named { .. }) {
      Constraints::default()
    } else {
      node.constraints.clone()
    };
    Ok((ty, node.nullable, constraints))
  }

  fn request_body(
    &mut self,
    type_base: &str,
    body: &RequestBodySkeleton,
    ctx: &mut BuildContext,
  ) -> Result<Vec<RequestBodyVariant>, SpecError> {
    let graph = self.types.graph();
    let inline_count = body
      .content
      .iter()
      .filter_map(|media| media.schema)
      .filter(|schema| graph.node(*schema).name.is_none())
      .count();

    let mut seen = HashSet::new();
    let mut variants = vec![];
    for media in &body.content {
      let essence = normalize_content_type(&media.content_type);
      if !seen.insert(essence.clone()) {
        ctx.diagnostics.warn(
          &media.source,
          format!("request body media type '{}' repeats '{essence}' and is skipped", media.content_type),
        );
        continue;
      }

      let category = ContentCategory::from_content_type(&essence);
      let base = if inline_count > 1 {
        format!("{type_base}RequestBody{}", category.label())
      } else {
        format!("{type_base}RequestBody")
      };
      let ty = match media.schema {
        Some(schema) => Some(self.types.type_ref(schema, &NameHint::new(base), ctx)?),
        None => None,
      };
      let form_fields = match &ty {
        Some(ty) if category.is_form() => self.form_fields(ty, media),
        _ => vec![],
      };

      variants.push(RequestBodyVariant {
        content_type: essence,
        category,
        ty,
        form_fields,
        required: body.required,
      });
    }
    Ok(variants)
  }

  fn form_fields(&self, ty: &TypeRef, media: &MediaSkeleton) -> Vec<FormField> {
    self
      .types
      .object_fields(ty)
      .unwrap_or_default()
      .iter()
      .map(|field| FormField {
        name: field.name.clone(),
        ident: field.ident.clone(),
        ty: field.ty.clone(),
        required: field.required,
        content_type: media.encoding.get(&field.name).cloned().flatten(),
      })
      .collect()
  }

  fn responses(
    &mut self,
    operation: &str,
    type_base: &str,
    skeletons: &[ResponseSkeleton],
    ctx: &mut BuildContext,
  ) -> Result<Vec<ResponseVariant>, SpecError> {
    let mut idents = Namespace::new();
    let mut seen: HashSet<(StatusCode, Option<String>)> = HashSet::new();
    let mut variants = vec![];

    for response in skeletons {
      let status = StatusCode::parse(&response.status).ok_or_else(|| {
        SpecError::invalid(
          &response.source,
          format!("response key '{}' is not a status code, range, or 'default'", response.status),
        )
      })?;
      let headers = self.headers(type_base, response, ctx)?;
      let status_name = status.variant_name();

      if response.content.is_empty() {
        Self::claim_variant(operation, (status, None), &mut seen, response)?;
        variants.push(ResponseVariant {
          ident: idents.claim(&status_name, "", &response.source)?,
          status,
          content_type: None,
          category: None,
          ty: None,
          has_no_content: true,
          description: response.description.clone(),
          headers,
        });
        continue;
      }

      let several = response.content.len() > 1;
      for media in &response.content {
        let essence = normalize_content_type(&media.content_type);
        Self::claim_variant(operation, (status, Some(essence.clone())), &mut seen, response)?;

        let category = ContentCategory::from_content_type(&essence);
        let base = if several {
          format!("{status_name}{}", category.variant_suffix())
        } else {
          status_name.clone()
        };
        let ident = idents.claim(&base, "", &media.source)?;
        let ty = match media.schema {
          Some(schema) => Some(
            self
              .types
              .type_ref(schema, &NameHint::new(format!("{type_base}{ident}Response")), ctx)?,
          ),
          None => None,
        };

        variants.push(ResponseVariant {
          ident,
          status,
          content_type: Some(essence),
          category: Some(category),
          ty,
          has_no_content: false,
          description: response.description.clone(),
          headers: headers.clone(),
        });
      }
    }
    Ok(variants)
  }

  fn claim_variant(
    operation: &str,
    key: (StatusCode, Option<String>),
    seen: &mut HashSet<(StatusCode, Option<String>)>,
    response: &ResponseSkeleton,
  ) -> Result<(), SpecError> {
    if seen.contains(&key) {
      return Err(SpecError::DuplicateResponseVariant {
        operation: operation.to_string(),
        status: key.0.to_string(),
        content_type: key.1.unwrap_or_else(|| "no content".to_string()),
        path: response.source.clone(),
      });
    }
    seen.insert(key);
    Ok(())
  }

  fn headers(&mut self, type_base: &str, response: &ResponseSkeleton, ctx: &mut BuildContext) -> Result<Vec<HeaderDecl>, SpecError> {
    let mut idents = Namespace::new();
    let mut headers = Vec::with_capacity(response.headers.len());
    for header in &response.headers {
      let ty = match header.schema {
        Some(schema) => self.types.type_ref(schema, &NameHint::new(format!("{type_base}{}", to_type_name(&header.name))), ctx)?,
        None => TypeRef::primitive(PrimitiveType::String),
      };
      headers.push(HeaderDecl {
        name: header.name.clone(),
        ident: idents.claim_member(&header.name, &header.source)?,
        ty,
        required: header.required,
        description: header.description.clone(),
      });
    }
    Ok(headers)
  }
}
