//! Contract-first compiler from OpenAPI documents to a deterministic, typed
//! intermediate representation.
//!
//! The pipeline runs four stages in sequence (reference resolution, schema
//! normalization, type model building, operation model building) and hands an
//! immutable [`generator::ir::Ir`] snapshot to a [`generator::render::Renderer`].
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]

pub mod generator;
pub mod utils;
