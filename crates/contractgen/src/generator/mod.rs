pub mod config;
pub mod context;
pub mod diagnostics;
pub mod document;
pub mod errors;
pub mod ir;
pub mod metrics;
pub mod naming;
pub mod normalizer;
pub mod operations;
pub mod orchestrator;
pub mod render;
pub mod resolver;
pub mod schema_graph;
pub mod types;

#[cfg(test)]
mod tests;
