pub mod identifiers;
pub mod namespace;
pub mod operations;
pub mod responses;
pub mod variants;

pub use namespace::Namespace;

#[cfg(test)]
mod tests;
