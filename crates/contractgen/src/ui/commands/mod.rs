pub mod generate;
pub mod list;

pub use generate::{GenerateConfig, generate};
pub use list::{list_operations, list_types};
