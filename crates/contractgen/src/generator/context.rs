use crate::generator::{diagnostics::Diagnostics, naming::Namespace};

/// Mutable state of one generation run, threaded through every builder call.
#[derive(Debug, Default)]
pub struct BuildContext {
  pub namespace: Namespace,
  pub diagnostics: Diagnostics,
}

impl BuildContext {
  pub fn new() -> Self {
    Self::default()
  }
}
