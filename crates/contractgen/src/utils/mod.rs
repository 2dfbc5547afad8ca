pub mod refs;
pub mod spec;

pub use refs::Location;
pub use spec::{DocumentSet, DocumentSource, SpecFormat, SpecLoader, load_documents};
