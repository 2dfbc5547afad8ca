use std::path::{Component, Path};

use percent_encoding::percent_decode_str;

use crate::generator::diagnostics::SourcePath;

/// A position in the document set: which document, and which JSON pointer inside it.
///
/// Locations are the identity used to memoize resolution, so two `$ref`s that name
/// the same fragment through different spellings (`#/a/b` from the root, or
/// `root.json#/a/b` from a sibling file) compare equal once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
  pub document: String,
  pub pointer: String,
}

impl Location {
  pub fn root(document: impl Into<String>) -> Self {
    Self {
      document: document.into(),
      pointer: String::new(),
    }
  }

  #[must_use]
  pub fn child<I, S>(&self, tokens: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut pointer = self.pointer.clone();
    for token in tokens {
      pointer.push('/');
      pointer.push_str(&escape_token(token.as_ref()));
    }
    Self {
      document: self.document.clone(),
      pointer,
    }
  }

  pub fn tokens(&self) -> Vec<String> {
    self.pointer.split('/').skip(1).map(unescape_token).collect()
  }

  pub fn source_path(&self) -> SourcePath {
    SourcePath::new(&self.document, &self.pointer)
  }

  /// The name a schema at this location is declared under, if it is declared at
  /// the top level of a document rather than inline.
  ///
  /// Component maps (`components/schemas`, `definitions`, `$defs`) name their
  /// entries; in an external document a first-level key or the whole file does.
  pub fn declared_name(&self, root_document: &str) -> Option<String> {
    let tokens = self.tokens();
    match tokens.as_slice() {
      [components, schemas, name] if components == "components" && schemas == "schemas" => Some(name.clone()),
      [definitions, name] if definitions == "definitions" || definitions == "$defs" => Some(name.clone()),
      [name] if self.document != root_document => Some(name.clone()),
      [] if self.document != root_document => Path::new(&self.document)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned()),
      _ => None,
    }
  }
}

/// Parses a `$ref` value relative to the location that declares it.
///
/// Returns `None` when the reference uses a form that cannot address a JSON
/// fragment (plain-name anchors, undecodable percent escapes).
pub fn resolve_ref(reference: &str, declared_at: &Location) -> Option<Location> {
  let (document, fragment) = match reference.split_once('#') {
    Some((document, fragment)) => (document, fragment),
    None => (reference, ""),
  };

  let pointer = percent_decode_str(fragment).decode_utf8().ok()?.into_owned();
  if !pointer.is_empty() && !pointer.starts_with('/') {
    return None;
  }

  Some(Location {
    document: join_document(&declared_at.document, document),
    pointer,
  })
}

/// Resolves `relative` against the directory of `base`, lexically.
///
/// An empty `relative` designates `base` itself.
pub fn join_document(base: &str, relative: &str) -> String {
  if relative.is_empty() {
    return base.to_string();
  }

  let absolute = relative.starts_with('/');
  let joined = if absolute {
    Path::new(relative).to_path_buf()
  } else {
    Path::new(base).parent().unwrap_or_else(|| Path::new("")).join(relative)
  };

  let mut parts: Vec<String> = vec![];
  for component in joined.components() {
    match component {
      Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
      Component::ParentDir => {
        if parts.last().is_some_and(|last| last != "..") {
          parts.pop();
        } else if !absolute {
          parts.push("..".to_string());
        }
      }
      Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
    }
  }

  let joined = parts.join("/");
  if absolute { format!("/{joined}") } else { joined }
}

pub fn escape_token(token: &str) -> String {
  token.replace('~', "~0").replace('/', "~1")
}

pub fn unescape_token(token: &str) -> String {
  token.replace("~1", "/").replace("~0", "~")
}
