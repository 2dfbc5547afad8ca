use std::{
  collections::{BTreeMap, BTreeSet},
  ffi::OsStr,
  path::{Path, PathBuf},
};

use anyhow::Context;
use fmmap::tokio::{AsyncMmapFile, AsyncMmapFileExt};
use indexmap::IndexMap;
use serde_json::Value;

use crate::utils::refs::{Location, resolve_ref};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecFormat {
  #[default]
  Json,
  Yaml,
}

impl SpecFormat {
  #[must_use]
  pub fn from_extension(ext: &str) -> Self {
    match ext {
      "yaml" | "yml" => Self::Yaml,
      _ => Self::Json,
    }
  }

  #[must_use]
  pub fn from_path(path: &Path) -> Self {
    path
      .extension()
      .and_then(OsStr::to_str)
      .map_or(Self::default(), Self::from_extension)
  }
}

pub struct SpecLoader {
  file: AsyncMmapFile,
  format: SpecFormat,
}

impl SpecLoader {
  pub async fn open(path: &Path) -> anyhow::Result<Self> {
    let format = SpecFormat::from_path(path);
    let file = AsyncMmapFile::open(path)
      .await
      .with_context(|| format!("opening {}", path.display()))?;

    Ok(Self { file, format })
  }

  pub fn parse(&self) -> anyhow::Result<Value> {
    parse_document(self.file.as_slice(), self.format)
  }
}

pub fn parse_document(bytes: &[u8], format: SpecFormat) -> anyhow::Result<Value> {
  match format {
    SpecFormat::Json => Ok(serde_json::from_slice(bytes)?),
    SpecFormat::Yaml => {
      let yaml: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
      yaml_to_json(yaml)
    }
  }
}

/// YAML allows non-string mapping keys (`200:` in a responses map); JSON pointers
/// address them by their text, so keys are converted to strings here.
fn yaml_to_json(value: serde_yaml::Value) -> anyhow::Result<Value> {
  use serde_yaml::Value as Yaml;

  Ok(match value {
    Yaml::Null => Value::Null,
    Yaml::Bool(flag) => Value::Bool(flag),
    Yaml::Number(number) => {
      if let Some(int) = number.as_i64() {
        Value::from(int)
      } else if let Some(uint) = number.as_u64() {
        Value::from(uint)
      } else {
        number
          .as_f64()
          .and_then(serde_json::Number::from_f64)
          .map_or(Value::Null, Value::Number)
      }
    }
    Yaml::String(text) => Value::String(text),
    Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect::<anyhow::Result<_>>()?),
    Yaml::Mapping(mapping) => {
      let mut map = serde_json::Map::new();
      for (key, value) in mapping {
        map.insert(yaml_key(key)?, yaml_to_json(value)?);
      }
      Value::Object(map)
    }
    Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
  })
}

fn yaml_key(key: serde_yaml::Value) -> anyhow::Result<String> {
  use serde_yaml::Value as Yaml;

  match key {
    Yaml::String(text) => Ok(text),
    Yaml::Number(number) => Ok(number.to_string()),
    Yaml::Bool(flag) => Ok(flag.to_string()),
    Yaml::Null => Ok("null".to_string()),
    other => anyhow::bail!("unsupported mapping key {other:?}"),
  }
}

/// Read access to the documents a generation run may reference.
///
/// Resolution never performs I/O; every document it can see has been loaded up
/// front by whoever built the source.
pub trait DocumentSource {
  fn root(&self) -> &str;

  fn document(&self, name: &str) -> Option<&Value>;

  /// Why a referenced document is absent, when loading it was attempted.
  fn unavailable_reason(&self, _name: &str) -> Option<&str> {
    None
  }
}

/// In-memory document source keyed by document path relative to the root's directory.
#[derive(Debug, Clone)]
pub struct DocumentSet {
  root: String,
  documents: IndexMap<String, Value>,
  unavailable: BTreeMap<String, String>,
}

impl DocumentSet {
  pub fn new(root: impl Into<String>, document: Value) -> Self {
    let root = root.into();
    let mut documents = IndexMap::new();
    documents.insert(root.clone(), document);
    Self {
      root,
      documents,
      unavailable: BTreeMap::new(),
    }
  }

  pub fn insert(&mut self, name: impl Into<String>, document: Value) {
    self.documents.insert(name.into(), document);
  }

  pub fn mark_unavailable(&mut self, name: impl Into<String>, reason: impl Into<String>) {
    self.unavailable.insert(name.into(), reason.into());
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.documents.keys().map(String::as_str)
  }

  /// Documents that could not be loaded, with the load error of each.
  pub fn unavailable(&self) -> impl Iterator<Item = (&str, &str)> {
    self.unavailable.iter().map(|(name, reason)| (name.as_str(), reason.as_str()))
  }

  /// Documents referenced from loaded documents that are neither loaded nor known
  /// to be unavailable.
  pub fn missing_documents(&self) -> BTreeSet<String> {
    let mut missing = BTreeSet::new();
    for (name, document) in &self.documents {
      let base = Location::root(name.clone());
      let mut references = vec![];
      collect_references(document, &mut references);

      for reference in references {
        if let Some(target) = resolve_ref(reference, &base)
          && !self.documents.contains_key(&target.document)
          && !self.unavailable.contains_key(&target.document)
        {
          missing.insert(target.document);
        }
      }
    }
    missing
  }
}

impl DocumentSource for DocumentSet {
  fn root(&self) -> &str {
    &self.root
  }

  fn document(&self, name: &str) -> Option<&Value> {
    self.documents.get(name)
  }

  fn unavailable_reason(&self, name: &str) -> Option<&str> {
    self.unavailable.get(name).map(String::as_str)
  }
}

fn collect_references<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
  match value {
    Value::Object(map) => {
      for (key, child) in map {
        match (key.as_str(), child) {
          ("$ref", Value::String(reference)) => out.push(reference),
          ("mapping", Value::Object(mapping)) => {
            out.extend(mapping.values().filter_map(Value::as_str).filter(|target| target.contains('#')));
          }
          _ => collect_references(child, out),
        }
      }
    }
    Value::Array(items) => {
      for item in items {
        collect_references(item, out);
      }
    }
    _ => {}
  }
}

/// Loads `path` and every document it transitively references.
///
/// Referenced files that cannot be read or parsed are recorded as unavailable
/// together with the load error; resolving a reference into one of them later
/// fails with an unresolved reference that names the declaring location and
/// carries that error.
pub async fn load_documents(path: &Path) -> anyhow::Result<DocumentSet> {
  let root_name = path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .with_context(|| format!("{} does not name a file", path.display()))?;
  let base_dir = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);

  let root = SpecLoader::open(path).await?.parse()?;
  let mut documents = DocumentSet::new(root_name, root);

  loop {
    let missing = documents.missing_documents();
    if missing.is_empty() {
      break;
    }

    for name in missing {
      let loaded = match SpecLoader::open(&base_dir.join(&name)).await {
        Ok(loader) => loader.parse().with_context(|| format!("parsing {name}")),
        Err(err) => Err(err),
      };
      match loaded {
        Ok(document) => documents.insert(name, document),
        Err(err) => {
          let reason = format!("{err:#}");
          documents.mark_unavailable(name, reason);
        }
      }
    }
  }

  Ok(documents)
}
