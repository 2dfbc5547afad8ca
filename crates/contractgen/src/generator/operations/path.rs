//! Path template parsing (`/pets/{petId}/photo.{format}`).

use serde::Serialize;
use strum::Display;

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum PathParseError {
  #[strum(to_string = "unclosed '{{' at position {position} in segment '{segment}'")]
  UnclosedBrace { segment: String, position: usize },
  #[strum(to_string = "empty parameter '{{}}' in segment '{segment}'")]
  EmptyParameter { segment: String },
  #[strum(to_string = "unmatched '}}' at position {position} in segment '{segment}'")]
  UnmatchedClosingBrace { segment: String, position: usize },
  #[strum(to_string = "nested '{{' at position {position} in segment '{segment}'")]
  NestedBraces { segment: String, position: usize },
}

impl std::error::Error for PathParseError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum SegmentPart {
  Literal(String),
  Param(String),
}

/// One `/`-separated piece of a path template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PathSegment {
  Literal(String),
  Param(String),
  /// Literal text and variables sharing one segment, e.g. `{name}.{ext}`.
  Mixed(Vec<SegmentPart>),
}

impl PathSegment {
  pub fn parse(segment: &str) -> Result<Self, PathParseError> {
    let mut parts = Self::tokenize(segment)?;
    match parts.as_mut_slice() {
      [] => Ok(Self::Literal(String::new())),
      [SegmentPart::Literal(literal)] => Ok(Self::Literal(std::mem::take(literal))),
      [SegmentPart::Param(name)] => Ok(Self::Param(std::mem::take(name))),
      _ => Ok(Self::Mixed(parts)),
    }
  }

  pub fn params(&self) -> Vec<&str> {
    match self {
      Self::Literal(_) => vec![],
      Self::Param(name) => vec![name.as_str()],
      Self::Mixed(parts) => parts
        .iter()
        .filter_map(|part| match part {
          SegmentPart::Param(name) => Some(name.as_str()),
          SegmentPart::Literal(_) => None,
        })
        .collect(),
    }
  }

  fn tokenize(segment: &str) -> Result<Vec<SegmentPart>, PathParseError> {
    let mut parts = vec![];
    let mut rest = segment;
    let mut offset = 0;

    while let Some(open_pos) = rest.find('{') {
      if let Some(stray_close) = rest[..open_pos].find('}') {
        return Err(PathParseError::UnmatchedClosingBrace {
          segment: segment.to_string(),
          position: offset + stray_close,
        });
      }

      if open_pos > 0 {
        parts.push(SegmentPart::Literal(rest[..open_pos].to_string()));
      }

      let after_open = &rest[open_pos + 1..];
      let Some(close_pos) = after_open.find('}') else {
        return Err(PathParseError::UnclosedBrace {
          segment: segment.to_string(),
          position: offset + open_pos,
        });
      };

      if let Some(nested) = after_open[..close_pos].find('{') {
        return Err(PathParseError::NestedBraces {
          segment: segment.to_string(),
          position: offset + open_pos + 1 + nested,
        });
      }

      let name = &after_open[..close_pos];
      if name.is_empty() {
        return Err(PathParseError::EmptyParameter {
          segment: segment.to_string(),
        });
      }
      parts.push(SegmentPart::Param(name.to_string()));

      let consumed = open_pos + 1 + close_pos + 1;
      offset += consumed;
      rest = &rest[consumed..];
    }

    if let Some(stray_close) = rest.find('}') {
      return Err(PathParseError::UnmatchedClosingBrace {
        segment: segment.to_string(),
        position: offset + stray_close,
      });
    }
    if !rest.is_empty() {
      parts.push(SegmentPart::Literal(rest.to_string()));
    }

    Ok(parts)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathTemplate(Vec<PathSegment>);

impl PathTemplate {
  pub fn parse(path: &str) -> Result<Self, PathParseError> {
    path
      .split('/')
      .filter(|segment| !segment.is_empty())
      .map(PathSegment::parse)
      .collect::<Result<Vec<_>, _>>()
      .map(Self)
  }

  pub fn segments(&self) -> &[PathSegment] {
    &self.0
  }

  /// Template variables in the order they appear.
  pub fn params(&self) -> Vec<&str> {
    self.0.iter().flat_map(PathSegment::params).collect()
  }
}
