use std::{
  char::{ToLowercase, ToUppercase},
  collections::BTreeSet,
  iter::Peekable,
  sync::LazyLock,
};

use any_ascii::any_ascii;
use inflections::Inflect;
use regex::Regex;

static INVALID_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").unwrap());
static MULTI_UNDERSCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());

/// Upper bound on numeric suffixes tried by [`ensure_unique`].
pub const MAX_SUFFIX: usize = 10_000;

/// Transliterates to ASCII, replaces invalid characters with underscores, collapses
/// consecutive underscores, and trims leading and trailing underscores.
pub fn sanitize(input: &str) -> String {
  if input.is_empty() {
    return String::new();
  }

  let ascii = any_ascii(input);
  let replaced = INVALID_CHARS_RE.replace_all(&ascii, "_");
  let collapsed = MULTI_UNDERSCORE_RE.replace_all(&replaced, "_");

  collapsed.trim_matches('_').to_string()
}

/// Returns `base_name` if unused, otherwise `base_name` followed by the smallest
/// free numeral starting at 2, joined with `separator`.
///
/// Gives up with `None` once [`MAX_SUFFIX`] is reached.
pub fn ensure_unique(base_name: &str, separator: &str, used_names: &BTreeSet<String>) -> Option<String> {
  if !used_names.contains(base_name) {
    return Some(base_name.to_string());
  }
  (2..=MAX_SUFFIX)
    .map(|i| format!("{base_name}{separator}{i}"))
    .find(|candidate| !used_names.contains(candidate))
}

/// Converts a string into a member identifier (`snake_case`).
///
/// # Rules:
/// 1. A leading `-` is stripped and `negative_` is prepended to the result.
/// 2. Sanitizes the base string and converts to `snake_case`.
/// 3. A result starting with a digit is prefixed with `_`.
/// 4. An empty result becomes `_`.
pub fn to_field_name(name: &str) -> String {
  let has_leading_minus = name.starts_with('-');
  let name_without_minus = name.strip_prefix('-').unwrap_or(name);

  let mut ident = sanitize(name_without_minus).to_snake_case();

  if ident.is_empty() {
    return "_".to_string();
  }

  if has_leading_minus {
    ident = format!("negative_{ident}");
  }

  prefix_if_digit_start(&mut ident, '_');
  ident
}

/// Converts a string into a type identifier (`PascalCase`).
///
/// # Rules:
/// 1. A leading `-` is stripped and `Negative` is prepended to the result.
/// 2. Input with mixed case and no separators keeps its capitalization.
/// 3. Otherwise words are split on separators and case boundaries and capitalized.
/// 4. A result starting with a digit is prefixed with `T`.
/// 5. An empty result becomes `Unnamed`.
pub fn to_type_name(name: &str) -> String {
  let has_leading_minus = name.starts_with('-');
  let name_without_minus = name.strip_prefix('-').unwrap_or(name);

  let has_separators = name_without_minus.contains(['-', '_', '.', ' ', '/']);
  let has_upper = name_without_minus.chars().any(|c| c.is_ascii_uppercase());
  let has_lower = name_without_minus.chars().any(|c| c.is_ascii_lowercase());
  let appears_mixed_case = !has_separators && has_upper && has_lower;

  let ascii = any_ascii(name_without_minus);
  let mut ident: String = if appears_mixed_case {
    let cleaned: String = ascii.chars().filter(char::is_ascii_alphanumeric).collect();
    let mut chars = cleaned.chars();
    match chars.next() {
      None => String::new(),
      Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
  } else {
    ascii
      .chars()
      .capitalize_words_with_boundaries()
      .filter(char::is_ascii_alphanumeric)
      .collect()
  };

  if ident.is_empty() {
    return "Unnamed".to_string();
  }

  if has_leading_minus {
    ident = format!("Negative{ident}");
  }

  prefix_if_digit_start(&mut ident, 'T');
  ident
}

fn prefix_if_digit_start(ident: &mut String, prefix: char) {
  if ident.starts_with(|c: char| c.is_ascii_digit()) {
    ident.insert(0, prefix);
  }
}

/// An extension trait for char iterators to add word capitalization.
pub trait CapitalizeWordsExt: Iterator<Item = char> {
  fn capitalize_words_with_boundaries(self) -> CapitalizeWordsWithBoundaries<Self>
  where
    Self: Sized;
}

impl<I> CapitalizeWordsExt for I
where
  I: Iterator<Item = char>,
{
  fn capitalize_words_with_boundaries(self) -> CapitalizeWordsWithBoundaries<Self>
  where
    Self: Sized,
  {
    CapitalizeWordsWithBoundaries {
      iter: self.peekable(),
      capitalize_next: true,
      prev_was_lower: false,
      pending_upper: None,
      pending_lower: None,
    }
  }
}

/// Upper-cases the first letter of every word and lower-cases the rest, where a
/// word starts after a non-alphanumeric character or at a lower-to-upper boundary.
pub struct CapitalizeWordsWithBoundaries<I>
where
  I: Iterator<Item = char>,
{
  iter: Peekable<I>,
  capitalize_next: bool,
  prev_was_lower: bool,
  pending_upper: Option<ToUppercase>,
  pending_lower: Option<ToLowercase>,
}

impl<I> Iterator for CapitalizeWordsWithBoundaries<I>
where
  I: Iterator<Item = char>,
{
  type Item = char;

  fn next(&mut self) -> Option<Self::Item> {
    if let Some(upper) = self.pending_upper.as_mut() {
      if let Some(c) = upper.next() {
        return Some(c);
      }
      self.pending_upper = None;
    }

    if let Some(lower) = self.pending_lower.as_mut() {
      if let Some(c) = lower.next() {
        return Some(c);
      }
      self.pending_lower = None;
    }

    let c = self.iter.next()?;

    if !c.is_ascii_alphanumeric() {
      self.capitalize_next = self.iter.peek().is_some_and(char::is_ascii_alphanumeric);
      self.prev_was_lower = false;
      return Some(c);
    }

    let is_lower = c.is_ascii_lowercase();
    let is_upper = c.is_ascii_uppercase();

    let should_capitalize = self.capitalize_next
      || (self.prev_was_lower && is_upper)
      || (is_upper && self.iter.peek().is_some_and(char::is_ascii_lowercase));

    self.prev_was_lower = is_lower;
    self.capitalize_next = false;

    if should_capitalize {
      let mut upper = c.to_uppercase();
      let first = upper.next();
      self.pending_upper = Some(upper);
      first
    } else {
      let mut lower = c.to_lowercase();
      let first = lower.next();
      self.pending_lower = Some(lower);
      first
    }
  }
}
